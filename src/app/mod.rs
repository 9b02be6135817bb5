// ==========================================
// 实验跟踪流水线 - 应用层
// ==========================================
// 职责: HTTP 集成,把请求路由到 API 层
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::build_router;
pub use state::AppState;
