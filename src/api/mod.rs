// ==========================================
// 实验跟踪流水线 - API 层
// ==========================================
// 职责: 提供业务接口,供 HTTP 路由调用
// ==========================================

pub mod error;
pub mod model_api;
pub mod tracking_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use model_api::{score_message, MessageResponse, ModelApi, ModelInfo, ModelList};
pub use tracking_api::TrackingApi;
