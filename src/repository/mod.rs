// ==========================================
// 实验跟踪流水线 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值使用参数化绑定;标识符只来自 Table 枚举
// ==========================================

pub mod dataset_repo;
pub mod error;
pub mod prediction_repo;
pub mod query_repo;
pub mod run_repo;

// 重导出核心仓储
pub use dataset_repo::DatasetRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use prediction_repo::PredictionRepository;
pub use query_repo::QueryRepository;
pub use run_repo::ScoringRunRepository;
