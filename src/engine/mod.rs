// ==========================================
// 实验跟踪流水线 - 引擎层 (Service 层)
// ==========================================
// 职责: 特征矩阵构建、标准化、评分、拟合产物管理、分区评分流水线
// 红线: 不直接拼接 SQL,数据访问全部经过 Repository
// ==========================================

pub mod artifact;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;

// 重导出核心类型
pub use artifact::{FittedArtifact, ModelSlot};
pub use error::{PipelineError, PipelineResult};
pub use metrics::accuracy;
pub use pipeline::{PipelineStage, ScoringPipeline};
pub use preprocess::{build_feature_matrix, FeatureMatrix, StandardScaler};
