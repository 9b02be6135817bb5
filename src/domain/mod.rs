// ==========================================
// 实验跟踪流水线 - 领域模型层
// ==========================================
// 职责: 定义实体、分区约定、表标识符枚举、通用行记录
// 红线: 不含数据访问逻辑,不含流水线逻辑
// ==========================================

pub mod dataset;
pub mod record;
pub mod run;
pub mod types;

// 重导出核心类型
pub use dataset::{Dataset, Prediction, Sample, Target};
pub use record::{ColumnInfo, FieldValue, RecordSet};
pub use run::ScoringRun;
pub use types::{Partition, Table, FEATURE_COLUMNS, FEATURE_COUNT, PARTITION_COLUMN};
