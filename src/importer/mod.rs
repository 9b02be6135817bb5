// ==========================================
// 实验跟踪流水线 - 导入层
// ==========================================
// 职责: 离线批量加载分区数据 (CSV → datasets / samples / targets)
// ==========================================

pub mod dataset_importer;
pub mod error;

// 重导出
pub use dataset_importer::{DatasetImporter, ImportSummary};
pub use error::{ImportError, ImportResult};
