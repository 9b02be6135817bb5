// ==========================================
// 实验跟踪流水线 - 流水线错误类型
// ==========================================
// 分层: RepositoryError / ClassifierError → PipelineError → ApiError
// ==========================================

use crate::classifier::ClassifierError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("未知分区: {0} (可选: training / testing / production)")]
    UnknownPartition(String),

    #[error("分区 {partition} 评分前必须先完成 training 拟合")]
    NotFitted { partition: String },

    #[error("分区 {partition} 没有带标签的样本,无法训练")]
    EmptyTrainingSet { partition: String },

    #[error("记录无效 (row={row}, column={column}): {message}")]
    InvalidRecord {
        row: usize,
        column: String,
        message: String,
    },

    #[error("模型状态锁获取失败: {0}")]
    StateLock(String),

    #[error("评分运行已取消")]
    Cancelled,

    #[error(transparent)]
    Classifier(ClassifierError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PipelineError {
    /// 是否属于存储不可用
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, PipelineError::Repository(e) if e.is_store_unavailable())
    }
}

impl From<ClassifierError> for PipelineError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Classifier(other),
        }
    }
}

/// Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;
