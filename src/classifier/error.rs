// ==========================================
// 实验跟踪流水线 - 分类器错误类型
// ==========================================

use thiserror::Error;

/// 分类器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("超参数无效 (model={model}): {message}")]
    InvalidHyperparameters { model: String, message: String },

    #[error("模型尚未训练: {model}")]
    NotFitted { model: String },

    #[error("特征维度不匹配: expected={expected}, actual={actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("训练集为空")]
    EmptyTrainingSet,

    #[error("输入数据无效: {0}")]
    InvalidInput(String),

    #[error("训练已取消")]
    Cancelled,
}

impl ClassifierError {
    pub fn invalid_param(model: &str, message: impl Into<String>) -> Self {
        ClassifierError::InvalidHyperparameters {
            model: model.to_string(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type ClassifierResult<T> = Result<T, ClassifierError>;
