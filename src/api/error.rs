// ==========================================
// 实验跟踪流水线 - API 层错误类型
// ==========================================
// 职责: 把 Pipeline / Repository 错误归类为对外错误,并给出错误码与 HTTP 状态
// 分类: StoreUnavailable / ModelNotFound / InvalidHyperparameters /
//       MissingRequiredField / NotFitted / InvalidInput / Timeout / Unexpected
// ==========================================

use crate::classifier::{ClassifierError, ModelKind};
use crate::engine::error::PipelineError;
use crate::repository::error::RepositoryError;
use axum::http::StatusCode;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 存储错误
    // ==========================================
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    // ==========================================
    // 请求错误
    // ==========================================
    #[error("模型不存在: {0}")]
    ModelNotFound(String),

    #[error("{0}")]
    InvalidHyperparameters(String),

    #[error("缺少必需字段: {0}")]
    MissingRequiredField(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 运行错误
    // ==========================================
    #[error("{0}")]
    NotFitted(String),

    #[error("评分运行超时 ({0}s)")]
    Timeout(u64),

    #[error("内部错误: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// 错误码 (对外协议)
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            ApiError::InvalidHyperparameters(_) => "INVALID_HYPERPARAMETERS",
            ApiError::MissingRequiredField(_) => "MISSING_REQUIRED_FIELD",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFitted(_) => "NOT_FITTED",
            ApiError::Timeout(_) => "TIMEOUT",
            ApiError::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// HTTP 状态
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ModelNotFound(_)
            | ApiError::InvalidHyperparameters(_)
            | ApiError::MissingRequiredField(_)
            | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFitted(_) => StatusCode::CONFLICT,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 响应中的 error / message 两个字段
    pub fn summary(&self) -> (String, String) {
        match self {
            ApiError::ModelNotFound(_) => (
                "Model not Found".to_string(),
                format!("Please Specify {}", allowed_models()),
            ),
            ApiError::MissingRequiredField(field) => (
                format!("Missing parameter: {}", field),
                format!("The parameter '{}' is required but was not provided", field),
            ),
            ApiError::InvalidHyperparameters(_) | ApiError::InvalidInput(_) => {
                (self.to_string(), "Invalid value provided".to_string())
            }
            ApiError::Unexpected(_) => (self.to_string(), "An unexpected error occurred".to_string()),
            ApiError::StoreUnavailable(_) | ApiError::NotFitted(_) | ApiError::Timeout(_) => (
                self.to_string(),
                "An error occurred while processing the request.".to_string(),
            ),
        }
    }
}

/// "'RandomForest', 'SVC' or 'LogisticRegression'"
fn allowed_models() -> String {
    let quoted: Vec<String> = ModelKind::ALL.iter().map(|k| format!("'{}'", k.as_str())).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if err.is_store_unavailable() {
            return ApiError::StoreUnavailable(err.to_string());
        }
        match err {
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

// ==========================================
// 从 PipelineError 转换
// ==========================================
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UnknownPartition(_) | PipelineError::EmptyTrainingSet { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
            PipelineError::NotFitted { .. } => ApiError::NotFitted(err.to_string()),
            PipelineError::Classifier(ClassifierError::InvalidHyperparameters { .. }) => {
                ApiError::InvalidHyperparameters(err.to_string())
            }
            PipelineError::Repository(e) => e.into(),
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
