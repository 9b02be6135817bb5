use crate::api::error::{ApiError, ApiResult};
use crate::classifier::{Hyperparameters, ModelKind};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// 公共工具: 错误响应、请求体解析、阻塞任务
// ==========================================

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误摘要
    pub error: String,

    /// 错误消息
    pub message: String,

    /// 详细信息 (可选)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "请求失败");
        } else {
            tracing::warn!(code = self.code(), error = %self, "请求被拒绝");
        }

        let (error, message) = self.summary();
        let details = match &self {
            ApiError::ModelNotFound(name) => Some(serde_json::json!({
                "requested": name,
                "models": ModelKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            })),
            _ => None,
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            error,
            message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// 解析 JSON 请求体 (必须是对象)
pub(super) fn parse_object(body: &Bytes) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::InvalidInput("请求体必须是 JSON 对象".to_string())),
        Err(e) => Err(ApiError::InvalidInput(format!("JSON 解析失败: {}", e))),
    }
}

/// 必需的字符串字段 (缺失或 null 视为未提供)
pub(super) fn required_str(body: &Map<String, Value>, field: &str) -> ApiResult<String> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ApiError::MissingRequiredField(field.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ApiError::InvalidInput(format!(
            "{} 必须是字符串,实际为 {}",
            field, other
        ))),
    }
}

/// 可选的超参数对象 (缺失或 null 视为 {})
pub(super) fn optional_hyperparameters(body: &Map<String, Value>) -> ApiResult<Hyperparameters> {
    match body.get("hyperparameters") {
        None | Some(Value::Null) => Ok(Hyperparameters::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(ApiError::InvalidInput(format!(
            "hyperparameters 必须是 JSON 对象,实际为 {}",
            other
        ))),
    }
}

/// 在阻塞线程池执行 (存储调用会阻塞当前线程)
pub(super) async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Unexpected(format!("后台任务异常: {}", e)))?
}

/// 成功响应
pub(super) fn ok<T: Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(value))
}
