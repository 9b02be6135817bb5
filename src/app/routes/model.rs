use crate::api::error::{ApiError, ApiResult};
use crate::api::{score_message, MessageResponse, ModelInfo, ModelList};
use crate::app::state::AppState;
use crate::classifier::CancelToken;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use super::common::{ok, optional_hyperparameters, parse_object, required_str, run_blocking};

// ==========================================
// 模型相关路由
// ==========================================

/// 当前激活模型
pub(super) async fn get_model(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<ModelInfo>)> {
    let api = state.model_api.clone();
    let info = run_blocking(move || api.get_model()).await?;
    Ok(ok(info))
}

/// 对分区评分
///
/// 超时后触发取消令牌,后台运行在下一个检查点退出且不写入结果
pub(super) async fn score_dataset(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let body = parse_object(&body)?;
    let dataset = required_str(&body, "dataset")?;

    let api = state.model_api.clone();
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || api.score_dataset(&dataset, &token));

    let run = match tokio::time::timeout(state.request_timeout, handle).await {
        Ok(joined) => joined.map_err(|e| ApiError::Unexpected(format!("后台任务异常: {}", e)))??,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(timeout_secs = state.request_timeout.as_secs(), "评分运行超时,已发出取消");
            return Err(ApiError::Timeout(state.request_timeout.as_secs()));
        }
    };

    tracing::info!(
        run_id = %run.run_id,
        partition = %run.partition,
        score = run.score,
        "评分完成"
    );
    Ok(ok(MessageResponse {
        message: score_message(&run),
    }))
}

/// 切换激活模型
pub(super) async fn set_model(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let body = parse_object(&body)?;
    let model_name = required_str(&body, "model_name")?;
    let hyperparameters = optional_hyperparameters(&body)?;

    let api = state.model_api.clone();
    let response = run_blocking(move || api.set_model(&model_name, &hyperparameters)).await?;
    Ok(ok(response))
}

/// 可选模型
pub(super) async fn list_models(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<ModelList>)> {
    let api = state.model_api.clone();
    let models = run_blocking(move || api.list_models()).await?;
    Ok(ok(models))
}
