use crate::api::error::{ApiError, ApiResult};
use crate::app::state::AppState;
use crate::domain::dataset::Prediction;
use crate::domain::run::ScoringRun;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::common::{ok, run_blocking};

// ==========================================
// 跟踪查询路由
// ==========================================

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    limit: Option<String>,
}

/// 最近评分运行
pub(super) async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> ApiResult<(StatusCode, Json<Vec<ScoringRun>>)> {
    let limit = match query.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| ApiError::InvalidInput(format!("limit={} 不是有效的正整数", raw)))?,
        ),
    };

    let api = state.tracking_api.clone();
    let runs = run_blocking(move || api.list_runs(limit)).await?;
    Ok(ok(runs))
}

/// 全部预测结果
pub(super) async fn list_predictions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<Vec<Prediction>>)> {
    let api = state.tracking_api.clone();
    let predictions = run_blocking(move || api.list_predictions()).await?;
    Ok(ok(predictions))
}
