// ==========================================
// 实验跟踪流水线 - HTTP 路由 (按域拆分)
// ==========================================
// 职责: 路由定义,连接 HTTP 请求与后端 API
// 挂载: <base_url><service_url>,前缀为空时直接挂在根路径
// ==========================================

mod common;
mod model;
mod tracking;

use crate::app::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub use common::ErrorResponse;

/// 构建路由
///
/// | 方法/路径 | 处理函数 |
/// |---|---|
/// | `GET <prefix>` | 当前激活模型 |
/// | `POST <prefix>` | 对分区评分 |
/// | `POST <prefix>/set_model` | 切换模型 |
/// | `GET <prefix>/models` | 可选模型 |
/// | `GET <prefix>/runs?limit=N` | 最近评分运行 |
/// | `GET <prefix>/predictions` | 预测结果 |
pub fn build_router(state: Arc<AppState>, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/", get(model::get_model).post(model::score_dataset))
        .route("/set_model", post(model::set_model))
        .route("/models", get(model::list_models))
        .route("/runs", get(tracking::list_runs))
        .route("/predictions", get(tracking::list_predictions))
        .with_state(state);

    if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    }
}
