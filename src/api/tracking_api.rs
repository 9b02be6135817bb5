// ==========================================
// 实验跟踪流水线 - 跟踪查询 API
// ==========================================
// 职责: 只读查询评分运行记录与预测结果
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::dataset::Prediction;
use crate::domain::run::ScoringRun;
use crate::repository::{PredictionRepository, ScoringRunRepository};
use std::sync::Arc;

/// 默认返回条数
pub const DEFAULT_RUN_LIMIT: usize = 20;

/// 单次查询上限
pub const MAX_RUN_LIMIT: usize = 500;

pub struct TrackingApi {
    run_repo: Arc<ScoringRunRepository>,
    prediction_repo: Arc<PredictionRepository>,
}

impl TrackingApi {
    pub fn new(
        run_repo: Arc<ScoringRunRepository>,
        prediction_repo: Arc<PredictionRepository>,
    ) -> Self {
        Self {
            run_repo,
            prediction_repo,
        }
    }

    /// 最近的评分运行 (新的在前)
    pub fn list_runs(&self, limit: Option<usize>) -> ApiResult<Vec<ScoringRun>> {
        let limit = limit.unwrap_or(DEFAULT_RUN_LIMIT);
        if limit == 0 || limit > MAX_RUN_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit={} (范围 1..={})",
                limit, MAX_RUN_LIMIT
            )));
        }
        Ok(self.run_repo.find_recent(limit)?)
    }

    /// 全部预测结果 (按 sample_index 升序)
    pub fn list_predictions(&self) -> ApiResult<Vec<Prediction>> {
        Ok(self.prediction_repo.find_all()?)
    }
}
