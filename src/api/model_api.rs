// ==========================================
// 实验跟踪流水线 - 模型 API
// ==========================================
// 职责: 查询/切换激活模型,触发分区评分
// 红线: 不含评分逻辑,只做参数校验与结果封装
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::classifier::{CancelToken, Hyperparameters, ModelRegistry};
use crate::domain::run::ScoringRun;
use crate::domain::types::Partition;
use crate::engine::ScoringPipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 激活模型信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub message: String,
}

/// 通用消息响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 可选模型列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<String>,
    pub active: String,
}

// ==========================================
// ModelApi
// ==========================================
pub struct ModelApi {
    registry: Arc<ModelRegistry>,
    pipeline: Arc<ScoringPipeline>,
}

impl ModelApi {
    pub fn new(registry: Arc<ModelRegistry>, pipeline: Arc<ScoringPipeline>) -> Self {
        Self { registry, pipeline }
    }

    /// 当前激活模型
    pub fn get_model(&self) -> ApiResult<ModelInfo> {
        let kind = self.registry.active_model()?;
        Ok(ModelInfo {
            name: kind.as_str().to_string(),
            message: "ML model".to_string(),
        })
    }

    /// 对指定分区评分
    ///
    /// # 参数
    /// - `dataset`: training / testing / production
    /// - `cancel`: 超时后由调用方触发
    pub fn score_dataset(&self, dataset: &str, cancel: &CancelToken) -> ApiResult<ScoringRun> {
        let partition = Partition::parse(dataset).ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "dataset={} (可选: training / testing / production)",
                dataset
            ))
        })?;
        let run = self.pipeline.run_partition_with_cancel(partition, cancel)?;
        Ok(run)
    }

    /// 切换激活模型
    ///
    /// # 返回
    /// - `Err(ApiError::ModelNotFound)`: 模型名不在注册表中,激活模型不变
    /// - `Err(ApiError::InvalidHyperparameters)`: 超参数无效,激活模型不变
    pub fn set_model(
        &self,
        model_name: &str,
        hyperparameters: &Hyperparameters,
    ) -> ApiResult<MessageResponse> {
        match self.registry.load_model(model_name, hyperparameters)? {
            Some(_) => Ok(MessageResponse {
                message: "Model successfully uploaded".to_string(),
            }),
            None => Err(ApiError::ModelNotFound(model_name.to_string())),
        }
    }

    pub fn list_models(&self) -> ApiResult<ModelList> {
        Ok(ModelList {
            models: self
                .registry
                .list_models()
                .into_iter()
                .map(str::to_string)
                .collect(),
            active: self.registry.active_model()?.as_str().to_string(),
        })
    }
}

/// "Score on <dataset> set: <score*100>%"
pub fn score_message(run: &ScoringRun) -> String {
    format!(
        "Score on {} set: {}%",
        run.partition.as_str(),
        format_percent(run.score * 100.0)
    )
}

/// 整数百分比保留一位小数 (100.0),其余按最短表示输出
fn format_percent(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
