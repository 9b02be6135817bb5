// ==========================================
// 实验跟踪流水线 - 分区评分流水线 (Service 层)
// ==========================================
// 状态: Idle → Selecting → Transforming → (Fitting →) Predicting
//       → Scoring → Persisting → Done
// 红线: 只有 training 分区拟合;其它分区复用已安装的产物快照
// 红线: 任一状态失败即终止本次调用,不做部分重试
// 红线: 新产物在预测与运行记录落库之后才安装
// 依赖注入: 仓储与模型槽位在构造时传入,无全局状态
// ==========================================

use crate::classifier::{CancelToken, Estimator};
use crate::domain::dataset::Prediction;
use crate::domain::run::ScoringRun;
use crate::domain::types::{Partition, Table};
use crate::engine::artifact::{FittedArtifact, ModelSlot};
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::metrics::accuracy;
use crate::engine::preprocess::{build_feature_matrix, StandardScaler, KEY_COLUMN};
use crate::perf::PerfGuard;
use crate::repository::{PredictionRepository, QueryRepository, ScoringRunRepository};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 流水线状态 (仅用于日志)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Selecting,
    Transforming,
    Fitting,
    Predicting,
    Scoring,
    Persisting,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ==========================================
// ScoringPipeline
// ==========================================
pub struct ScoringPipeline {
    query_repo: Arc<QueryRepository>,
    prediction_repo: Arc<PredictionRepository>,
    run_repo: Arc<ScoringRunRepository>,
    slot: Arc<ModelSlot>,
}

impl ScoringPipeline {
    pub fn new(
        query_repo: Arc<QueryRepository>,
        prediction_repo: Arc<PredictionRepository>,
        run_repo: Arc<ScoringRunRepository>,
        slot: Arc<ModelSlot>,
    ) -> Self {
        Self {
            query_repo,
            prediction_repo,
            run_repo,
            slot,
        }
    }

    pub fn slot(&self) -> &Arc<ModelSlot> {
        &self.slot
    }

    /// 按分区名运行一次评分,返回准确率
    pub fn run_partition(&self, partition_name: &str) -> PipelineResult<f64> {
        let partition = Partition::parse(partition_name)
            .ok_or_else(|| PipelineError::UnknownPartition(partition_name.to_string()))?;
        let run = self.run_partition_with_cancel(partition, &CancelToken::new())?;
        Ok(run.score)
    }

    /// 运行一次评分 (可取消),返回运行记录
    pub fn run_partition_with_cancel(
        &self,
        partition: Partition,
        cancel: &CancelToken,
    ) -> PipelineResult<ScoringRun> {
        let _perf = PerfGuard::new("pipeline.run_partition");
        let started_at = Utc::now().naive_utc();
        let run_id = Uuid::new_v4().to_string();
        tracing::info!(run_id = %run_id, partition = %partition, "评分运行开始");
        trace_stage(&run_id, PipelineStage::Idle);

        // 非训练分区: 先确认产物存在,再访问存储
        let snapshot = if partition.fits_model() {
            None
        } else {
            match self.slot.artifact()? {
                Some(artifact) => Some(artifact),
                None => {
                    return Err(PipelineError::NotFitted {
                        partition: partition.as_str().to_string(),
                    })
                }
            }
        };
        let (prototype, generation) = self.slot.prototype()?;
        let prototype_kind = prototype.kind();

        // ===== Selecting =====
        trace_stage(&run_id, PipelineStage::Selecting);
        cancel.check()?;
        let records = self.query_repo.select_joined_by_condition(
            Table::Samples,
            Table::Targets,
            KEY_COLUMN,
            KEY_COLUMN,
            partition.tag(),
        )?;

        // ===== Transforming =====
        trace_stage(&run_id, PipelineStage::Transforming);
        cancel.check()?;
        let matrix = build_feature_matrix(&records)?;

        if matrix.is_empty() {
            tracing::info!(run_id = %run_id, partition = %partition, "分区无数据,得分 0");
            let version = snapshot.as_ref().map(|a| a.version);
            let model_name = snapshot.as_ref().map_or(prototype_kind, |a| a.model_name);
            return self.finish(run_id, partition, model_name.as_str(), version, 0, 0.0, started_at);
        }

        // 训练分区的新产物在落库成功后才安装
        let (predictions, model_name, artifact_version, pending) = match snapshot {
            Some(artifact) => {
                let x = artifact.scaler.transform(&matrix.features)?;

                // ===== Predicting =====
                trace_stage(&run_id, PipelineStage::Predicting);
                cancel.check()?;
                let predicted = artifact.classifier.predict(&x)?;
                (predicted, artifact.model_name, Some(artifact.version), None)
            }
            None => {
                let scaler = StandardScaler::fit(&matrix.features)?;
                let x = scaler.transform(&matrix.features)?;

                // ===== Fitting =====
                trace_stage(&run_id, PipelineStage::Fitting);
                let (fit_x, fit_y) = matrix.labelled(&x);
                if fit_y.is_empty() {
                    return Err(PipelineError::EmptyTrainingSet {
                        partition: partition.as_str().to_string(),
                    });
                }
                let mut classifier = prototype;
                classifier.fit(&fit_x, &fit_y, cancel)?;

                // ===== Predicting =====
                trace_stage(&run_id, PipelineStage::Predicting);
                cancel.check()?;
                let predicted = classifier.predict(&x)?;

                match self.slot.reserve_version(generation)? {
                    Some(version) => {
                        let fitted = FittedArtifact::new(
                            version,
                            scaler,
                            classifier,
                            matrix.feature_names.clone(),
                        );
                        (predicted, prototype_kind, Some(version), Some(fitted))
                    }
                    None => {
                        tracing::warn!(
                            run_id = %run_id,
                            generation,
                            "训练期间激活模型已被替换,本次产物未安装"
                        );
                        (predicted, prototype_kind, None, None)
                    }
                }
            }
        };

        // ===== Scoring =====
        trace_stage(&run_id, PipelineStage::Scoring);
        let score = accuracy(&matrix.labels, &predictions);

        // ===== Persisting =====
        trace_stage(&run_id, PipelineStage::Persisting);
        cancel.check()?;
        let rows: Vec<Prediction> = matrix
            .sample_indexes
            .iter()
            .zip(predictions.iter())
            .map(|(index, class)| Prediction::for_sample(*index, Some(*class)))
            .collect();
        self.prediction_repo.upsert_predictions(&rows)?;

        let run = self.finish(
            run_id,
            partition,
            model_name.as_str(),
            artifact_version,
            matrix.len(),
            score,
            started_at,
        )?;

        if let Some(fitted) = pending {
            if self.slot.install(generation, fitted)?.is_none() {
                tracing::warn!(
                    run_id = %run.run_id,
                    generation,
                    "产物已过期 (模型被替换或已有更新版本),未安装"
                );
            }
        }
        Ok(run)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        run_id: String,
        partition: Partition,
        model_name: &str,
        artifact_version: Option<u64>,
        sample_count: usize,
        score: f64,
        started_at: chrono::NaiveDateTime,
    ) -> PipelineResult<ScoringRun> {
        let run = ScoringRun {
            run_id,
            partition,
            model_name: model_name.to_string(),
            artifact_version,
            sample_count,
            score,
            started_at,
            finished_at: Utc::now().naive_utc(),
        };
        self.run_repo.insert(&run)?;

        trace_stage(&run.run_id, PipelineStage::Done);
        tracing::info!(
            run_id = %run.run_id,
            partition = %partition,
            model = %run.model_name,
            samples = sample_count,
            score,
            "评分运行完成"
        );
        Ok(run)
    }
}

fn trace_stage(run_id: &str, stage: PipelineStage) {
    tracing::debug!(run_id = %run_id, stage = %stage, "pipeline stage");
}
