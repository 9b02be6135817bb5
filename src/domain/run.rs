// ==========================================
// 实验跟踪流水线 - 评分运行记录
// ==========================================
// 用途: 每次 run_partition 成功后追加一条,便于追踪实验历史
// 对齐: scoring_runs 表
// ==========================================

use crate::domain::types::Partition;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRun {
    pub run_id: String,               // 运行ID (UUID)
    pub partition: Partition,         // 评分分区
    pub model_name: String,           // 使用的模型
    pub artifact_version: Option<u64>, // 使用/产出的拟合产物版本 (空批次训练时为 None)
    pub sample_count: usize,          // 参与评分的行数
    pub score: f64,                   // 准确率 [0,1]
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
}
