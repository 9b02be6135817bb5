// ==========================================
// 实验跟踪流水线 - 数据集领域模型
// ==========================================
// 对齐: datasets / samples / targets / predictions 四张表
// 约束: sample_index 是跨表稳定关联键,与自增主键无关
// ==========================================

use crate::domain::types::{Partition, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

// ==========================================
// Dataset - 数据集 (逻辑分区)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_id: i64, // 数据集ID (同时作为分区标签)
    pub name: String,    // 数据集名称 (唯一)
}

impl Dataset {
    /// 按分区约定构造数据集
    pub fn for_partition(partition: Partition) -> Self {
        Self {
            dataset_id: partition.tag(),
            name: partition.as_str().to_string(),
        }
    }
}

// ==========================================
// Sample - 样本
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: Option<i64>,                  // 自增主键 (写入时为 None)
    pub dataset_id: i64,                         // 所属数据集
    pub sample_index: i64,                       // 稳定关联键
    pub features: [Option<f64>; FEATURE_COUNT],  // feature_1..feature_13
}

impl Sample {
    /// 创建样本,未提供的特征列为 NULL
    pub fn new(dataset_id: i64, sample_index: i64, values: &[Option<f64>]) -> Self {
        let mut features = [None; FEATURE_COUNT];
        for (slot, v) in features.iter_mut().zip(values.iter()) {
            *slot = *v;
        }
        Self {
            sample_id: None,
            dataset_id,
            sample_index,
            features,
        }
    }
}

// ==========================================
// Target - 真实标签
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub target_id: Option<i64>,
    pub sample_index: i64,
    pub target_index: i64,
    pub class: Option<i64>,
}

impl Target {
    /// target_index 与 sample_index 保持一致
    pub fn for_sample(sample_index: i64, class: Option<i64>) -> Self {
        Self {
            target_id: None,
            sample_index,
            target_index: sample_index,
            class,
        }
    }
}

// ==========================================
// Prediction - 模型输出
// ==========================================
// 写入语义: upsert (同一 sample_index 第二次写入只更新 class)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_id: Option<i64>,
    pub sample_index: i64,
    pub prediction_index: i64,
    pub class: Option<i64>,
}

impl Prediction {
    /// prediction_index 镜像 sample_index,不是独立序列
    pub fn for_sample(sample_index: i64, class: Option<i64>) -> Self {
        Self {
            prediction_id: None,
            sample_index,
            prediction_index: sample_index,
            class,
        }
    }
}
