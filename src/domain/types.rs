// ==========================================
// 实验跟踪流水线 - 领域类型定义
// ==========================================
// 分区约定: 1=training, 2=testing, 3=production
// 红线: 表名/列名只能来自本文件的封闭枚举,不得取自请求输入
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 分区过滤所用的列
pub const PARTITION_COLUMN: &str = "dataset_id";

/// 样本特征列 (固定 13 列)
pub const FEATURE_COLUMNS: [&str; 13] = [
    "feature_1",
    "feature_2",
    "feature_3",
    "feature_4",
    "feature_5",
    "feature_6",
    "feature_7",
    "feature_8",
    "feature_9",
    "feature_10",
    "feature_11",
    "feature_12",
    "feature_13",
];

/// 特征数量
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

// ==========================================
// 分区 (Partition)
// ==========================================
// 整数标签与分区名的映射,用于过滤联表结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Training,   // 训练集 (tag=1)
    Testing,    // 测试集 (tag=2)
    Production, // 生产集 (tag=3)
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Training, Partition::Testing, Partition::Production];

    /// 分区整数标签
    pub fn tag(&self) -> i64 {
        match self {
            Partition::Training => 1,
            Partition::Testing => 2,
            Partition::Production => 3,
        }
    }

    /// 从整数标签解析
    pub fn from_tag(tag: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    /// 分区名 (对外协议使用)
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Training => "training",
            Partition::Testing => "testing",
            Partition::Production => "production",
        }
    }

    /// 从分区名解析 (大小写敏感,与请求协议一致)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// 该分区是否需要拟合预处理与模型
    pub fn fits_model(&self) -> bool {
        matches!(self, Partition::Training)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 表 (Table)
// ==========================================
// 封闭的表名集合,语句拼接只允许使用这里的标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Datasets,
    Samples,
    Targets,
    Predictions,
    ScoringRuns,
}

const DATASETS_COLUMNS: &[&str] = &["dataset_id", "name"];

const SAMPLES_COLUMNS: &[&str] = &[
    "sample_id",
    "dataset_id",
    "sample_index",
    "feature_1",
    "feature_2",
    "feature_3",
    "feature_4",
    "feature_5",
    "feature_6",
    "feature_7",
    "feature_8",
    "feature_9",
    "feature_10",
    "feature_11",
    "feature_12",
    "feature_13",
];

const TARGETS_COLUMNS: &[&str] = &["target_id", "sample_index", "target_index", "class"];

const PREDICTIONS_COLUMNS: &[&str] = &["prediction_id", "sample_index", "prediction_index", "class"];

const SCORING_RUNS_COLUMNS: &[&str] = &[
    "run_id",
    "partition_name",
    "model_name",
    "artifact_version",
    "sample_count",
    "score",
    "started_at",
    "finished_at",
];

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Datasets,
        Table::Samples,
        Table::Targets,
        Table::Predictions,
        Table::ScoringRuns,
    ];

    /// 数据库中的表名
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Datasets => "datasets",
            Table::Samples => "samples",
            Table::Targets => "targets",
            Table::Predictions => "predictions",
            Table::ScoringRuns => "scoring_runs",
        }
    }

    /// 从表名解析 (仅用于管理工具,不接受未知表名)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// 表的列定义顺序 (与 DDL 一致)
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Datasets => DATASETS_COLUMNS,
            Table::Samples => SAMPLES_COLUMNS,
            Table::Targets => TARGETS_COLUMNS,
            Table::Predictions => PREDICTIONS_COLUMNS,
            Table::ScoringRuns => SCORING_RUNS_COLUMNS,
        }
    }

    /// 查找列名,返回静态标识符
    pub fn column(&self, name: &str) -> Option<&'static str> {
        self.columns().iter().copied().find(|c| *c == name)
    }

    /// 是否包含分区列
    pub fn has_partition_column(&self) -> bool {
        self.column(PARTITION_COLUMN).is_some()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_tags() {
        assert_eq!(Partition::Training.tag(), 1);
        assert_eq!(Partition::Testing.tag(), 2);
        assert_eq!(Partition::Production.tag(), 3);
        assert_eq!(Partition::from_tag(2), Some(Partition::Testing));
        assert_eq!(Partition::from_tag(4), None);
    }

    #[test]
    fn test_partition_parse() {
        assert_eq!(Partition::parse("training"), Some(Partition::Training));
        assert_eq!(Partition::parse("production"), Some(Partition::Production));
        assert_eq!(Partition::parse("Training"), None);
        assert_eq!(Partition::parse("validation"), None);
        assert!(Partition::Training.fits_model());
        assert!(!Partition::Testing.fits_model());
    }

    #[test]
    fn test_table_columns() {
        assert_eq!(Table::Samples.columns().len(), 3 + FEATURE_COUNT);
        assert!(Table::Samples.has_partition_column());
        assert!(!Table::Targets.has_partition_column());
        assert_eq!(Table::Targets.column("class"), Some("class"));
        assert_eq!(Table::Targets.column("class; DROP TABLE samples"), None);
        assert_eq!(Table::parse("predictions"), Some(Table::Predictions));
        assert_eq!(Table::parse("sqlite_master"), None);
    }
}
