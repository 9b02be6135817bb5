// ==========================================
// 实验跟踪流水线 - 特征矩阵构建与标准化
// ==========================================
// 特征列: 联表结果中除标识列与标签列外的全部列 (按投影顺序)
// 缺失值: 用当前批次的列均值填充;整列为空时填 0.0
// 标准化: 零均值、单位方差 (总体标准差);零方差列缩放系数取 1.0
// ==========================================

use crate::classifier::labels::check_finite;
use crate::classifier::{ClassifierError, ClassifierResult};
use crate::domain::record::{FieldValue, RecordSet};
use crate::engine::error::{PipelineError, PipelineResult};
use ndarray::{Array1, Array2, Axis};

/// 标签列
pub const LABEL_COLUMN: &str = "class";

/// 预测写回所用的关联键
pub const KEY_COLUMN: &str = "sample_index";

/// 不参与特征的标识列
pub const IDENTIFIER_COLUMNS: &[&str] = &[
    "dataset_id",
    "sample_id",
    "target_id",
    "sample_index",
    "target_index",
    "targets.sample_index",
    LABEL_COLUMN,
];

const MIN_SCALE: f64 = 1e-12;

// ==========================================
// FeatureMatrix - 一个批次的特征/标签
// ==========================================
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub labels: Vec<Option<i64>>,
    pub sample_indexes: Vec<i64>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.sample_indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_indexes.is_empty()
    }

    /// 抽取带标签的行 (用于拟合)
    pub fn labelled(&self, x: &Array2<f64>) -> (Array2<f64>, Vec<i64>) {
        let (rows, y): (Vec<usize>, Vec<i64>) = self
            .labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| label.map(|l| (i, l)))
            .unzip();
        (x.select(Axis(0), &rows), y)
    }
}

/// 从联表结果构建特征矩阵
pub fn build_feature_matrix(records: &RecordSet) -> PipelineResult<FeatureMatrix> {
    let key_idx = required_column(records, KEY_COLUMN)?;
    let label_idx = required_column(records, LABEL_COLUMN)?;

    let feature_cols: Vec<(usize, String)> = records
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !IDENTIFIER_COLUMNS.contains(&name.as_str()))
        .map(|(i, name)| (i, name.clone()))
        .collect();

    let n_rows = records.len();
    let n_cols = feature_cols.len();
    let mut raw: Vec<Option<f64>> = Vec::with_capacity(n_rows * n_cols);
    let mut labels = Vec::with_capacity(n_rows);
    let mut sample_indexes = Vec::with_capacity(n_rows);

    for (row_no, row) in records.rows.iter().enumerate() {
        let key = row[key_idx].as_i64().ok_or_else(|| PipelineError::InvalidRecord {
            row: row_no,
            column: KEY_COLUMN.to_string(),
            message: format!("期望整数,实际为 {:?}", row[key_idx]),
        })?;
        sample_indexes.push(key);

        let label = match &row[label_idx] {
            FieldValue::Null => None,
            value => Some(value.as_i64().ok_or_else(|| PipelineError::InvalidRecord {
                row: row_no,
                column: LABEL_COLUMN.to_string(),
                message: format!("期望整数类别,实际为 {:?}", value),
            })?),
        };
        labels.push(label);

        for (col_idx, name) in &feature_cols {
            let cell = &row[*col_idx];
            let value = match cell {
                FieldValue::Null => None,
                other => Some(other.as_f64().ok_or_else(|| PipelineError::InvalidRecord {
                    row: row_no,
                    column: name.clone(),
                    message: format!("期望数值,实际为 {:?}", other),
                })?),
            };
            raw.push(value);
        }
    }

    let features = impute_with_mean(raw, n_rows, n_cols);

    Ok(FeatureMatrix {
        feature_names: feature_cols.into_iter().map(|(_, name)| name).collect(),
        features,
        labels,
        sample_indexes,
    })
}

fn required_column(records: &RecordSet, name: &str) -> PipelineResult<usize> {
    records
        .column_index(name)
        .ok_or_else(|| PipelineError::InvalidRecord {
            row: 0,
            column: name.to_string(),
            message: "联表结果缺少该列".to_string(),
        })
}

/// 列均值填充 (按批次计算)
fn impute_with_mean(raw: Vec<Option<f64>>, n_rows: usize, n_cols: usize) -> Array2<f64> {
    let mut means = vec![0.0; n_cols];
    for (col, mean) in means.iter_mut().enumerate() {
        let (sum, count) = (0..n_rows)
            .filter_map(|r| raw[r * n_cols + col])
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count > 0 {
            *mean = sum / count as f64;
        }
    }

    Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        raw[r * n_cols + c].unwrap_or(means[c])
    })
}

// ==========================================
// StandardScaler - 标准化变换
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// 在训练批次上拟合
    pub fn fit(x: &Array2<f64>) -> ClassifierResult<StandardScaler> {
        if x.nrows() == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        check_finite(x)?;

        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s.is_finite() && s > MIN_SCALE { s } else { 1.0 });

        Ok(StandardScaler { mean, scale })
    }

    /// 应用已拟合的变换 (不重新拟合)
    pub fn transform(&self, x: &Array2<f64>) -> ClassifierResult<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn joined(rows: Vec<Vec<FieldValue>>) -> RecordSet {
        let mut set = RecordSet::new(
            ["sample_id", "dataset_id", "sample_index", "feature_1", "feature_2", "target_id", "targets.sample_index", "target_index", "class"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        set.rows = rows;
        set
    }

    fn row(index: i64, f1: FieldValue, f2: FieldValue, class: FieldValue) -> Vec<FieldValue> {
        use FieldValue::Integer;
        vec![Integer(index), Integer(1), Integer(index), f1, f2, Integer(index), Integer(index), Integer(index), class]
    }

    #[test]
    fn test_identifier_columns_excluded() {
        use FieldValue::*;
        let set = joined(vec![row(5, Real(1.0), Real(2.0), Integer(1))]);
        let m = build_feature_matrix(&set).unwrap();
        assert_eq!(m.feature_names, vec!["feature_1", "feature_2"]);
        assert_eq!(m.sample_indexes, vec![5]);
        assert_eq!(m.labels, vec![Some(1)]);
    }

    #[test]
    fn test_nulls_imputed_with_batch_mean() {
        use FieldValue::*;
        let set = joined(vec![
            row(1, Real(1.0), Null, Integer(0)),
            row(2, Null, Null, Null),
            row(3, Integer(3), Null, Integer(1)),
        ]);
        let m = build_feature_matrix(&set).unwrap();
        assert_eq!(m.features, array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
        assert_eq!(m.labels, vec![Some(0), None, Some(1)]);

        let (x, y) = m.labelled(&m.features);
        assert_eq!(x, array![[1.0, 0.0], [3.0, 0.0]]);
        assert_eq!(y, vec![0, 1]);
    }

    #[test]
    fn test_text_feature_is_invalid_record() {
        use FieldValue::*;
        let set = joined(vec![row(1, Text("abc".into()), Real(1.0), Integer(0))]);
        match build_feature_matrix(&set) {
            Err(PipelineError::InvalidRecord { column, .. }) => assert_eq!(column, "feature_1"),
            other => panic!("Expected InvalidRecord, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_scaler_zero_mean_unit_variance() {
        let x = array![[0.0, 5.0], [2.0, 5.0], [4.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        let expected = (8.0f64 / 3.0).sqrt();
        assert!((scaler.scale()[0] - expected).abs() < 1e-12);
        assert_eq!(scaler.scale()[1], 1.0);
        assert!((z[[0, 0]] + 2.0 / expected).abs() < 1e-12);
        assert!(z.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        let err = scaler.transform(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(err, ClassifierError::ShapeMismatch { expected: 2, actual: 3 });
    }
}
