// ==========================================
// 实验跟踪流水线 - 类别标签编码
// ==========================================
// 类别按升序排列,下标即内部编码;多分类统一走 one-vs-rest
// ==========================================

use crate::classifier::error::{ClassifierError, ClassifierResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLabels {
    classes: Vec<i64>,
}

impl ClassLabels {
    /// 从训练标签收集类别 (升序去重)
    pub fn from_targets(y: &[i64]) -> ClassLabels {
        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        ClassLabels { classes }
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// 标签 → 编码
    pub fn encode(&self, label: i64) -> Option<usize> {
        self.classes.binary_search(&label).ok()
    }

    /// 编码 → 标签
    pub fn decode(&self, index: usize) -> i64 {
        self.classes[index]
    }

    /// one-vs-rest 的二分类目标 (+1 / -1)
    pub fn binary_targets(&self, y: &[i64], positive: usize) -> Vec<f64> {
        let label = self.classes[positive];
        y.iter().map(|v| if *v == label { 1.0 } else { -1.0 }).collect()
    }

    /// 参与训练的二分类器个数: 两类时只需一个
    pub fn n_binary_models(&self) -> usize {
        if self.classes.len() <= 2 {
            1
        } else {
            self.classes.len()
        }
    }

    /// 第 k 个二分类器的正类编码
    pub fn positive_class(&self, k: usize) -> usize {
        if self.classes.len() == 2 {
            1
        } else {
            k
        }
    }

    /// 按决策值选类别
    ///
    /// 两类时决策值 > 0 为正类;多类取最大值,并列取较小标签
    pub fn pick(&self, scores: &[f64]) -> i64 {
        match self.classes.len() {
            1 => self.classes[0],
            2 => {
                if scores[0] > 0.0 {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            }
            _ => {
                let mut best = 0;
                for (k, s) in scores.iter().enumerate() {
                    if *s > scores[best] {
                        best = k;
                    }
                }
                self.classes[best]
            }
        }
    }
}

/// 训练输入校验: 行数一致、非空、数值有限
pub fn check_fit_input(x: &Array2<f64>, y: &[i64]) -> ClassifierResult<()> {
    if x.nrows() == 0 || y.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ClassifierError::InvalidInput(format!(
            "样本数 {} 与标签数 {} 不一致",
            x.nrows(),
            y.len()
        )));
    }
    check_finite(x)
}

pub fn check_finite(x: &Array2<f64>) -> ClassifierResult<()> {
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ClassifierError::InvalidInput("特征矩阵包含 NaN/Inf".to_string()));
    }
    Ok(())
}

/// 预测输入维度校验
pub fn check_predict_shape(x: &Array2<f64>, expected: usize) -> ClassifierResult<()> {
    if x.ncols() != expected {
        return Err(ClassifierError::ShapeMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    check_finite(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_labels_sorted_and_encoded() {
        let labels = ClassLabels::from_targets(&[3, 1, 3, 2]);
        assert_eq!(labels.classes(), &[1, 2, 3]);
        assert_eq!(labels.encode(2), Some(1));
        assert_eq!(labels.encode(5), None);
        assert_eq!(labels.n_binary_models(), 3);
        assert_eq!(labels.binary_targets(&[3, 1], 2), vec![1.0, -1.0]);
    }

    #[test]
    fn test_pick_breaks_ties_to_smallest_label() {
        let multi = ClassLabels::from_targets(&[0, 1, 2]);
        assert_eq!(multi.pick(&[0.2, 0.7, 0.7]), 1);

        let binary = ClassLabels::from_targets(&[4, 9]);
        assert_eq!(binary.pick(&[0.0]), 4);
        assert_eq!(binary.pick(&[0.1]), 9);
    }

    #[test]
    fn test_fit_input_checks() {
        let x = array![[0.0, 1.0], [1.0, 0.0]];
        assert!(check_fit_input(&x, &[0, 1]).is_ok());
        assert!(matches!(check_fit_input(&x, &[0]), Err(ClassifierError::InvalidInput(_))));
        assert_eq!(
            check_predict_shape(&x, 3),
            Err(ClassifierError::ShapeMismatch { expected: 3, actual: 2 })
        );
    }
}
