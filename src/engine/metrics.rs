// ==========================================
// 实验跟踪流水线 - 评分指标
// ==========================================

/// 准确率: 预测与真实标签相等的行数 / 总行数
///
/// - 无标签 (NULL) 的行计入总数但永远不算正确
/// - 总数为 0 时返回 0.0
pub fn accuracy(labels: &[Option<i64>], predictions: &[i64]) -> f64 {
    let total = labels.len().min(predictions.len());
    if total == 0 {
        return 0.0;
    }

    let correct = labels
        .iter()
        .zip(predictions.iter())
        .filter(|(truth, pred)| **truth == Some(**pred))
        .count();

    correct as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_bounds() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(accuracy(&[Some(1), Some(0)], &[1, 0]), 1.0);
        assert_eq!(accuracy(&[Some(1), Some(0)], &[0, 1]), 0.0);
        assert_eq!(accuracy(&[Some(1), None, Some(2), Some(3)], &[1, 1, 2, 0]), 0.5);
    }
}
