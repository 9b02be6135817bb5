// ==========================================
// 实验跟踪流水线 - CART 决策树 (随机森林基学习器)
// ==========================================
// 划分准则: Gini 不纯度;阈值取相邻不同取值的中点
// 叶子输出: 多数类编码,并列取较小编码
// 构建: 显式栈,避免深树递归
// ==========================================

use ndarray::{Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;

/// 单棵树的生长约束
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// 每次划分候选特征数 (已按特征总数解析)
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// 在给定样本下标上训练
    ///
    /// # 参数
    /// - `y`: 已编码类别 (0..n_classes)
    /// - `indices`: 参与训练的行 (可重复,用于 bootstrap)
    pub fn fit<R: Rng + ?Sized>(
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        indices: Vec<usize>,
        config: &TreeConfig,
        rng: &mut R,
    ) -> DecisionTree {
        let mut nodes = vec![Node::Leaf { class: 0 }];
        let mut stack = vec![(0usize, indices, 0usize)];

        while let Some((node_id, rows, depth)) = stack.pop() {
            let counts = class_counts(y, &rows, n_classes);
            let majority = argmax(&counts);
            let parent_impurity = gini(&counts, rows.len());

            let depth_exhausted = config.max_depth.map_or(false, |d| depth >= d);
            if parent_impurity == 0.0 || depth_exhausted || rows.len() < config.min_samples_split {
                nodes[node_id] = Node::Leaf { class: majority };
                continue;
            }

            let split = match best_split(x, y, n_classes, &rows, config, rng) {
                Some(s) if s.impurity <= parent_impurity => s,
                _ => {
                    nodes[node_id] = Node::Leaf { class: majority };
                    continue;
                }
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&r| x[[r, split.feature]] <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { class: majority });
            let right = nodes.len();
            nodes.push(Node::Leaf { class: majority });
            nodes[node_id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push((right, right_rows, depth + 1));
            stack.push((left, left_rows, depth + 1));
        }

        DecisionTree { nodes }
    }

    /// 单行预测,返回类别编码
    pub fn predict_row(&self, row: ArrayView1<f64>) -> usize {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn best_split<R: Rng + ?Sized>(
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    rows: &[usize],
    config: &TreeConfig,
    rng: &mut R,
) -> Option<BestSplit> {
    let n_features = x.ncols();
    let k = config.max_features.clamp(1, n_features);
    // 随机排列全部特征;前 k 个无有效划分时继续向后查找
    let candidates = sample(rng, n_features, n_features);
    let n = rows.len();

    let mut best: Option<BestSplit> = None;
    let mut sorted = rows.to_vec();

    for (visited, feature) in candidates.iter().enumerate() {
        if visited >= k && best.is_some() {
            break;
        }
        sorted.sort_by(|a, b| x[[*a, feature]].total_cmp(&x[[*b, feature]]));

        let mut left = vec![0usize; n_classes];
        let mut right = class_counts(y, &sorted, n_classes);

        for pos in 1..n {
            let moved = y[sorted[pos - 1]];
            left[moved] += 1;
            right[moved] -= 1;

            let lo = x[[sorted[pos - 1], feature]];
            let hi = x[[sorted[pos], feature]];
            if lo == hi {
                continue;
            }
            if pos < config.min_samples_leaf || n - pos < config.min_samples_leaf {
                continue;
            }

            let impurity =
                (pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos)) / n as f64;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(BestSplit {
                    feature,
                    threshold: (lo + hi) / 2.0,
                    impurity,
                });
            }
        }
    }

    best
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for r in rows {
        counts[y[*r]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// 最大计数下标,并列取较小下标
pub(crate) fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, c) in counts.iter().enumerate() {
        if *c > counts[best] {
            best = i;
        }
    }
    best
}
