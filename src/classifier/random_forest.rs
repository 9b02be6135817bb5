// ==========================================
// 实验跟踪流水线 - 随机森林分类器
// ==========================================
// 算法: bootstrap 重采样 + 随机特征子集的 CART 集成
// 投票: 多数票,并列取较小标签
// 随机性: ChaCha8Rng,种子由服务注入,结果可复现
// ==========================================

use crate::classifier::cancel::CancelToken;
use crate::classifier::decision_tree::{argmax, DecisionTree, TreeConfig};
use crate::classifier::error::{ClassifierError, ClassifierResult};
use crate::classifier::labels::{check_fit_input, check_predict_shape, ClassLabels};
use crate::classifier::params::{ensure_at_least, parse_hyperparameters, Hyperparameters};
use crate::classifier::Estimator;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

const MODEL: &str = "RandomForest";

// ==========================================
// 超参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeaturesRule {
    Sqrt,
    Log2,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MaxFeatures {
    Rule(MaxFeaturesRule),
    Count(usize),
}

impl MaxFeatures {
    /// 按特征总数解析为候选数 (至少 1,至多 n)
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features.max(1);
        let k = match self {
            MaxFeatures::Rule(MaxFeaturesRule::Sqrt) => (n as f64).sqrt().floor() as usize,
            MaxFeatures::Rule(MaxFeaturesRule::Log2) => (n as f64).log2().floor() as usize,
            MaxFeatures::Rule(MaxFeaturesRule::All) => n,
            MaxFeatures::Count(c) => *c,
        };
        k.clamp(1, n)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Rule(MaxFeaturesRule::Sqrt),
            bootstrap: true,
        }
    }
}

impl RandomForestParams {
    pub fn from_hyperparameters(params: &Hyperparameters) -> ClassifierResult<Self> {
        let parsed: Self = parse_hyperparameters(MODEL, params)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        ensure_at_least(MODEL, "n_estimators", self.n_estimators, 1)?;
        if let Some(depth) = self.max_depth {
            ensure_at_least(MODEL, "max_depth", depth, 1)?;
        }
        ensure_at_least(MODEL, "min_samples_split", self.min_samples_split, 2)?;
        ensure_at_least(MODEL, "min_samples_leaf", self.min_samples_leaf, 1)?;
        if let MaxFeatures::Count(c) = self.max_features {
            ensure_at_least(MODEL, "max_features", c, 1)?;
        }
        Ok(())
    }
}

// ==========================================
// RandomForestClassifier
// ==========================================
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    params: RandomForestParams,
    seed: u64,
    fitted: Option<FittedForest>,
}

#[derive(Debug, Clone)]
struct FittedForest {
    labels: ClassLabels,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            fitted: None,
        }
    }
}

impl Estimator for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64], cancel: &CancelToken) -> ClassifierResult<()> {
        check_fit_input(x, y)?;
        let labels = ClassLabels::from_targets(y);
        let encoded: Vec<usize> = y
            .iter()
            .map(|v| labels.encode(*v).unwrap_or_default())
            .collect();

        let config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features.resolve(x.ncols()),
        };

        let n = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            cancel.check()?;
            let mut tree_rng = ChaCha8Rng::seed_from_u64(rng.gen());
            let indices: Vec<usize> = if self.params.bootstrap {
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(
                x,
                &encoded,
                labels.len(),
                indices,
                &config,
                &mut tree_rng,
            ));
        }

        tracing::debug!(trees = trees.len(), classes = labels.len(), "RandomForest 训练完成");
        self.fitted = Some(FittedForest {
            labels,
            n_features: x.ncols(),
            trees,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> ClassifierResult<Vec<i64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| ClassifierError::NotFitted {
            model: MODEL.to_string(),
        })?;
        check_predict_shape(x, fitted.n_features)?;

        let predictions = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0usize; fitted.labels.len()];
                for tree in &fitted.trees {
                    votes[tree.predict_row(row)] += 1;
                }
                fitted.labels.decode(argmax(&votes))
            })
            .collect();
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn training_data() -> (Array2<f64>, Vec<i64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [5.0, 5.1],
            [5.2, 4.9],
            [4.8, 5.0],
            [10.0, 0.0],
            [10.2, 0.1],
            [9.9, 0.2]
        ];
        (x, vec![3, 3, 3, 7, 7, 7, 9, 9, 9])
    }

    #[test]
    fn test_forest_fits_separated_classes() {
        let (x, y) = training_data();
        let params = RandomForestParams {
            n_estimators: 25,
            bootstrap: false,
            ..RandomForestParams::default()
        };
        let mut model = RandomForestClassifier::new(params, 42);
        model.fit(&x, &y, &CancelToken::new()).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_forest_is_reproducible_with_seed() {
        let (x, y) = training_data();
        let probe = array![[2.5, 2.5], [7.5, 2.5], [5.0, 0.0]];

        let mut a = RandomForestClassifier::new(RandomForestParams::default(), 42);
        let mut b = RandomForestClassifier::new(RandomForestParams::default(), 42);
        a.fit(&x, &y, &CancelToken::new()).unwrap();
        b.fit(&x, &y, &CancelToken::new()).unwrap();
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_single_class_predicts_that_class() {
        let x = array![[1.0], [2.0]];
        let mut model = RandomForestClassifier::new(RandomForestParams::default(), 1);
        model.fit(&x, &[4, 4], &CancelToken::new()).unwrap();
        assert_eq!(model.predict(&array![[9.0]]).unwrap(), vec![4]);
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Rule(MaxFeaturesRule::Sqrt).resolve(13), 3);
        assert_eq!(MaxFeatures::Rule(MaxFeaturesRule::Log2).resolve(13), 3);
        assert_eq!(MaxFeatures::Rule(MaxFeaturesRule::All).resolve(13), 13);
        assert_eq!(MaxFeatures::Count(40).resolve(13), 13);
        assert_eq!(MaxFeatures::Rule(MaxFeaturesRule::Log2).resolve(1), 1);
    }

    #[test]
    fn test_params_parsing_and_validation() {
        let ok = json!({"n_estimators": 10, "max_depth": 3, "max_features": "log2"})
            .as_object()
            .cloned()
            .unwrap();
        let parsed = RandomForestParams::from_hyperparameters(&ok).unwrap();
        assert_eq!(parsed.n_estimators, 10);
        assert_eq!(parsed.max_depth, Some(3));
        assert_eq!(parsed.max_features, MaxFeatures::Rule(MaxFeaturesRule::Log2));

        let count = json!({"max_features": 2}).as_object().cloned().unwrap();
        assert_eq!(
            RandomForestParams::from_hyperparameters(&count).unwrap().max_features,
            MaxFeatures::Count(2)
        );

        let bad = json!({"n_estimators": 0}).as_object().cloned().unwrap();
        let err = RandomForestParams::from_hyperparameters(&bad).unwrap_err();
        assert!(err.to_string().contains("n_estimators=0"));

        let wrong_type = json!({"bootstrap": "yes"}).as_object().cloned().unwrap();
        assert!(RandomForestParams::from_hyperparameters(&wrong_type).is_err());
    }
}
