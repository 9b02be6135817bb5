// ==========================================
// 实验跟踪流水线 - 支持向量分类器 (SVC)
// ==========================================
// 算法: 核化 Pegasos (随机次梯度),λ = 1 / (C·n)
// 偏置: 核函数统一加常数 1 (隐式截距)
// 多分类: one-vs-rest,取决策值最大者
// ==========================================

use crate::classifier::cancel::CancelToken;
use crate::classifier::error::{ClassifierError, ClassifierResult};
use crate::classifier::labels::{check_fit_input, check_predict_shape, ClassLabels};
use crate::classifier::params::{ensure_at_least, ensure_positive, parse_hyperparameters, Hyperparameters};
use crate::classifier::Estimator;
use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

const MODEL: &str = "SVC";
const CANCEL_POLL_STEPS: usize = 256;

// ==========================================
// 超参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Rbf,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaRule {
    Scale,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Gamma {
    Rule(GammaRule),
    Value(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SvcParams {
    #[serde(rename = "C")]
    pub c: f64,
    pub kernel: Kernel,
    pub gamma: Gamma,
    pub max_iter: usize,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::Rbf,
            gamma: Gamma::Rule(GammaRule::Scale),
            max_iter: 1000,
        }
    }
}

impl SvcParams {
    pub fn from_hyperparameters(params: &Hyperparameters) -> ClassifierResult<Self> {
        let parsed: Self = parse_hyperparameters(MODEL, params)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        ensure_positive(MODEL, "C", self.c)?;
        ensure_at_least(MODEL, "max_iter", self.max_iter, 1)?;
        if let Gamma::Value(g) = self.gamma {
            ensure_positive(MODEL, "gamma", g)?;
        }
        Ok(())
    }

    /// 根据训练数据解析 gamma
    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self.gamma {
            Gamma::Value(g) => g,
            Gamma::Rule(GammaRule::Auto) => 1.0 / n_features,
            Gamma::Rule(GammaRule::Scale) => {
                let var = x.var(0.0);
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
        }
    }
}

// ==========================================
// SvcClassifier
// ==========================================
#[derive(Debug, Clone)]
pub struct SvcClassifier {
    params: SvcParams,
    seed: u64,
    fitted: Option<FittedSvc>,
}

#[derive(Debug, Clone)]
struct FittedSvc {
    labels: ClassLabels,
    support: Array2<f64>,
    gamma: f64,
    // 每个二分类器: 每个训练样本的系数 α·y / (λ·T)
    coefficients: Vec<Vec<f64>>,
}

impl SvcClassifier {
    pub fn new(params: SvcParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            fitted: None,
        }
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
        let k = match self.params.kernel {
            Kernel::Linear => a.dot(&b),
            Kernel::Rbf => {
                let dist: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
                (-gamma * dist).exp()
            }
        };
        k + 1.0
    }

    fn fit_binary(
        &self,
        gram: &Array2<f64>,
        targets: &[f64],
        rng: &mut ChaCha8Rng,
        cancel: &CancelToken,
    ) -> ClassifierResult<Vec<f64>> {
        let n = targets.len();
        let lambda = 1.0 / (self.params.c * n as f64);
        let steps = self.params.max_iter.max(n);
        let mut alpha = vec![0.0f64; n];

        for t in 1..=steps {
            if t % CANCEL_POLL_STEPS == 0 {
                cancel.check()?;
            }
            let i = rng.gen_range(0..n);
            let mut margin = 0.0;
            for (j, a) in alpha.iter().enumerate() {
                if *a != 0.0 {
                    margin += a * targets[j] * gram[[j, i]];
                }
            }
            margin *= targets[i] / (lambda * t as f64);
            if margin < 1.0 {
                alpha[i] += 1.0;
            }
        }

        let norm = lambda * steps as f64;
        Ok(alpha
            .iter()
            .zip(targets.iter())
            .map(|(a, y)| a * y / norm)
            .collect())
    }
}

impl Estimator for SvcClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64], cancel: &CancelToken) -> ClassifierResult<()> {
        check_fit_input(x, y)?;
        let labels = ClassLabels::from_targets(y);
        let gamma = self.params.resolve_gamma(x);

        let n = x.nrows();
        let mut gram = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            if i % CANCEL_POLL_STEPS == 0 {
                cancel.check()?;
            }
            for j in i..n {
                let k = self.kernel(x.row(i), x.row(j), gamma);
                gram[[i, j]] = k;
                gram[[j, i]] = k;
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut coefficients = Vec::new();
        if labels.len() > 1 {
            for k in 0..labels.n_binary_models() {
                let targets = labels.binary_targets(y, labels.positive_class(k));
                coefficients.push(self.fit_binary(&gram, &targets, &mut rng, cancel)?);
            }
        }

        self.fitted = Some(FittedSvc {
            labels,
            support: x.clone(),
            gamma,
            coefficients,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> ClassifierResult<Vec<i64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| ClassifierError::NotFitted {
            model: MODEL.to_string(),
        })?;
        check_predict_shape(x, fitted.support.ncols())?;

        let mut predictions = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let kernels: Vec<f64> = fitted
                .support
                .rows()
                .into_iter()
                .map(|s| self.kernel(s, row, fitted.gamma))
                .collect();
            let scores: Vec<f64> = fitted
                .coefficients
                .iter()
                .map(|coef| coef.iter().zip(kernels.iter()).map(|(c, k)| c * k).sum())
                .collect();
            predictions.push(fitted.labels.pick(&scores));
        }
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.support.ncols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn clusters() -> (Array2<f64>, Vec<i64>) {
        let x = array![
            [-2.0, -2.1],
            [-2.2, -1.8],
            [-1.9, -2.0],
            [2.0, 2.1],
            [2.2, 1.9],
            [1.8, 2.0]
        ];
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_linear_kernel_separates_clusters() {
        let (x, y) = clusters();
        let params = SvcParams {
            kernel: Kernel::Linear,
            ..SvcParams::default()
        };
        let mut model = SvcClassifier::new(params, 42);
        model.fit(&x, &y, &CancelToken::new()).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = clusters();
        let mut a = SvcClassifier::new(SvcParams::default(), 7);
        let mut b = SvcClassifier::new(SvcParams::default(), 7);
        a.fit(&x, &y, &CancelToken::new()).unwrap();
        b.fit(&x, &y, &CancelToken::new()).unwrap();

        let probe = array![[0.5, 0.4], [-0.3, -0.6], [3.0, 3.0]];
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_shape_mismatch_on_predict() {
        let (x, y) = clusters();
        let mut model = SvcClassifier::new(SvcParams::default(), 1);
        model.fit(&x, &y, &CancelToken::new()).unwrap();
        let err = model.predict(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(err, ClassifierError::ShapeMismatch { expected: 2, actual: 3 });
    }

    #[test]
    fn test_params_parsing() {
        let params = json!({"kernel": "linear", "gamma": 0.5}).as_object().cloned().unwrap();
        let parsed = SvcParams::from_hyperparameters(&params).unwrap();
        assert_eq!(parsed.kernel, Kernel::Linear);
        assert_eq!(parsed.gamma, Gamma::Value(0.5));

        let auto = json!({"gamma": "auto"}).as_object().cloned().unwrap();
        assert_eq!(
            SvcParams::from_hyperparameters(&auto).unwrap().gamma,
            Gamma::Rule(GammaRule::Auto)
        );

        let bad = json!({"kernel": "poly"}).as_object().cloned().unwrap();
        assert!(SvcParams::from_hyperparameters(&bad).is_err());
        let bad_gamma = json!({"gamma": -2.0}).as_object().cloned().unwrap();
        assert!(SvcParams::from_hyperparameters(&bad_gamma).is_err());
    }
}
