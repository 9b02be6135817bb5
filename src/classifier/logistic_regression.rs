// ==========================================
// 实验跟踪流水线 - 逻辑回归分类器
// ==========================================
// 算法: L2 正则批量梯度下降;多分类 one-vs-rest
// 目标函数: mean(logloss) + ||w||² / (2·C·n)
// ==========================================

use crate::classifier::cancel::CancelToken;
use crate::classifier::error::{ClassifierError, ClassifierResult};
use crate::classifier::labels::{check_fit_input, check_predict_shape, ClassLabels};
use crate::classifier::params::{ensure_at_least, ensure_positive, parse_hyperparameters, Hyperparameters};
use crate::classifier::Estimator;
use ndarray::{Array1, Array2};
use serde::Deserialize;

const MODEL: &str = "LogisticRegression";

/// 每个 max_iter 单位对应的梯度步数
const STEPS_PER_ITER: usize = 10;
const MAX_STEPS: usize = 200_000;
const CANCEL_POLL_STEPS: usize = 64;

// ==========================================
// 超参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogisticRegressionParams {
    #[serde(rename = "C")]
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    pub fit_intercept: bool,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            learning_rate: 0.1,
            fit_intercept: true,
        }
    }
}

impl LogisticRegressionParams {
    pub fn from_hyperparameters(params: &Hyperparameters) -> ClassifierResult<Self> {
        let parsed: Self = parse_hyperparameters(MODEL, params)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        ensure_positive(MODEL, "C", self.c)?;
        ensure_at_least(MODEL, "max_iter", self.max_iter, 1)?;
        ensure_positive(MODEL, "tol", self.tol)?;
        ensure_positive(MODEL, "learning_rate", self.learning_rate)?;
        Ok(())
    }

    fn steps(&self) -> usize {
        self.max_iter.saturating_mul(STEPS_PER_ITER).min(MAX_STEPS)
    }
}

// ==========================================
// LogisticRegressionClassifier
// ==========================================
#[derive(Debug, Clone)]
pub struct LogisticRegressionClassifier {
    params: LogisticRegressionParams,
    fitted: Option<FittedLinear>,
}

#[derive(Debug, Clone)]
struct FittedLinear {
    labels: ClassLabels,
    n_features: usize,
    // 每个二分类器: (权重, 截距)
    models: Vec<(Array1<f64>, f64)>,
}

impl LogisticRegressionClassifier {
    pub fn new(params: LogisticRegressionParams) -> Self {
        Self { params, fitted: None }
    }

    fn fit_binary(
        &self,
        x: &Array2<f64>,
        targets: &[f64],
        cancel: &CancelToken,
    ) -> ClassifierResult<(Array1<f64>, f64)> {
        let n = x.nrows() as f64;
        let y01 = Array1::from_iter(targets.iter().map(|t| if *t > 0.0 { 1.0 } else { 0.0 }));
        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;
        let reg = 1.0 / (self.params.c * n);
        let lr = self.params.learning_rate;

        for step in 0..self.params.steps() {
            if step % CANCEL_POLL_STEPS == 0 {
                cancel.check()?;
            }

            let z = x.dot(&w) + b;
            let residual = z.mapv(sigmoid) - &y01;
            let grad_w = x.t().dot(&residual) / n + &w * reg;
            let grad_b = if self.params.fit_intercept {
                residual.sum() / n
            } else {
                0.0
            };

            w.scaled_add(-lr, &grad_w);
            b -= lr * grad_b;

            let max_grad = grad_w.iter().fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if max_grad < self.params.tol {
                tracing::debug!(step, "LogisticRegression 收敛");
                break;
            }
        }

        Ok((w, b))
    }
}

impl Estimator for LogisticRegressionClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64], cancel: &CancelToken) -> ClassifierResult<()> {
        check_fit_input(x, y)?;
        let labels = ClassLabels::from_targets(y);

        let mut models = Vec::new();
        if labels.len() > 1 {
            for k in 0..labels.n_binary_models() {
                let targets = labels.binary_targets(y, labels.positive_class(k));
                models.push(self.fit_binary(x, &targets, cancel)?);
            }
        }

        self.fitted = Some(FittedLinear {
            labels,
            n_features: x.ncols(),
            models,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> ClassifierResult<Vec<i64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| ClassifierError::NotFitted {
            model: MODEL.to_string(),
        })?;
        check_predict_shape(x, fitted.n_features)?;

        let decisions: Vec<Array1<f64>> = fitted.models.iter().map(|(w, b)| x.dot(w) + *b).collect();
        let predictions = (0..x.nrows())
            .map(|i| {
                let scores: Vec<f64> = decisions.iter().map(|d| d[i]).collect();
                fitted.labels.pick(&scores)
            })
            .collect();
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
