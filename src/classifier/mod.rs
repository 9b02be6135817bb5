// ==========================================
// 实验跟踪流水线 - 分类器层
// ==========================================
// 职责: 封闭的模型集合 (RandomForest / SVC / LogisticRegression)
//       + 统一的 fit/predict 能力约定 + 模型注册表
// 红线: 不访问数据库,不持有共享状态
// ==========================================

pub mod cancel;
pub mod decision_tree;
pub mod error;
pub mod labels;
pub mod logistic_regression;
pub mod params;
pub mod random_forest;
pub mod registry;
pub mod svc;

pub use cancel::CancelToken;
pub use error::{ClassifierError, ClassifierResult};
pub use logistic_regression::{LogisticRegressionClassifier, LogisticRegressionParams};
pub use params::Hyperparameters;
pub use random_forest::{RandomForestClassifier, RandomForestParams};
pub use registry::ModelRegistry;
pub use svc::{SvcClassifier, SvcParams};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Estimator - fit/predict 能力约定
// ==========================================
pub trait Estimator {
    /// 在 (x, y) 上训练;训练循环内轮询取消令牌
    fn fit(&mut self, x: &Array2<f64>, y: &[i64], cancel: &CancelToken) -> ClassifierResult<()>;

    /// 逐行预测类别;未训练返回 NotFitted
    fn predict(&self, x: &Array2<f64>) -> ClassifierResult<Vec<i64>>;

    /// 训练时的特征维度 (未训练为 None)
    fn n_features(&self) -> Option<usize>;
}

// ==========================================
// ModelKind - 模型名称 (对外协议)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "RandomForest")]
    RandomForest,
    #[serde(rename = "SVC")]
    Svc,
    #[serde(rename = "LogisticRegression")]
    LogisticRegression,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::RandomForest,
        ModelKind::Svc,
        ModelKind::LogisticRegression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "RandomForest",
            ModelKind::Svc => "SVC",
            ModelKind::LogisticRegression => "LogisticRegression",
        }
    }

    /// 按名称解析 (大小写敏感)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Classifier - 模型的标签联合
// ==========================================
#[derive(Debug, Clone)]
pub enum Classifier {
    RandomForest(RandomForestClassifier),
    Svc(SvcClassifier),
    LogisticRegression(LogisticRegressionClassifier),
}

impl Classifier {
    /// 以默认超参数构造
    pub fn with_defaults(kind: ModelKind, seed: u64) -> Self {
        match kind {
            ModelKind::RandomForest => {
                Classifier::RandomForest(RandomForestClassifier::new(RandomForestParams::default(), seed))
            }
            ModelKind::Svc => Classifier::Svc(SvcClassifier::new(SvcParams::default(), seed)),
            ModelKind::LogisticRegression => Classifier::LogisticRegression(
                LogisticRegressionClassifier::new(LogisticRegressionParams::default()),
            ),
        }
    }

    /// 以调用方超参数构造 (未训练)
    pub fn from_hyperparameters(
        kind: ModelKind,
        params: &Hyperparameters,
        seed: u64,
    ) -> ClassifierResult<Self> {
        let classifier = match kind {
            ModelKind::RandomForest => Classifier::RandomForest(RandomForestClassifier::new(
                RandomForestParams::from_hyperparameters(params)?,
                seed,
            )),
            ModelKind::Svc => {
                Classifier::Svc(SvcClassifier::new(SvcParams::from_hyperparameters(params)?, seed))
            }
            ModelKind::LogisticRegression => Classifier::LogisticRegression(
                LogisticRegressionClassifier::new(LogisticRegressionParams::from_hyperparameters(params)?),
            ),
        };
        Ok(classifier)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::RandomForest(_) => ModelKind::RandomForest,
            Classifier::Svc(_) => ModelKind::Svc,
            Classifier::LogisticRegression(_) => ModelKind::LogisticRegression,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn estimator(&self) -> &dyn Estimator {
        match self {
            Classifier::RandomForest(m) => m,
            Classifier::Svc(m) => m,
            Classifier::LogisticRegression(m) => m,
        }
    }

    fn estimator_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Classifier::RandomForest(m) => m,
            Classifier::Svc(m) => m,
            Classifier::LogisticRegression(m) => m,
        }
    }
}

impl Estimator for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64], cancel: &CancelToken) -> ClassifierResult<()> {
        self.estimator_mut().fit(x, y, cancel)
    }

    fn predict(&self, x: &Array2<f64>) -> ClassifierResult<Vec<i64>> {
        self.estimator().predict(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.estimator().n_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    #[test]
    fn test_model_kind_wire_names() {
        assert_eq!(ModelKind::parse("SVC"), Some(ModelKind::Svc));
        assert_eq!(ModelKind::parse("svc"), None);
        assert_eq!(ModelKind::parse("NotARealModel"), None);
        assert_eq!(serde_json::to_value(ModelKind::Svc).unwrap(), json!("SVC"));
    }

    #[test]
    fn test_every_kind_fits_and_predicts() {
        let x = array![[-1.0, -1.0], [-1.2, -0.8], [1.0, 1.0], [0.8, 1.2]];
        let y = vec![0, 0, 1, 1];
        for kind in ModelKind::ALL {
            let mut model = Classifier::with_defaults(kind, 42);
            assert_eq!(model.kind(), kind);
            assert!(model.predict(&x).is_err());

            model.fit(&x, &y, &CancelToken::new()).unwrap();
            let predicted = model.predict(&x).unwrap();
            assert_eq!(predicted.len(), 4);
            assert!(predicted.iter().all(|c| *c == 0 || *c == 1));
            assert_eq!(model.n_features(), Some(2));
        }
    }

    #[test]
    fn test_invalid_hyperparameters_name_the_model() {
        let params = json!({"kernel": "sigmoid"}).as_object().cloned().unwrap();
        match Classifier::from_hyperparameters(ModelKind::Svc, &params, 42) {
            Err(ClassifierError::InvalidHyperparameters { model, .. }) => assert_eq!(model, "SVC"),
            other => panic!("Expected InvalidHyperparameters, got {:?}", other.map(|c| c.kind())),
        }
    }
}
