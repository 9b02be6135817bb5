// ==========================================
// 实验跟踪流水线 - 超参数解析
// ==========================================
// 约定: 调用方传 JSON 对象;未知字段、类型错误、越界值一律拒绝
// 约定: random_state 由服务注入,调用方不得覆盖
// ==========================================

use crate::classifier::error::{ClassifierError, ClassifierResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 调用方提交的超参数
pub type Hyperparameters = Map<String, Value>;

/// 由服务注入的保留参数
pub const RESERVED_PARAMS: &[&str] = &["random_state"];

/// 解析为强类型参数 (缺省字段取默认值)
pub fn parse_hyperparameters<T: DeserializeOwned>(
    model: &str,
    params: &Hyperparameters,
) -> ClassifierResult<T> {
    if let Some(key) = RESERVED_PARAMS.iter().find(|k| params.contains_key(**k)) {
        return Err(ClassifierError::invalid_param(
            model,
            format!("参数 '{}' 由服务统一设置,不接受外部传入", key),
        ));
    }

    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| ClassifierError::invalid_param(model, e.to_string()))
}

/// 下限校验
pub fn ensure_at_least<T: PartialOrd + std::fmt::Display>(
    model: &str,
    name: &str,
    value: T,
    min: T,
) -> ClassifierResult<()> {
    if value < min {
        return Err(ClassifierError::invalid_param(
            model,
            format!("{}={} 必须 >= {}", name, value, min),
        ));
    }
    Ok(())
}

/// 正数校验 (拒绝 NaN)
pub fn ensure_positive(model: &str, name: &str, value: f64) -> ClassifierResult<()> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(ClassifierError::invalid_param(
            model,
            format!("{}={} 必须为正数", name, value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct Demo {
        depth: usize,
    }

    impl Default for Demo {
        fn default() -> Self {
            Demo { depth: 3 }
        }
    }

    fn to_map(v: Value) -> Hyperparameters {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_and_overrides() {
        let d: Demo = parse_hyperparameters("Demo", &Hyperparameters::new()).unwrap();
        assert_eq!(d.depth, 3);
        let d: Demo = parse_hyperparameters("Demo", &to_map(json!({"depth": 7}))).unwrap();
        assert_eq!(d.depth, 7);
    }

    #[test]
    fn test_rejects_unknown_and_reserved() {
        let err = parse_hyperparameters::<Demo>("Demo", &to_map(json!({"width": 1}))).unwrap_err();
        assert!(err.to_string().contains("width"));

        let err =
            parse_hyperparameters::<Demo>("Demo", &to_map(json!({"random_state": 1}))).unwrap_err();
        assert!(err.to_string().contains("random_state"));
    }

    #[test]
    fn test_range_helpers() {
        assert!(ensure_at_least("M", "n", 1usize, 1).is_ok());
        assert!(ensure_at_least("M", "n", 0usize, 1).is_err());
        assert!(ensure_positive("M", "C", f64::NAN).is_err());
        assert!(ensure_positive("M", "C", 0.5).is_ok());
    }
}
