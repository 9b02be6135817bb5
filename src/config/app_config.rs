// ==========================================
// 实验跟踪流水线 - 进程配置
// ==========================================
// 来源: 环境变量 (前缀 ML_TRACKING_),缺省取默认值
// 约束: 启动时一次性加载并校验,运行期不变
// ==========================================

use crate::classifier::ModelKind;
use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use std::path::PathBuf;
use thiserror::Error;

/// 环境变量名
pub mod env_keys {
    pub const DB_PATH: &str = "ML_TRACKING_DB_PATH";
    pub const HOST: &str = "ML_TRACKING_HOST";
    pub const PORT: &str = "ML_TRACKING_PORT";
    pub const BASE_URL: &str = "ML_TRACKING_BASE_URL";
    pub const SERVICE_URL: &str = "ML_TRACKING_SERVICE_URL";
    pub const DEBUG: &str = "ML_TRACKING_DEBUG";
    pub const SEED: &str = "ML_TRACKING_SEED";
    pub const DEFAULT_MODEL: &str = "ML_TRACKING_DEFAULT_MODEL";
    pub const BUSY_TIMEOUT_MS: &str = "ML_TRACKING_BUSY_TIMEOUT_MS";
    pub const REQUEST_TIMEOUT_SECS: &str = "ML_TRACKING_REQUEST_TIMEOUT_SECS";
    pub const LOG_JSON: &str = "ML_TRACKING_LOG_JSON";
    pub const SLOW_SQL_MS: &str = "ML_TRACKING_SLOW_SQL_MS";
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置项 {key} 取值无效: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub service_url: String,
    pub debug: bool,
    pub seed: u64,
    pub default_model: ModelKind,
    pub busy_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub log_json: bool,
    /// 慢 SQL 告警阈值 (毫秒),0 关闭
    pub slow_sql_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            base_url: String::new(),
            service_url: "/model".to_string(),
            debug: false,
            seed: 42,
            default_model: ModelKind::RandomForest,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            request_timeout_secs: 120,
            log_json: false,
            slow_sql_ms: 200,
        }
    }
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载 (空白值视为未设置)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = AppConfig::default();

        if let Some(v) = get(env_keys::DB_PATH) {
            config.db_path = v;
        }
        if let Some(v) = get(env_keys::HOST) {
            config.host = v;
        }
        if let Some(v) = get(env_keys::PORT) {
            config.port = parse_number(env_keys::PORT, &v)?;
        }
        if let Some(v) = get(env_keys::BASE_URL) {
            config.base_url = normalize_path(env_keys::BASE_URL, &v)?;
        }
        if let Some(v) = get(env_keys::SERVICE_URL) {
            config.service_url = normalize_path(env_keys::SERVICE_URL, &v)?;
        }
        if let Some(v) = get(env_keys::DEBUG) {
            config.debug = is_true(&v);
        }
        if let Some(v) = get(env_keys::SEED) {
            config.seed = parse_number(env_keys::SEED, &v)?;
        }
        if let Some(v) = get(env_keys::DEFAULT_MODEL) {
            config.default_model = ModelKind::parse(&v).ok_or_else(|| ConfigError::InvalidValue {
                key: env_keys::DEFAULT_MODEL,
                value: v.clone(),
                reason: "可选 RandomForest / SVC / LogisticRegression".to_string(),
            })?;
        }
        if let Some(v) = get(env_keys::BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = parse_number(env_keys::BUSY_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(env_keys::REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_number(env_keys::REQUEST_TIMEOUT_SECS, &v)?;
            if config.request_timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: env_keys::REQUEST_TIMEOUT_SECS,
                    value: v,
                    reason: "必须大于 0".to_string(),
                });
            }
        }
        if let Some(v) = get(env_keys::LOG_JSON) {
            config.log_json = is_true(&v);
        }
        if let Some(v) = get(env_keys::SLOW_SQL_MS) {
            config.slow_sql_ms = parse_number(env_keys::SLOW_SQL_MS, &v)?;
        }

        Ok(config)
    }

    /// 路由挂载路径: base_url + service_url
    pub fn route_prefix(&self) -> String {
        format!("{}{}", self.base_url, self.service_url)
    }

    /// 监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_true(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on")
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// 规范化 URL 路径: 以 / 开头,不以 / 结尾
fn normalize_path(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    if !raw.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "必须以 / 开头".to_string(),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// 默认数据库路径
///
/// 优先使用用户数据目录,取不到时回退到当前目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./ml_tracking.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("ml-tracking");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("ml_tracking.db");
        }
    }

    path.to_string_lossy().to_string()
}
