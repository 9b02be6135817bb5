// ==========================================
// 实验跟踪流水线 - 配置层
// ==========================================
// 职责: 进程级配置加载与校验 (环境变量)
// ==========================================

pub mod app_config;

// 重导出
pub use app_config::{default_db_path, env_keys, AppConfig, ConfigError};
