// ==========================================
// 实验跟踪流水线 - 核心库
// ==========================================
// 流程: 分区选择 → 预处理 → (训练) → 预测 → 评分 → 持久化
// 技术栈: axum + Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 数据仓储层 - 数据访问
pub mod repository;

// 分类器与模型注册表
pub mod classifier;

// 引擎层 - 评分流水线
pub mod engine;

// 导入层 - 离线数据加载
pub mod importer;

// 配置层 - 进程配置
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{Partition, Table};

pub use classifier::{Classifier, ModelKind, ModelRegistry};

pub use engine::{ModelSlot, PipelineError, ScoringPipeline};

pub use api::{ApiError, ModelApi, TrackingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ML 实验跟踪流水线";
