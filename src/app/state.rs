// ==========================================
// 实验跟踪流水线 - 应用状态
// ==========================================
// 职责: 启动时打开共享连接,组装仓储/模型槽位/流水线/API
// 生命周期: 服务启动时创建,跨请求复用
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

use crate::api::{ModelApi, TrackingApi};
use crate::classifier::{Classifier, ModelRegistry};
use crate::config::AppConfig;
use crate::engine::{ModelSlot, ScoringPipeline};
use crate::repository::{
    DatasetRepository, PredictionRepository, QueryRepository, ScoringRunRepository,
};

/// 应用状态
///
/// 所有 API 实例共享同一条数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 评分运行超时
    pub request_timeout: Duration,

    /// 模型 API
    pub model_api: Arc<ModelApi>,

    /// 跟踪查询 API
    pub tracking_api: Arc<TrackingApi>,

    /// 分区数据仓储 (导入/测试夹具)
    pub dataset_repo: Arc<DatasetRepository>,

    /// 流水线 (测试中直接驱动)
    pub pipeline: Arc<ScoringPipeline>,
}

impl AppState {
    /// 按配置打开数据库并组装状态
    ///
    /// # 返回
    /// - Err(String): 数据库无法打开或建表失败
    pub fn new(config: &AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", config.db_path);

        let mut conn =
            crate::db::open_sqlite_connection_with_timeout(&config.db_path, config.busy_timeout_ms)
                .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn, config.slow_sql_ms);

        Ok(Self::from_connection(conn, config))
    }

    /// 用已初始化的连接组装状态
    pub fn from_connection(conn: Connection, config: &AppConfig) -> Self {
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // Repository 层
        // ==========================================
        let query_repo = Arc::new(QueryRepository::new(conn.clone()));
        let prediction_repo = Arc::new(PredictionRepository::new(conn.clone()));
        let run_repo = Arc::new(ScoringRunRepository::new(conn.clone()));
        let dataset_repo = Arc::new(DatasetRepository::new(conn));

        // ==========================================
        // 模型槽位与流水线
        // ==========================================
        let slot = Arc::new(ModelSlot::new(Classifier::with_defaults(
            config.default_model,
            config.seed,
        )));
        let registry = Arc::new(ModelRegistry::new(config.seed, slot.clone()));
        let pipeline = Arc::new(ScoringPipeline::new(
            query_repo,
            prediction_repo.clone(),
            run_repo.clone(),
            slot,
        ));

        // ==========================================
        // API 层
        // ==========================================
        let model_api = Arc::new(ModelApi::new(registry, pipeline.clone()));
        let tracking_api = Arc::new(TrackingApi::new(run_repo, prediction_repo));

        tracing::info!(
            model = %config.default_model,
            seed = config.seed,
            "AppState初始化完成"
        );

        Self {
            db_path: config.db_path.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            model_api,
            tracking_api,
            dataset_repo,
            pipeline,
        }
    }
}
