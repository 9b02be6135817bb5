// ==========================================
// 分区数据导入工具
// ==========================================
// 用途: 把 CSV (dataset_id,sample_index,feature_1..feature_13,class)
//       一次性写入 datasets / samples / targets
//
// Usage:
//   cargo run --bin import_dataset -- <csv> [db_path]
//
// db_path 缺省时取 ML_TRACKING_DB_PATH 或默认数据目录
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use ml_tracking::config::AppConfig;
use ml_tracking::importer::DatasetImporter;
use ml_tracking::repository::DatasetRepository;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(csv_path) = args.next().map(PathBuf::from) else {
        bail!("Usage: import_dataset <csv> [db_path]");
    };

    let config = AppConfig::from_env().context("加载配置失败")?;
    ml_tracking::logging::init(config.debug, config.log_json);

    let db_path = args.next().unwrap_or_else(|| config.db_path.clone());
    let conn = ml_tracking::db::open_sqlite_connection_with_timeout(&db_path, config.busy_timeout_ms)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    ml_tracking::db::ensure_schema(&conn).context("建表失败")?;

    let repo = Arc::new(DatasetRepository::new(Arc::new(Mutex::new(conn))));
    let summary = DatasetImporter::new(repo)
        .import_file(&csv_path)
        .with_context(|| format!("导入失败: {}", csv_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
