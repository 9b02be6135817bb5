// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态与分区数据夹具
// ==========================================

#![allow(dead_code)]

use ml_tracking::app::AppState;
use ml_tracking::config::AppConfig;
use ml_tracking::domain::{Dataset, Partition, Sample, Target};
use ml_tracking::repository::DatasetRepository;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 一行夹具数据: (分区标签, sample_index, 特征, 标签)
pub type FixtureRow = (i64, i64, Vec<f64>, Option<i64>);

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_test_connection(&db_path)?;
    ml_tracking::db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接 (外键 + busy_timeout)
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(ml_tracking::db::open_sqlite_connection(db_path)?)
}

/// 指向测试数据库的配置
pub fn test_config(db_path: &str) -> AppConfig {
    AppConfig {
        db_path: db_path.to_string(),
        ..AppConfig::default()
    }
}

/// 基于测试数据库创建应用状态
pub fn create_test_state(db_path: &str) -> Result<Arc<AppState>, Box<dyn Error>> {
    let state = AppState::new(&test_config(db_path))?;
    Ok(Arc::new(state))
}

/// 写入三个分区数据集及样本/标签
pub fn seed_rows(db_path: &str, rows: &[FixtureRow]) -> Result<(), Box<dyn Error>> {
    let conn = open_test_connection(db_path)?;
    let repo = DatasetRepository::new(Arc::new(Mutex::new(conn)));

    let datasets: Vec<Dataset> = Partition::ALL.iter().map(|p| Dataset::for_partition(*p)).collect();
    let samples: Vec<Sample> = rows
        .iter()
        .map(|(tag, index, features, _)| {
            let values: Vec<Option<f64>> = features.iter().map(|v| Some(*v)).collect();
            Sample::new(*tag, *index, &values)
        })
        .collect();
    let targets: Vec<Target> = rows
        .iter()
        .map(|(_, index, _, class)| Target::for_sample(*index, *class))
        .collect();

    repo.insert_partition_batch(&datasets, &samples, &targets)?;
    Ok(())
}

/// 线性可分的 4 行训练分区: 标签等于 feature_1
pub fn exact_fit_rows() -> Vec<FixtureRow> {
    vec![
        (1, 1, vec![0.0, 0.0], Some(0)),
        (1, 2, vec![1.0, 1.0], Some(1)),
        (1, 3, vec![0.0, 1.0], Some(0)),
        (1, 4, vec![1.0, 0.0], Some(1)),
    ]
}

/// 三个分区都有数据的夹具
pub fn three_partition_rows() -> Vec<FixtureRow> {
    let mut rows = exact_fit_rows();
    rows.extend([
        (2, 11, vec![0.1, 0.9], Some(0)),
        (2, 12, vec![0.9, 0.2], Some(1)),
        (3, 21, vec![0.2, 0.1], None),
        (3, 22, vec![0.8, 0.7], None),
    ]);
    rows
}

/// 统计表行数
pub fn count_rows(db_path: &str, table: &str) -> Result<i64, Box<dyn Error>> {
    let conn = open_test_connection(db_path)?;
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
    Ok(n)
}
