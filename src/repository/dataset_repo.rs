// ==========================================
// 实验跟踪流水线 - 数据集/样本/标签仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 用途: 导入工具与测试夹具写入分区数据
// ==========================================

use crate::domain::dataset::{Dataset, Sample, Target};
use crate::domain::types::FEATURE_COLUMNS;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// DatasetRepository - 分区数据仓储
// ==========================================
pub struct DatasetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DatasetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 批量插入标签
    pub fn insert_targets(&self, targets: &[Target]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let count = insert_targets_tx(&tx, targets)?;
        tx.commit()?;
        Ok(count)
    }

    /// 同一事务内写入数据集、样本与标签
    ///
    /// 任一行失败则整批回滚
    pub fn insert_partition_batch(
        &self,
        datasets: &[Dataset],
        samples: &[Sample],
        targets: &[Target],
    ) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        for dataset in datasets {
            tx.execute(
                r#"
                INSERT INTO datasets (dataset_id, name) VALUES (?1, ?2)
                ON CONFLICT(dataset_id) DO UPDATE SET name = excluded.name
                "#,
                params![dataset.dataset_id, dataset.name],
            )?;
        }
        let sample_count = insert_samples_tx(&tx, samples)?;
        let target_count = insert_targets_tx(&tx, targets)?;

        tx.commit()?;
        tracing::info!(
            datasets = datasets.len(),
            samples = sample_count,
            targets = target_count,
            "分区数据写入完成"
        );
        Ok((sample_count, target_count))
    }

    /// 删除数据集 (样本/标签/预测按外键级联删除)
    pub fn delete_dataset(&self, dataset_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM datasets WHERE dataset_id = ?1", params![dataset_id])?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_all_datasets(&self) -> RepositoryResult<Vec<Dataset>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT dataset_id, name FROM datasets ORDER BY dataset_id ASC")?;
        let datasets = stmt
            .query_map([], |row| {
                Ok(Dataset {
                    dataset_id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(datasets)
    }

    /// 统计某数据集的样本数
    pub fn count_samples(&self, dataset_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM samples WHERE dataset_id = ?1",
            params![dataset_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn insert_samples_tx(tx: &Transaction<'_>, samples: &[Sample]) -> RepositoryResult<usize> {
    let sql = format!(
        "INSERT INTO samples (dataset_id, sample_index, {}) VALUES (?1, ?2, {})",
        FEATURE_COLUMNS.join(", "),
        (3..3 + FEATURE_COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut stmt = tx.prepare(&sql)?;

    for sample in samples {
        let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(2 + FEATURE_COLUMNS.len());
        values.push(sample.dataset_id.into());
        values.push(sample.sample_index.into());
        for feature in sample.features.iter() {
            values.push(match feature {
                Some(v) => (*v).into(),
                None => rusqlite::types::Value::Null,
            });
        }
        stmt.execute(params_from_iter(values))?;
    }
    Ok(samples.len())
}

fn insert_targets_tx(tx: &Transaction<'_>, targets: &[Target]) -> RepositoryResult<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO targets (sample_index, target_index, class) VALUES (?1, ?2, ?3)",
    )?;
    for target in targets {
        stmt.execute(params![target.sample_index, target.target_index, target.class])?;
    }
    Ok(targets.len())
}
