// ==========================================
// 实验跟踪流水线 - 预测结果仓储
// ==========================================
// 写入语义: upsert,sample_index 冲突时只更新 class
// 约束: 一批预测在同一事务内提交,失败整体回滚
// ==========================================

use crate::domain::dataset::Prediction;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PredictionRepository - 预测结果仓储
// ==========================================
pub struct PredictionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PredictionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入预测结果
    ///
    /// # 返回
    /// - `Ok(n)`: 本批处理的行数 (插入 + 更新)
    /// - `Err(...)`: 任一行失败,整批回滚
    pub fn upsert_predictions(&self, predictions: &[Prediction]) -> RepositoryResult<usize> {
        if predictions.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO predictions (sample_index, prediction_index, class)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(sample_index) DO UPDATE SET class = excluded.class
                "#,
            )?;
            for p in predictions {
                stmt.execute(params![p.sample_index, p.prediction_index, p.class])?;
            }
        }
        tx.commit()?;

        tracing::debug!(rows = predictions.len(), "预测结果写入完成");
        Ok(predictions.len())
    }

    /// 查询全部预测 (按 sample_index 升序)
    pub fn find_all(&self) -> RepositoryResult<Vec<Prediction>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT prediction_id, sample_index, prediction_index, class
            FROM predictions
            ORDER BY sample_index ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_by_sample_index(&self, sample_index: i64) -> RepositoryResult<Option<Prediction>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT prediction_id, sample_index, prediction_index, class
                FROM predictions
                WHERE sample_index = ?1
                "#,
                params![sample_index],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<Prediction> {
    Ok(Prediction {
        prediction_id: row.get(0)?,
        sample_index: row.get(1)?,
        prediction_index: row.get(2)?,
        class: row.get(3)?,
    })
}
