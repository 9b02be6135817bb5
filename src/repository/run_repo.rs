// ==========================================
// 实验跟踪流水线 - 评分运行记录仓储
// ==========================================
// 红线: 只追加,不修改历史记录
// ==========================================

use crate::domain::run::ScoringRun;
use crate::domain::types::Partition;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ==========================================
// ScoringRunRepository - 评分运行仓储
// ==========================================
pub struct ScoringRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScoringRunRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加一条运行记录
    pub fn insert(&self, run: &ScoringRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO scoring_runs (
                run_id, partition_name, model_name, artifact_version,
                sample_count, score, started_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.run_id,
                run.partition.as_str(),
                run.model_name,
                run.artifact_version.map(|v| v as i64),
                run.sample_count as i64,
                run.score,
                run.started_at.format(TS_FORMAT).to_string(),
                run.finished_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 最近的运行记录 (按结束时间倒序)
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ScoringRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, partition_name, model_name, artifact_version,
                   sample_count, score, started_at, finished_at
            FROM scoring_runs
            ORDER BY finished_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let runs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<ScoringRun>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"
                SELECT run_id, partition_name, model_name, artifact_version,
                       sample_count, score, started_at, finished_at
                FROM scoring_runs
                WHERE run_id = ?1
                "#,
                params![run_id],
                map_row,
            )
            .optional()?;
        Ok(run)
    }
}

fn parse_ts(idx: usize, raw: String) -> SqliteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_row(row: &Row<'_>) -> SqliteResult<ScoringRun> {
    let partition_raw: String = row.get(1)?;
    let partition = Partition::parse(&partition_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("未知分区: {}", partition_raw).into(),
        )
    })?;

    Ok(ScoringRun {
        run_id: row.get(0)?,
        partition,
        model_name: row.get(2)?,
        artifact_version: row.get::<_, Option<i64>>(3)?.map(|v| v as u64),
        sample_count: row.get::<_, i64>(4)? as usize,
        score: row.get(5)?,
        started_at: parse_ts(6, row.get(6)?)?,
        finished_at: parse_ts(7, row.get(7)?)?,
    })
}
