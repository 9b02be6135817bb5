// ==========================================
// 实验跟踪流水线 - 运行耗时与慢 SQL
// ==========================================
// PerfGuard: 一次评分运行的耗时与语句数 (按线程计数,SQL 在调用线程上同步执行)
// install_sqlite_tracing: 连接级 profile 回调,阈值来自 AppConfig.slow_sql_ms
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 慢 SQL 阈值 (毫秒),0 表示只计数不告警
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static STATEMENTS: Cell<u64> = Cell::new(0);
    static SLOW_STATEMENTS: Cell<u64> = Cell::new(0);
}

/// 在共享连接上安装语句统计
///
/// `slow_sql_ms = 0` 时关闭慢 SQL 告警
pub fn install_sqlite_tracing(conn: &mut Connection, slow_sql_ms: u64) {
    SLOW_SQL_MS.store(slow_sql_ms, Ordering::Relaxed);
    conn.profile(Some(on_statement));
    tracing::debug!(slow_sql_ms, "SQLite 语句统计已安装");
}

fn on_statement(sql: &str, duration: Duration) {
    STATEMENTS.with(|c| c.set(c.get().saturating_add(1)));

    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let ms = duration.as_millis() as u64;
    if threshold > 0 && ms >= threshold {
        SLOW_STATEMENTS.with(|c| c.set(c.get().saturating_add(1)));
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %compact_sql(sql, 240),
            "slow sql"
        );
    }
}

/// 折叠空白并截断,便于单行日志
fn compact_sql(sql: &str, max_chars: usize) -> String {
    let s = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s,
    }
}

// ==========================================
// PerfGuard
// ==========================================
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    statements_at_start: u64,
    slow_at_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
            statements_at_start: STATEMENTS.with(|c| c.get()),
            slow_at_start: SLOW_STATEMENTS.with(|c| c.get()),
        }
    }

    /// 本 guard 创建以来当前线程执行的语句数
    pub fn statements(&self) -> u64 {
        STATEMENTS
            .with(|c| c.get())
            .saturating_sub(self.statements_at_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let slow = SLOW_STATEMENTS
            .with(|c| c.get())
            .saturating_sub(self.slow_at_start);
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            statements = self.statements(),
            slow_statements = slow,
            "done"
        );
    }
}
