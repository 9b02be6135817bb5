// ==========================================
// 实验跟踪流水线 - 通用查询仓储 (Query 层)
// ==========================================
// 红线: Repository 不含业务逻辑,只做语句执行与行映射
// 约束: 标识符只来自 Table 枚举;值一律绑定参数,不做字符串插值
// 约束: 每次调用内获取连接锁与语句,作用域结束即释放 (含错误路径)
// ==========================================


use crate::domain::record::{ColumnInfo, FieldValue, RecordSet};
use crate::domain::types::{Table, PARTITION_COLUMN};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Params, Statement};
use std::sync::{Arc, Mutex};

// ==========================================
// QueryRepository - 通用查询仓储
// ==========================================
pub struct QueryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QueryRepository {
    /// 从共享连接创建仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取整张表 (存储顺序,不保证排序)
    pub fn select_all(&self, table: Table) -> RepositoryResult<RecordSet> {
        let columns: Vec<String> = table.columns().iter().map(|c| c.to_string()).collect();
        let sql = format!(
            "SELECT {} FROM \"{}\"",
            table
                .columns()
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", "),
            table.as_str()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = read_record_set(&mut stmt, columns, [])?;

        tracing::debug!(table = %table, rows = records.len(), "select_all");
        Ok(records)
    }

    /// 联表查询并按分区过滤
    ///
    /// # 参数
    /// - `left` / `right`: 参与 INNER JOIN 的两张表
    /// - `left_col` / `right_col`: 关联列 (`left.left_col = right.right_col`)
    /// - `partition_tag`: 分区标签,过滤拥有 dataset_id 列的一侧
    ///
    /// # 返回
    /// - 两表列按顺序拼接;右表与左表同名的列输出为 `"<right>.<col>"`
    /// - 行按左表关联列升序
    pub fn select_joined_by_condition(
        &self,
        left: Table,
        right: Table,
        left_col: &str,
        right_col: &str,
        partition_tag: i64,
    ) -> RepositoryResult<RecordSet> {
        if left == right {
            return Err(RepositoryError::ValidationError(format!(
                "不支持自关联: {}",
                left
            )));
        }

        let left_key = left.column(left_col).ok_or_else(|| RepositoryError::FieldValueError {
            field: left_col.to_string(),
            message: format!("表 {} 不包含该列", left),
        })?;
        let right_key = right.column(right_col).ok_or_else(|| RepositoryError::FieldValueError {
            field: right_col.to_string(),
            message: format!("表 {} 不包含该列", right),
        })?;

        let partition_owner = if left.has_partition_column() {
            left
        } else if right.has_partition_column() {
            right
        } else {
            return Err(RepositoryError::ValidationError(format!(
                "{} 与 {} 均不包含分区列 {}",
                left, right, PARTITION_COLUMN
            )));
        };

        let (projection, columns) = joined_projection(left, right);
        let sql = format!(
            r#"
            SELECT {projection}
            FROM "{l}"
            JOIN "{r}" ON "{l}"."{lk}" = "{r}"."{rk}"
            WHERE "{owner}"."{pc}" = ?1
            ORDER BY "{l}"."{lk}" ASC
            "#,
            projection = projection,
            l = left.as_str(),
            r = right.as_str(),
            lk = left_key,
            rk = right_key,
            owner = partition_owner.as_str(),
            pc = PARTITION_COLUMN,
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = read_record_set(&mut stmt, columns, params![partition_tag])?;

        tracing::debug!(
            left = %left,
            right = %right,
            partition_tag,
            rows = records.len(),
            "select_joined_by_condition"
        );
        Ok(records)
    }

    /// 清空表,返回删除行数 (外键级联同样生效)
    pub fn delete_all(&self, table: Table) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(&format!("DELETE FROM \"{}\"", table.as_str()), [])?;
        tracing::info!(table = %table, rows, "delete_all");
        Ok(rows)
    }

    /// 描述表结构
    pub fn describe(&self, table: Table) -> RepositoryResult<Vec<ColumnInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT cid, name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid ASC
            "#,
        )?;

        let columns = stmt
            .query_map(params![table.as_str()], |row| {
                Ok(ColumnInfo {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? > 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(RepositoryError::NotFound {
                entity: "table".to_string(),
                id: table.as_str().to_string(),
            });
        }
        Ok(columns)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 生成联表投影与输出列名
fn joined_projection(left: Table, right: Table) -> (String, Vec<String>) {
    let mut select = Vec::new();
    let mut names = Vec::new();

    for col in left.columns() {
        select.push(format!("\"{}\".\"{}\"", left.as_str(), col));
        names.push(col.to_string());
    }
    for col in right.columns() {
        let output = if left.column(col).is_some() {
            format!("{}.{}", right.as_str(), col)
        } else {
            col.to_string()
        };
        select.push(format!("\"{}\".\"{}\"", right.as_str(), col));
        names.push(output);
    }

    (select.join(", "), names)
}

/// 执行语句并按列顺序读取全部行
fn read_record_set<P: Params>(
    stmt: &mut Statement<'_>,
    columns: Vec<String>,
    params: P,
) -> RepositoryResult<RecordSet> {
    let width = columns.len();
    let mut records = RecordSet::new(columns);
    let mut rows = stmt.query(params)?;

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(field_value(row.get_ref(i)?));
        }
        records.rows.push(values);
    }

    Ok(records)
}

fn field_value(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(v) => FieldValue::Integer(v),
        ValueRef::Real(v) => FieldValue::Real(v),
        ValueRef::Text(v) => FieldValue::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => FieldValue::Blob(v.to_vec()),
    }
}
