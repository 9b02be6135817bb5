// ==========================================
// 实验跟踪流水线 - 通用行记录
// ==========================================
// 用途: Query 层返回的原样行数据 (不做业务转换)
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

// ==========================================
// FieldValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 数值视图: 整数/浮点返回 Some,NULL 与其他类型返回 None
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// 整数视图: 浮点仅在无小数部分时接受
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Integer(v) => JsonValue::from(*v),
            FieldValue::Real(v) => JsonValue::from(*v),
            FieldValue::Text(v) => JsonValue::from(v.clone()),
            FieldValue::Blob(v) => JsonValue::from(v.clone()),
        }
    }
}

// ==========================================
// RecordSet - 结果集 (列名 + 行)
// ==========================================
// 列名已在 Query 层完成去重 (冲突列带表名前缀)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列名 → 下标
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 读取某行某列
    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// 转为 JSON 对象列表 (用于对外输出)
    pub fn to_json_rows(&self) -> Vec<Map<String, JsonValue>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| (c.clone(), v.to_json()))
                    .collect()
            })
            .collect()
    }
}

// ==========================================
// ColumnInfo - 表结构描述 (describe)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}
