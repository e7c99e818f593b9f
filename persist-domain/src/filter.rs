//! 类型化查询谓词（Filter）
//!
//! 以封闭的算子集合描述对实体字段的布尔过滤条件，替代开放式的表达式树：
//! 存储后端要么将其翻译为自身的查询语言，要么直接用 `matches` 在文档上求值。
//! 比较是类型感知的：数值跨宽度比较，RFC 3339 字符串按时间点比较。
//!
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 将 UTC 时间转换为文档值（RFC 3339 字符串）
///
/// 与 chrono 的 serde 序列化互认：求值时两侧都按时间点解析比较，
/// 因此小数位精度差异不影响排序与等值判断。
pub fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}

/// 查询谓词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// 恒真（匹配所有文档）
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    /// 字段值属于给定集合
    In(String, Vec<Value>),
    /// 字段是否存在于文档中
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(field.into(), value.into())
    }

    pub fn r#in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::In(field.into(), values.into_iter().collect())
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Self::Exists(field.into(), exists)
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// 在单个文档上求值
    ///
    /// 缺失字段按 `Null` 参与比较（`Exists` 除外）。
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => value_eq(field_of(doc, field), value),
            Filter::Ne(field, value) => !value_eq(field_of(doc, field), value),
            Filter::Gt(field, value) => {
                value_cmp(field_of(doc, field), value) == Some(Ordering::Greater)
            }
            Filter::Gte(field, value) => matches!(
                value_cmp(field_of(doc, field), value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(field, value) => {
                value_cmp(field_of(doc, field), value) == Some(Ordering::Less)
            }
            Filter::Lte(field, value) => matches!(
                value_cmp(field_of(doc, field), value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::In(field, values) => {
                let actual = field_of(doc, field);
                values.iter().any(|v| value_eq(actual, v))
            }
            Filter::Exists(field, exists) => doc.get(field).is_some() == *exists,
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::Not(filter) => !filter.matches(doc),
        }
    }
}

fn field_of<'a>(doc: &'a Value, field: &str) -> &'a Value {
    doc.get(field).unwrap_or(&Value::Null)
}

/// 类型感知的值比较
///
/// - 数值按 f64 比较（跨整型/浮点宽度）；
/// - 两侧均可解析为 RFC 3339 的字符串按时间点比较，否则按字典序；
/// - 类型不同或不可比时返回 `None`。
pub(crate) fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

pub(crate) fn value_eq(a: &Value, b: &Value) -> bool {
    value_cmp(a, b) == Some(Ordering::Equal)
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
