//! 类型化字段更新描述（UpdateDoc）
//!
//! 以封闭的操作集合（set/inc/unset/current_date）描述部分更新，
//! 替代开放式的动态更新对象；存储后端据此原子地修改单个文档。
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PersistError, PersistResult};
use crate::filter::timestamp;

/// 单个字段更新操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldUpdate {
    /// 设置字段为给定值
    Set { field: String, value: Value },
    /// 按增量调整数值字段（缺失字段视为 0）
    Inc { field: String, delta: i64 },
    /// 移除字段
    Unset { field: String },
    /// 设置字段为服务端当前时间
    SetCurrentDate { field: String },
}

impl FieldUpdate {
    /// 操作目标字段名
    pub fn field(&self) -> &str {
        match self {
            FieldUpdate::Set { field, .. }
            | FieldUpdate::Inc { field, .. }
            | FieldUpdate::Unset { field }
            | FieldUpdate::SetCurrentDate { field } => field,
        }
    }
}

/// 一次部分更新的操作集合
///
/// 操作按加入顺序应用于同一文档；整组操作由存储后端保证原子性。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDoc {
    ops: Vec<FieldUpdate>,
}

impl UpdateDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(FieldUpdate::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn inc(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.ops.push(FieldUpdate::Inc {
            field: field.into(),
            delta,
        });
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push(FieldUpdate::Unset {
            field: field.into(),
        });
        self
    }

    pub fn current_date(mut self, field: impl Into<String>) -> Self {
        self.ops.push(FieldUpdate::SetCurrentDate {
            field: field.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[FieldUpdate] {
        &self.ops
    }

    /// 是否触碰了给定字段
    pub fn touches(&self, field: &str) -> bool {
        self.ops.iter().any(|op| op.field() == field)
    }

    /// 将整组操作应用到文档上（`now` 为本次更新的统一时间）
    ///
    /// `Inc` 仅接受整数（或缺失/Null，视为 0）的目标字段，其余类型报
    /// `InvalidArgument`，避免误写字段名时静默清零计数器；加法饱和。
    pub fn apply(&self, doc: &mut Value, now: DateTime<Utc>) -> PersistResult<()> {
        let Some(map) = doc.as_object_mut() else {
            return Ok(());
        };
        for op in &self.ops {
            match op {
                FieldUpdate::Set { field, value } => {
                    map.insert(field.clone(), value.clone());
                }
                FieldUpdate::Inc { field, delta } => {
                    let current = match map.get(field) {
                        None | Some(Value::Null) => 0,
                        Some(value) => value.as_i64().ok_or_else(|| {
                            PersistError::InvalidArgument {
                                reason: format!(
                                    "cannot increment non-integer field '{field}'"
                                ),
                            }
                        })?,
                    };
                    map.insert(field.clone(), Value::from(current.saturating_add(*delta)));
                }
                FieldUpdate::Unset { field } => {
                    map.remove(field);
                }
                FieldUpdate::SetCurrentDate { field } => {
                    map.insert(field.clone(), timestamp(now));
                }
            }
        }
        Ok(())
    }
}
