//! 持久化层统一错误定义
//!
//! 聚焦序列化、参数校验、存储与索引等最小必要集合，
//! 便于在各实现层统一转换为 `PersistError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
///
/// 读操作的未命中以空结果表达（`Option`/`false`），不属于错误；
/// 乐观锁失败与唯一键冲突各自独立成员，便于调用方区分处理。
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PersistError {
    // --- 序列化/参数 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // --- 存储 ---
    #[error("duplicate key: collection={collection}, index={index}")]
    DuplicateKey { collection: String, index: String },
    #[error("version conflict: entity={entity_type}, id={id}, expected={expected}")]
    VersionConflict {
        entity_type: &'static str,
        id: String,
        expected: u64,
    },
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("query error: {reason}")]
    Query { reason: String },

    // --- 索引 ---
    #[error("index provisioning failed: collection={collection}, index={index}, reason={reason}")]
    Index {
        collection: String,
        index: String,
        reason: String,
    },
}

/// 统一 Result 类型别名
pub type PersistResult<T> = Result<T, PersistError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 mongodb 驱动错误转换为 PersistError

#[cfg(feature = "infra-mongo")]
impl From<mongodb::error::Error> for PersistError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = &*err.kind {
            // 11000: duplicate key
            if write_error.code == 11000 {
                return PersistError::DuplicateKey {
                    collection: "unknown".to_string(),
                    index: write_error.message.clone(),
                };
            }
        }

        PersistError::Unavailable {
            reason: err.to_string(),
        }
    }
}
