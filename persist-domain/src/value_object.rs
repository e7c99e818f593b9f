//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PersistError;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 版本号（用于乐观锁和并发控制）
///
/// 实体首次落库时版本号为 1，之后每次被接受的变更严格加 1。
///
/// # 示例
///
/// ```
/// use persist_domain::value_object::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.value(), 1);
/// assert!(v1.is_initial());
///
/// let v2 = v1.next();
/// assert_eq!(v2.value(), 2);
/// assert!(v2 > v1);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// 创建初始版本（版本号为 1，对应实体首次持久化）
    pub const fn initial() -> Self {
        Self(1)
    }

    /// 从值创建版本号
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// 获取下一个版本号
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// 获取版本号的值
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// 检查是否为初始版本
    pub fn is_initial(&self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl ValueObject for Version {
    type Error = PersistError;

    fn validate(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// 实体标识
///
/// 不透明的唯一标识符，创建后不可变更；默认由 UUID v4 生成。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityId(String);

impl EntityId {
    /// 生成一个新的随机标识
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// 从已有字符串创建标识（不做格式假设）
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 获取标识的字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.to_string());
        id.validate()?;
        Ok(id)
    }
}

impl From<&EntityId> for serde_json::Value {
    fn from(id: &EntityId) -> Self {
        serde_json::Value::String(id.0.clone())
    }
}

impl ValueObject for EntityId {
    type Error = PersistError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.0.is_empty() {
            return Err(PersistError::InvalidArgument {
                reason: "entity id must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 测试初始版本与递增
    #[test]
    fn test_version_initial_and_next() {
        let v = Version::initial();
        assert_eq!(v.value(), 1);
        assert!(v.is_initial());

        let v2 = v.next();
        assert_eq!(v2.value(), 2);
        assert!(!v2.is_initial());
        assert!(v2 > v);
    }

    // 测试版本号序列化为裸数值
    #[test]
    fn test_version_serde() {
        let v = Version::from_value(42);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "42");

        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    // 测试标识生成唯一且非空
    #[test]
    fn test_entity_id_generate() {
        let a = EntityId::generate();
        let b = EntityId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }

    // 测试空标识校验失败
    #[test]
    fn test_entity_id_validate_empty() {
        let err = "".parse::<EntityId>().unwrap_err();
        match err {
            PersistError::InvalidArgument { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
