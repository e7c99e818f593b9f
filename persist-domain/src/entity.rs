//! 实体（Entity）基础抽象
//!
//! 为所有被持久化的记录提供统一的标识、时间戳、版本（optimistic locking）
//! 与软删除能力。仓储独占 `EntityMeta` 中字段的写路径：创建与更新时一律
//! 覆盖调用方提供的时间戳与版本，以维持不变量。
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::value_object::{EntityId, Version};

/// 文档中由仓储负责维护的字段名
pub mod fields {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const VERSION: &str = "version";
    pub const IS_DELETED: &str = "is_deleted";
    pub const DELETED_AT: &str = "deleted_at";
    pub const CREATED_BY: &str = "created_by";
    pub const UPDATED_BY: &str = "updated_by";
    pub const DELETED_BY: &str = "deleted_by";

    /// 仓储独占写路径的字段，部分更新不允许调用方触碰
    pub const OWNED: [&str; 6] = [ID, CREATED_AT, UPDATED_AT, VERSION, IS_DELETED, DELETED_AT];
}

/// 实体公共元数据
///
/// 通过 `#[serde(flatten)]` 内嵌到具体实体中，使文档保持扁平结构。
///
/// 不变量：
/// - `is_deleted == true` 当且仅当 `deleted_at` 非空；
/// - `version` 随每次被接受的变更严格加 1。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMeta {
    /// 实体标识，创建时生成，此后不可变
    pub id: EntityId,
    /// 创建时间（UTC），仅设置一次
    pub created_at: DateTime<Utc>,
    /// 更新时间（UTC），每次变更刷新
    pub updated_at: DateTime<Utc>,
    /// 版本号（乐观锁令牌）
    pub version: Version,
    /// 软删除标记
    pub is_deleted: bool,
    /// 删除时间，仅在软删除时设置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityMeta {
    /// 创建一份新的元数据：生成标识，版本为初始值，未删除
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// 落库前的创建打戳：覆盖调用方提供的时间戳与版本
    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
        self.version = Version::initial();
        self.is_deleted = false;
        self.deleted_at = None;
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// 审计元数据
///
/// 记录执行创建/更新/删除的主体，由调用方填充；仓储不推断身份。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditMeta {
    /// 创建者标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// 更新者标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// 删除者标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

/// 可持久化实体抽象
///
/// 以能力集合（标识 + 时间戳 + 版本 + 软删除标记）约束实体，而非基类继承；
/// 专用仓储通过组合泛型仓储来复用这些能力。
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 实体类型名，用于集合名解析与错误上下文
    const TYPE: &'static str;

    /// 是否支持审计归属（软删除时允许写入 `deleted_by`）
    const AUDITABLE: bool = false;

    /// 获取公共元数据
    fn meta(&self) -> &EntityMeta;

    /// 获取可变公共元数据（仅供仓储打戳使用）
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// 获取实体标识
    fn id(&self) -> &EntityId {
        &self.meta().id
    }

    /// 获取当前版本（用于乐观锁与并发控制）
    fn version(&self) -> Version {
        self.meta().version
    }

    /// 是否已被软删除
    fn is_deleted(&self) -> bool {
        self.meta().is_deleted
    }
}
