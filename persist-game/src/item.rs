//! 物品实体
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use persist_domain::entity::{AuditMeta, Entity, EntityMeta};
use persist_domain::value_object::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Material,
    Consumable,
    Equipment,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// 物品实体：玩家背包中的一条堆叠记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(flatten)]
    pub audit: AuditMeta,

    /// 所属玩家标识
    pub player_id: EntityId,
    /// 图鉴编号
    pub item_id: u32,
    pub quantity: u64,
    pub kind: ItemKind,
    pub rarity: ItemRarity,
    pub enhance_level: u8,
    pub obtained_at: DateTime<Utc>,
    /// 过期时间（限时物品）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(player_id: EntityId, item_id: u32, kind: ItemKind) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            player_id,
            item_id,
            quantity: 1,
            kind,
            rarity: ItemRarity::Common,
            enhance_level: 0,
            obtained_at: Utc::now(),
            expires_at: None,
        }
    }

    /// 是否已过期（无过期时间视为永久有效）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl Entity for Item {
    const TYPE: &'static str = "item";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // 测试过期判定
    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let mut item = Item::new(EntityId::generate(), 42, ItemKind::Consumable);
        assert!(!item.is_expired(now));

        item.expires_at = Some(now - Duration::hours(1));
        assert!(item.is_expired(now));

        item.expires_at = Some(now + Duration::hours(1));
        assert!(!item.is_expired(now));
    }
}
