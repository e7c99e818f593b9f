//! 玩家实体
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use persist_domain::entity::{AuditMeta, Entity, EntityMeta};
use persist_domain::value_object::EntityId;

/// 玩家持有的各类货币
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCurrencies {
    pub gold: i64,
    pub diamond: i64,
    pub stamina: i32,
    pub max_stamina: i32,
}

impl Default for PlayerCurrencies {
    fn default() -> Self {
        Self {
            gold: 10_000,
            diamond: 0,
            stamina: 100,
            max_stamina: 100,
        }
    }
}

/// 玩家实体：归属于一个账号的游戏内角色档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(flatten)]
    pub audit: AuditMeta,

    /// 所属账号标识
    pub account_id: EntityId,
    pub nickname: String,
    pub level: u32,
    pub experience: u64,
    pub currencies: PlayerCurrencies,
    pub last_active_at: DateTime<Utc>,
    pub vip_level: u32,
}

impl Player {
    pub fn new(account_id: EntityId, nickname: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            account_id,
            nickname: nickname.into(),
            level: 1,
            experience: 0,
            currencies: PlayerCurrencies::default(),
            last_active_at: Utc::now(),
            vip_level: 0,
        }
    }
}

impl Entity for Player {
    const TYPE: &'static str = "player";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
