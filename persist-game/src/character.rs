//! 角色实体
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use persist_domain::entity::{AuditMeta, Entity, EntityMeta};
use persist_domain::value_object::EntityId;

/// 角色稀有度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterRarity {
    R,
    Sr,
    Ssr,
}

/// 角色实体：玩家持有的一个可养成单位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(flatten)]
    pub audit: AuditMeta,

    /// 所属玩家标识
    pub player_id: EntityId,
    /// 图鉴编号
    pub character_id: u32,
    pub level: u32,
    pub experience: u64,
    pub rarity: CharacterRarity,
    /// 突破阶段
    pub breakthrough: u8,
    /// 是否为主战角色
    pub is_main: bool,
    pub obtained_at: DateTime<Utc>,
}

impl Character {
    pub fn new(player_id: EntityId, character_id: u32, rarity: CharacterRarity) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            player_id,
            character_id,
            level: 1,
            experience: 0,
            rarity,
            breakthrough: 0,
            is_main: false,
            obtained_at: Utc::now(),
        }
    }
}

impl Entity for Character {
    const TYPE: &'static str = "character";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
