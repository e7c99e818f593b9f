//! 仓库实体
//!
use serde::{Deserialize, Serialize};

use persist_domain::entity::{AuditMeta, Entity, EntityMeta};
use persist_domain::value_object::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryKind {
    Main,
    Equipment,
    Warehouse,
}

/// 仓库实体：玩家的一个独立储物空间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(flatten)]
    pub audit: AuditMeta,

    /// 所属玩家标识
    pub player_id: EntityId,
    pub kind: InventoryKind,
    pub capacity: u32,
    pub used_slots: u32,
}

impl Inventory {
    pub fn new(player_id: EntityId, kind: InventoryKind, capacity: u32) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            player_id,
            kind,
            capacity,
            used_slots: 0,
        }
    }
}

impl Entity for Inventory {
    const TYPE: &'static str = "inventory";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
