//! 游戏域实体与专用仓储（persist-game）
//!
//! 基于 `persist-domain` 的泛型仓储为游戏后端定义实体集合：
//! - 账号（`account`）与账号仓储（`account_repository`）：唯一用户名/邮箱、
//!   登录统计、失败计数与锁定操作
//! - 玩家（`player`）、角色（`character`）、物品（`item`）、仓库（`inventory`）
//!
//! 战斗、抽卡等玩法服务作为外部协作方，通过这里的仓储契约读写实体；
//! 跨实体的业务流程由协作方编排，本层不提供跨仓储事务。
//!
pub mod account;
pub mod account_repository;
pub mod character;
pub mod inventory;
pub mod item;
pub mod player;

use persist_domain::collection::CollectionMap;

/// 游戏域的缺省集合名映射
///
/// 仅声明不规则复数；其余类型走小写复数回退
/// （account → accounts、player → players 等）。
pub fn default_collections() -> CollectionMap {
    CollectionMap::new().with("inventory", "inventories")
}

#[cfg(test)]
mod tests {
    use super::*;
    use persist_domain::entity::Entity;

    use crate::account::Account;
    use crate::character::Character;
    use crate::inventory::Inventory;
    use crate::item::Item;
    use crate::player::Player;

    // 测试全部实体类型的集合名解析
    #[test]
    fn test_collection_names() {
        let map = default_collections();
        assert_eq!(map.resolve_type(Account::TYPE), "accounts");
        assert_eq!(map.resolve_type(Player::TYPE), "players");
        assert_eq!(map.resolve_type(Character::TYPE), "characters");
        assert_eq!(map.resolve_type(Item::TYPE), "items");
        assert_eq!(map.resolve_type(Inventory::TYPE), "inventories");
    }
}
