//! 集合名解析（Collection Resolver）
//!
//! 以显式声明的映射表将实体类型解析为物理集合名，
//! 无映射时回退为类型名的小写复数形式；纯函数、无副作用。
//!
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// 实体类型到集合名的映射
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionMap {
    #[serde(default)]
    overrides: HashMap<String, String>,
}

impl CollectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个实体类型声明集合名
    pub fn with(mut self, entity_type: impl Into<String>, collection: impl Into<String>) -> Self {
        self.overrides.insert(entity_type.into(), collection.into());
        self
    }

    /// 解析实体类型对应的集合名
    pub fn resolve<T: Entity>(&self) -> String {
        self.resolve_type(T::TYPE)
    }

    /// 按类型名解析：先查声明映射，否则小写复数回退
    pub fn resolve_type(&self, entity_type: &str) -> String {
        self.overrides
            .get(entity_type)
            .cloned()
            .unwrap_or_else(|| format!("{}s", entity_type.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 测试回退规则与显式映射
    #[test]
    fn test_resolution_order() {
        let map = CollectionMap::new().with("inventory", "inventories");
        assert_eq!(map.resolve_type("account"), "accounts");
        assert_eq!(map.resolve_type("Item"), "items");
        assert_eq!(map.resolve_type("inventory"), "inventories");
    }

    // 测试映射可由配置反序列化
    #[test]
    fn test_deserialize() {
        let map: CollectionMap =
            serde_json::from_str(r#"{"overrides":{"character":"roster"}}"#).unwrap();
        assert_eq!(map.resolve_type("character"), "roster");
    }
}
