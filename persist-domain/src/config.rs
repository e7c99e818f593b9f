//! 存储配置
//!
//! 构造期一次性提供的连接串、数据库名与集合名映射；仓储运行期不重载配置。
//!
use serde::{Deserialize, Serialize};

use crate::collection::CollectionMap;

/// 文档库配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接字符串
    pub connection_string: String,
    /// 数据库名称
    pub database: String,
    /// 集合名映射（未声明的类型走小写复数回退）
    pub collections: CollectionMap,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "mongodb://localhost:27017".to_string(),
            database: "gamedata".to_string(),
            collections: CollectionMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 测试缺省值与部分覆盖的反序列化
    #[test]
    fn test_defaults_and_partial_override() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database, "gamedata");

        let config: DatabaseConfig =
            serde_json::from_str(r#"{"database": "staging"}"#).unwrap();
        assert_eq!(config.database, "staging");
        assert_eq!(config.connection_string, "mongodb://localhost:27017");
    }
}
