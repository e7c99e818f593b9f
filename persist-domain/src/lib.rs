//! 文档库持久化基础层（persist-domain）
//!
//! 在无模式文档存储之上提供一套通用的持久化抽象，用于在应用中实现：
//! - 实体建模（`entity`）：统一的标识、时间戳、版本与软删除元数据
//! - 类型化查询谓词（`filter`）与字段更新描述（`update`）
//! - 存储边界（`store`）：能力集合接口与内存后端实现
//! - 集合名解析（`collection`）与索引管理（`index`）
//! - 泛型仓储（`repository`）：乐观锁更新、软删除、偏移分页等全套操作
//!
//! 本 crate 尽量保持与具体存储实现解耦，仅定义能力边界与最小必要的错误
//! 类型；专用仓储（如账号仓储）通过组合 `Repository<T>` 构建，而非继承。
//!
//! 典型用法：
//! 1. 为实体实现 `Entity`（内嵌 `EntityMeta`，必要时加 `AuditMeta`）；
//! 2. 以 `DatabaseConfig` 提供集合名映射，注入一个 `DocumentStore` 后端；
//! 3. `Repository::open` 打开仓储（幂等创建索引），调用操作集合；
//! 4. 启动期检查 `index_report`，唯一索引缺失时上报健康状态。
//!
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod index;
pub mod page;
pub mod repository;
pub mod store;
pub mod update;
pub mod value_object;
