//! 存储边界（Store Boundary）
//!
//! 定义持久化核心所消费的文档存储能力集合：按名取集合、带排序/跳过/限制的
//! 过滤查询、单条与批量插入、条件替换与更新、删除、计数、聚合与索引创建。
//! 核心只依赖这些能力，不依赖任何特定存储的查询语言；
//! 具体后端（如内存实现或 MongoDB）由上层提供并注入。
//!
mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::PersistResult;
use crate::filter::Filter;
use crate::update::UpdateDoc;

/// 文档：无模式的 JSON 对象
pub type Document = serde_json::Value;

/// 排序/索引方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Ascending,
    Descending,
}

/// 查询选项（排序、跳过、限制）
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<(String, Order)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(field: impl Into<String>, order: Order) -> Self {
        Self {
            sort: Some((field.into(), order)),
            ..Self::default()
        }
    }
}

/// 索引规格
///
/// `name` 作为幂等创建的标识；`unique` 索引的创建失败必须被上层显式上报。
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct IndexSpec {
    /// 索引名（同名创建视为已存在）
    name: String,
    /// 键与方向（多于一个键即为复合索引）
    keys: Vec<(String, Order)>,
    /// 是否唯一索引
    #[builder(default)]
    unique: bool,
    /// 是否后台构建
    #[builder(default)]
    background: bool,
}

impl IndexSpec {
    /// 单字段升序索引
    pub fn ascending(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::builder()
            .name(format!("{field}_asc"))
            .keys(vec![(field, Order::Ascending)])
            .build()
    }

    /// 单字段降序索引
    pub fn descending(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::builder()
            .name(format!("{field}_desc"))
            .keys(vec![(field, Order::Descending)])
            .build()
    }

    /// 单字段唯一升序索引
    pub fn unique_ascending(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::builder()
            .name(format!("{field}_unique"))
            .keys(vec![(field, Order::Ascending)])
            .unique(true)
            .background(true)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[(String, Order)] {
        &self.keys
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_compound(&self) -> bool {
        self.keys.len() > 1
    }
}

/// 聚合管道阶段（封闭集合）
///
/// 管道不隐式过滤软删除记录，`is_deleted` 条件由管道作者负责。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineStage {
    Match(Filter),
    Sort { field: String, order: Order },
    Skip(u64),
    Limit(u64),
    /// 仅保留列出的字段
    Project(Vec<String>),
    /// 输出单个 `{ <field>: <count> }` 文档
    Count(String),
}

/// 文档存储句柄
pub trait DocumentStore: Send + Sync {
    /// 数据库名
    fn database_name(&self) -> &str;

    /// 按名获取（必要时创建）集合句柄
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;
}

/// 单个集合上的操作能力
///
/// 所有写操作在单文档（或单批量）级别独立原子；取消以丢弃 future 表达，
/// 不会留下半完成的打戳。
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// 集合名
    fn name(&self) -> &str;

    async fn find(&self, filter: &Filter, options: FindOptions) -> PersistResult<Vec<Document>>;

    async fn find_one(&self, filter: &Filter) -> PersistResult<Option<Document>>;

    async fn insert_one(&self, doc: Document) -> PersistResult<()>;

    /// 批量插入：全有或全无；无法保证该语义的后端必须整体拒绝
    async fn insert_many(&self, docs: Vec<Document>) -> PersistResult<()>;

    /// 条件替换，返回匹配数（0 或 1）
    async fn replace_one(&self, filter: &Filter, doc: Document) -> PersistResult<u64>;

    /// 条件更新首个匹配文档，返回修改数（0 或 1）
    async fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> PersistResult<u64>;

    /// 条件更新并返回更新后的文档
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> PersistResult<Option<Document>>;

    async fn delete_one(&self, filter: &Filter) -> PersistResult<u64>;

    async fn delete_many(&self, filter: &Filter) -> PersistResult<u64>;

    /// 计数；`limit` 允许在达到上限后短路（存在性检查用 limit=1）
    async fn count(&self, filter: &Filter, limit: Option<u64>) -> PersistResult<u64>;

    async fn aggregate(&self, pipeline: &[PipelineStage]) -> PersistResult<Vec<Document>>;

    /// 幂等创建索引；唯一索引与既有数据冲突时返回错误
    async fn create_index(&self, spec: &IndexSpec) -> PersistResult<()>;
}

#[async_trait]
impl<T> DocumentCollection for Arc<T>
where
    T: DocumentCollection + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> PersistResult<Vec<Document>> {
        (**self).find(filter, options).await
    }

    async fn find_one(&self, filter: &Filter) -> PersistResult<Option<Document>> {
        (**self).find_one(filter).await
    }

    async fn insert_one(&self, doc: Document) -> PersistResult<()> {
        (**self).insert_one(doc).await
    }

    async fn insert_many(&self, docs: Vec<Document>) -> PersistResult<()> {
        (**self).insert_many(docs).await
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> PersistResult<u64> {
        (**self).replace_one(filter, doc).await
    }

    async fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> PersistResult<u64> {
        (**self).update_one(filter, update).await
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> PersistResult<Option<Document>> {
        (**self).find_one_and_update(filter, update).await
    }

    async fn delete_one(&self, filter: &Filter) -> PersistResult<u64> {
        (**self).delete_one(filter).await
    }

    async fn delete_many(&self, filter: &Filter) -> PersistResult<u64> {
        (**self).delete_many(filter).await
    }

    async fn count(&self, filter: &Filter, limit: Option<u64>) -> PersistResult<u64> {
        (**self).count(filter, limit).await
    }

    async fn aggregate(&self, pipeline: &[PipelineStage]) -> PersistResult<Vec<Document>> {
        (**self).aggregate(pipeline).await
    }

    async fn create_index(&self, spec: &IndexSpec) -> PersistResult<()> {
        (**self).create_index(spec).await
    }
}
