//! 泛型仓储（Repository）
//!
//! 与实体类型无关的全部持久化操作：过滤查询、分页、创建、乐观锁整体更新、
//! 字段级部分更新、软删除、物理删除、存在性检查、计数与聚合。
//! 除物理删除与聚合外，所有操作默认在调用方过滤条件上追加
//! `is_deleted == false`。
//!
//! 并发正确性委托给版本条件写（compare-and-swap on `(id, version)`）与
//! 存储侧的原子更新原语；仓储自身无进程内锁，也从不内部重试。
//!
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::collection::CollectionMap;
use crate::entity::{Entity, fields};
use crate::error::{PersistError, PersistResult};
use crate::filter::Filter;
use crate::index::{IndexReport, base_indexes, ensure_indexes};
use crate::page::PagedResult;
use crate::store::{
    Document, DocumentCollection, DocumentStore, FindOptions, IndexSpec, Order, PipelineStage,
};
use crate::update::UpdateDoc;
use crate::value_object::EntityId;

/// 面向单一实体类型的仓储
///
/// 无状态（仅持有集合句柄），可被多个调用方并发使用；
/// 取消以丢弃 future 表达，单文档/单批量操作不会留下半完成的写入。
pub struct Repository<T: Entity> {
    collection: Arc<dyn DocumentCollection>,
    index_report: IndexReport,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    /// 打开仓储：解析集合名并幂等创建基础索引与实体专用索引
    ///
    /// 索引创建失败不阻塞仓储使用；唯一索引的失败记录在 `index_report`
    /// 中，应在启动期检查并上报。
    pub async fn open(
        store: &dyn DocumentStore,
        collections: &CollectionMap,
        extra_indexes: Vec<IndexSpec>,
    ) -> PersistResult<Self> {
        let name = collections.resolve::<T>();
        let collection = store.collection(&name);

        let mut specs = base_indexes();
        specs.extend(extra_indexes);
        let index_report = ensure_indexes(&collection, &specs).await;

        debug!(
            entity = T::TYPE,
            collection = name,
            provisioned = index_report.provisioned().len(),
            degraded = index_report.is_degraded(),
            "repository opened"
        );

        Ok(Self {
            collection,
            index_report,
            _entity: PhantomData,
        })
    }

    /// 集合名
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// 打开时的索引创建结果
    pub fn index_report(&self) -> &IndexReport {
        &self.index_report
    }

    /// 在调用方过滤条件上追加未删除约束
    fn scoped(filter: Option<Filter>) -> Filter {
        let visible = Filter::eq(fields::IS_DELETED, false);
        match filter {
            Some(filter) => Filter::and([visible, filter]),
            None => visible,
        }
    }

    fn id_filter(id: &EntityId) -> Filter {
        Filter::eq(fields::ID, id)
    }

    fn encode(entity: &T) -> PersistResult<Document> {
        Ok(serde_json::to_value(entity)?)
    }

    fn decode(doc: Document) -> PersistResult<T> {
        Ok(serde_json::from_value(doc)?)
    }

    /// 仓储独占的打戳操作：刷新 `updated_at` 并把版本加 1
    fn stamp(update: UpdateDoc) -> UpdateDoc {
        update.current_date(fields::UPDATED_AT).inc(fields::VERSION, 1)
    }

    /// 按标识获取未删除实体；未命中返回 `None`，不是错误
    pub async fn get_by_id(&self, id: &EntityId) -> PersistResult<Option<T>> {
        let filter = Self::scoped(Some(Self::id_filter(id)));
        let found = self.collection.find_one(&filter).await?;
        debug!(entity = T::TYPE, %id, found = found.is_some(), "get_by_id");
        found.map(Self::decode).transpose()
    }

    /// 获取所有未删除实体（存储缺省顺序）
    pub async fn get_all(&self) -> PersistResult<Vec<T>> {
        self.find(Filter::All).await
    }

    /// 过滤查询（存储缺省顺序）
    pub async fn find(&self, filter: Filter) -> PersistResult<Vec<T>> {
        self.find_with_options(filter, FindOptions::default()).await
    }

    /// 带排序/跳过/限制的过滤查询
    pub async fn find_with_options(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> PersistResult<Vec<T>> {
        let docs = self
            .collection
            .find(&Self::scoped(Some(filter)), options)
            .await?;
        debug!(entity = T::TYPE, count = docs.len(), "find");
        docs.into_iter().map(Self::decode).collect()
    }

    /// 过滤查询首个匹配（存储缺省顺序）
    pub async fn find_one(&self, filter: Filter) -> PersistResult<Option<T>> {
        let found = self
            .collection
            .find_one(&Self::scoped(Some(filter)))
            .await?;
        debug!(entity = T::TYPE, found = found.is_some(), "find_one");
        found.map(Self::decode).transpose()
    }

    /// 分页查询：按 `created_at` 降序，越界页返回空条目与一致的计数
    pub async fn get_paged(
        &self,
        filter: Option<Filter>,
        page_index: u64,
        page_size: u64,
    ) -> PersistResult<PagedResult<T>> {
        if page_size == 0 {
            return Err(PersistError::InvalidArgument {
                reason: "page_size must be greater than zero".to_string(),
            });
        }

        let filter = Self::scoped(filter);
        let total_count = self.collection.count(&filter, None).await?;

        let options = FindOptions {
            sort: Some((fields::CREATED_AT.to_string(), Order::Descending)),
            skip: Some(page_index.saturating_mul(page_size)),
            limit: Some(page_size),
        };
        let docs = self.collection.find(&filter, options).await?;
        let items: Vec<T> = docs.into_iter().map(Self::decode).collect::<PersistResult<_>>()?;

        debug!(
            entity = T::TYPE,
            page_index,
            page_size,
            total_count,
            returned = items.len(),
            "get_paged"
        );
        Ok(PagedResult::new(items, total_count, page_index, page_size))
    }

    /// 创建实体：覆盖调用方提供的时间戳并将版本置为初始值
    pub async fn create(&self, mut entity: T) -> PersistResult<T> {
        entity.meta_mut().stamp_created(chrono::Utc::now());
        self.collection.insert_one(Self::encode(&entity)?).await?;
        debug!(entity = T::TYPE, id = %entity.id(), "created");
        Ok(entity)
    }

    /// 批量创建：同一时间戳统一打戳，单批量全有或全无
    pub async fn create_many(&self, mut entities: Vec<T>) -> PersistResult<Vec<T>> {
        if entities.is_empty() {
            return Ok(entities);
        }
        let now = chrono::Utc::now();
        for entity in &mut entities {
            entity.meta_mut().stamp_created(now);
        }
        let docs = entities
            .iter()
            .map(Self::encode)
            .collect::<PersistResult<Vec<_>>>()?;
        self.collection.insert_many(docs).await?;
        debug!(entity = T::TYPE, count = entities.len(), "created batch");
        Ok(entities)
    }

    /// 整体更新（乐观锁）
    ///
    /// 以调用方当前持有的版本为条件做替换；零匹配说明实体不存在或已被
    /// 并发修改，返回 `VersionConflict`，由调用方重新加载后决定是否重试。
    pub async fn update(&self, mut entity: T) -> PersistResult<T> {
        let held = entity.version();
        let meta = entity.meta_mut();
        meta.updated_at = chrono::Utc::now();
        meta.version = held.next();

        let filter = Filter::and([
            Self::id_filter(entity.id()),
            Filter::eq(fields::VERSION, held.value()),
        ]);
        let matched = self
            .collection
            .replace_one(&filter, Self::encode(&entity)?)
            .await?;

        if matched == 0 {
            return Err(PersistError::VersionConflict {
                entity_type: T::TYPE,
                id: entity.id().to_string(),
                expected: held.value(),
            });
        }
        debug!(entity = T::TYPE, id = %entity.id(), version = %entity.version(), "updated");
        Ok(entity)
    }

    /// 字段级部分更新：原子地应用调用方的更新描述并打戳
    ///
    /// 调用方不得触碰仓储独占字段（标识、时间戳、版本、软删除标记）。
    /// 返回是否恰好修改了一条记录。
    pub async fn update_partial(&self, id: &EntityId, update: UpdateDoc) -> PersistResult<bool> {
        let modified = self.update_partial_fetch(id, update).await?;
        Ok(modified.is_some())
    }

    /// 同 `update_partial`，但返回更新后的实体（用于原子自增后读取）
    pub async fn update_partial_fetch(
        &self,
        id: &EntityId,
        update: UpdateDoc,
    ) -> PersistResult<Option<T>> {
        if let Some(owned) = fields::OWNED.iter().find(|field| update.touches(field)) {
            return Err(PersistError::InvalidArgument {
                reason: format!("field '{owned}' is owned by the repository"),
            });
        }

        let filter = Self::scoped(Some(Self::id_filter(id)));
        let updated = self
            .collection
            .find_one_and_update(&filter, &Self::stamp(update))
            .await?;
        debug!(entity = T::TYPE, %id, modified = updated.is_some(), "update_partial");
        updated.map(Self::decode).transpose()
    }

    /// 物理删除：无条件移除，绕过软删除标记与版本检查
    pub async fn delete(&self, id: &EntityId) -> PersistResult<bool> {
        let deleted = self.collection.delete_one(&Self::id_filter(id)).await?;
        debug!(entity = T::TYPE, %id, deleted = deleted > 0, "hard delete");
        Ok(deleted > 0)
    }

    /// 软删除：标记删除并打戳；对已删除记录是返回 `false` 的空操作
    ///
    /// 仅当实体类型支持审计归属且提供了操作主体时写入 `deleted_by`。
    pub async fn soft_delete(
        &self,
        id: &EntityId,
        deleted_by: Option<&str>,
    ) -> PersistResult<bool> {
        let mut update = UpdateDoc::new()
            .set(fields::IS_DELETED, true)
            .current_date(fields::DELETED_AT)
            .current_date(fields::UPDATED_AT)
            .inc(fields::VERSION, 1);
        if T::AUDITABLE {
            if let Some(actor) = deleted_by {
                update = update.set(fields::DELETED_BY, actor);
            }
        }

        let filter = Self::scoped(Some(Self::id_filter(id)));
        let modified = self.collection.update_one(&filter, &update).await?;
        debug!(entity = T::TYPE, %id, modified = modified > 0, "soft delete");
        Ok(modified > 0)
    }

    /// 按条件物理删除，绕过软删除过滤；返回删除数量
    pub async fn delete_many(&self, filter: Filter) -> PersistResult<u64> {
        let deleted = self.collection.delete_many(&filter).await?;
        debug!(entity = T::TYPE, deleted, "delete_many");
        Ok(deleted)
    }

    /// 存在性检查：在首个匹配处短路
    pub async fn exists(&self, filter: Filter) -> PersistResult<bool> {
        let count = self
            .collection
            .count(&Self::scoped(Some(filter)), Some(1))
            .await?;
        Ok(count > 0)
    }

    /// 未删除记录计数
    pub async fn count(&self, filter: Option<Filter>) -> PersistResult<u64> {
        self.collection.count(&Self::scoped(filter), None).await
    }

    /// 运行聚合管道并投影为结果类型；不隐式过滤软删除记录
    pub async fn aggregate<R: DeserializeOwned>(
        &self,
        pipeline: &[PipelineStage],
    ) -> PersistResult<Vec<R>> {
        let docs = self.collection.aggregate(pipeline).await?;
        debug!(entity = T::TYPE, count = docs.len(), "aggregate");
        docs.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }
}
