//! 内存文档存储（MemoryStore）
//!
//! 面向测试与单进程场景的存储后端：每个集合为一段受互斥锁保护的文档序列，
//! 保持插入顺序作为缺省排序，并在写路径上强制执行已声明的唯一索引。
//! 批量插入先整体校验（含批内重复）再提交，满足全有或全无契约。
//!
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::config::DatabaseConfig;
use crate::error::{PersistError, PersistResult};
use crate::filter::{Filter, value_cmp, value_eq};
use crate::store::{Document, DocumentCollection, DocumentStore, FindOptions, IndexSpec, Order, PipelineStage};
use crate::update::UpdateDoc;

/// 内存文档存储
pub struct MemoryStore {
    database: String,
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// 从配置构建存储；集合名映射仍由调用方传给 `Repository::open`
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(config.database.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl DocumentStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        if let Some(existing) = read_lock(&self.collections).get(name) {
            return Arc::clone(existing) as Arc<dyn DocumentCollection>;
        }
        let mut collections = write_lock(&self.collections);
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)));
        Arc::clone(collection) as Arc<dyn DocumentCollection>
    }
}

struct CollectionState {
    docs: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

/// 单个内存集合
pub struct MemoryCollection {
    name: String,
    state: Mutex<CollectionState>,
}

impl MemoryCollection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(CollectionState {
                docs: Vec::new(),
                indexes: Vec::new(),
            }),
        }
    }

    /// 检查候选文档是否违反某个唯一索引；`skip` 为被替换/更新文档的位置
    fn check_unique(
        &self,
        state: &CollectionState,
        candidate: &Document,
        skip: Option<usize>,
    ) -> PersistResult<()> {
        for spec in state.indexes.iter().filter(|s| s.is_unique()) {
            let Some(key) = unique_key(candidate, spec) else {
                continue;
            };
            for (pos, doc) in state.docs.iter().enumerate() {
                if Some(pos) == skip {
                    continue;
                }
                if unique_key(doc, spec).is_some_and(|existing| keys_equal(&existing, &key)) {
                    return Err(PersistError::DuplicateKey {
                        collection: self.name.clone(),
                        index: spec.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> PersistResult<Vec<Document>> {
        let state = lock(&self.state);
        let mut matched: Vec<Document> = state
            .docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        drop(state);

        if let Some((field, order)) = &options.sort {
            sort_docs(&mut matched, field, *order);
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let mut matched: Vec<Document> = matched.into_iter().skip(skip).collect();
        if let Some(limit) = options.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn find_one(&self, filter: &Filter) -> PersistResult<Option<Document>> {
        let state = lock(&self.state);
        Ok(state.docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn insert_one(&self, doc: Document) -> PersistResult<()> {
        let mut state = lock(&self.state);
        self.check_unique(&state, &doc, None)?;
        state.docs.push(doc);
        Ok(())
    }

    async fn insert_many(&self, docs: Vec<Document>) -> PersistResult<()> {
        let mut state = lock(&self.state);
        // 整体校验：任何一条违反约束（含批内重复）则一条都不提交
        for (offset, doc) in docs.iter().enumerate() {
            self.check_unique(&state, doc, None)?;
            for earlier in &docs[..offset] {
                for spec in state.indexes.iter().filter(|s| s.is_unique()) {
                    let conflict = match (unique_key(doc, spec), unique_key(earlier, spec)) {
                        (Some(a), Some(b)) => keys_equal(&a, &b),
                        _ => false,
                    };
                    if conflict {
                        return Err(PersistError::DuplicateKey {
                            collection: self.name.clone(),
                            index: spec.name().to_string(),
                        });
                    }
                }
            }
        }
        state.docs.extend(docs);
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> PersistResult<u64> {
        let mut state = lock(&self.state);
        let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(0);
        };
        self.check_unique(&state, &doc, Some(pos))?;
        state.docs[pos] = doc;
        Ok(1)
    }

    async fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> PersistResult<u64> {
        let mut state = lock(&self.state);
        let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(0);
        };
        let mut updated = state.docs[pos].clone();
        update.apply(&mut updated, Utc::now())?;
        self.check_unique(&state, &updated, Some(pos))?;
        state.docs[pos] = updated;
        Ok(1)
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> PersistResult<Option<Document>> {
        let mut state = lock(&self.state);
        let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };
        let mut updated = state.docs[pos].clone();
        update.apply(&mut updated, Utc::now())?;
        self.check_unique(&state, &updated, Some(pos))?;
        state.docs[pos] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, filter: &Filter) -> PersistResult<u64> {
        let mut state = lock(&self.state);
        match state.docs.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                state.docs.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> PersistResult<u64> {
        let mut state = lock(&self.state);
        let before = state.docs.len();
        state.docs.retain(|d| !filter.matches(d));
        Ok((before - state.docs.len()) as u64)
    }

    async fn count(&self, filter: &Filter, limit: Option<u64>) -> PersistResult<u64> {
        let state = lock(&self.state);
        let mut count = 0u64;
        for doc in &state.docs {
            if filter.matches(doc) {
                count += 1;
                if limit.is_some_and(|max| count >= max) {
                    break;
                }
            }
        }
        Ok(count)
    }

    async fn aggregate(&self, pipeline: &[PipelineStage]) -> PersistResult<Vec<Document>> {
        let mut docs: Vec<Document> = lock(&self.state).docs.clone();
        for stage in pipeline {
            match stage {
                PipelineStage::Match(filter) => docs.retain(|d| filter.matches(d)),
                PipelineStage::Sort { field, order } => sort_docs(&mut docs, field, *order),
                PipelineStage::Skip(n) => {
                    docs = docs.into_iter().skip(*n as usize).collect();
                }
                PipelineStage::Limit(n) => docs.truncate(*n as usize),
                PipelineStage::Project(keep) => {
                    for doc in &mut docs {
                        if let Some(map) = doc.as_object_mut() {
                            map.retain(|k, _| keep.iter().any(|f| f == k));
                        }
                    }
                }
                PipelineStage::Count(field) => {
                    let count = docs.len() as u64;
                    docs = vec![serde_json::json!({ field.as_str(): count })];
                }
            }
        }
        Ok(docs)
    }

    async fn create_index(&self, spec: &IndexSpec) -> PersistResult<()> {
        let mut state = lock(&self.state);
        if state.indexes.iter().any(|s| s.name() == spec.name()) {
            return Ok(());
        }
        if spec.is_unique() {
            // 与 MongoDB 一致：既有数据违反唯一约束时索引创建失败
            for (pos, doc) in state.docs.iter().enumerate() {
                let Some(key) = unique_key(doc, spec) else {
                    continue;
                };
                let duplicated = state.docs[..pos]
                    .iter()
                    .any(|other| unique_key(other, spec).is_some_and(|k| keys_equal(&k, &key)));
                if duplicated {
                    return Err(PersistError::Index {
                        collection: self.name.clone(),
                        index: spec.name().to_string(),
                        reason: "existing documents violate unique constraint".to_string(),
                    });
                }
            }
        }
        state.indexes.push(spec.clone());
        Ok(())
    }
}

/// 唯一索引键：任一键字段缺失或为 Null 时豁免唯一性检查
fn unique_key(doc: &Document, spec: &IndexSpec) -> Option<Vec<Value>> {
    let mut key = Vec::with_capacity(spec.keys().len());
    for (field, _) in spec.keys() {
        match doc.get(field) {
            Some(value) if !value.is_null() => key.push(value.clone()),
            _ => return None,
        }
    }
    Some(key)
}

fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| value_eq(x, y))
}

fn sort_docs(docs: &mut [Document], field: &str, order: Order) {
    docs.sort_by(|a, b| {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = value_cmp(left, right).unwrap_or(Ordering::Equal);
        match order {
            Order::Ascending => ordering,
            Order::Descending => ordering.reverse(),
        }
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Arc<dyn DocumentCollection> {
        MemoryStore::new("test").collection("users")
    }

    // 测试从配置构建存储
    #[test]
    fn test_from_config() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"database": "staging"}"#).unwrap();
        let store = MemoryStore::from_config(&config);
        assert_eq!(store.database_name(), "staging");
    }

    // 测试插入与过滤查询
    #[tokio::test]
    async fn test_insert_and_find() {
        let coll = users();
        coll.insert_one(json!({"name": "alice", "level": 2})).await.unwrap();
        coll.insert_one(json!({"name": "bob", "level": 5})).await.unwrap();

        let found = coll
            .find(&Filter::gt("level", 3), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name").and_then(Value::as_str), Some("bob"));

        let one = coll.find_one(&Filter::eq("name", "alice")).await.unwrap();
        assert!(one.is_some());
    }

    // 测试唯一索引拒绝重复插入与更新
    #[tokio::test]
    async fn test_unique_index_enforced() {
        let coll = users();
        coll.create_index(&IndexSpec::unique_ascending("email")).await.unwrap();
        coll.insert_one(json!({"email": "a@x.io"})).await.unwrap();

        let err = coll.insert_one(json!({"email": "a@x.io"})).await.unwrap_err();
        assert!(matches!(err, PersistError::DuplicateKey { .. }));

        coll.insert_one(json!({"email": "b@x.io"})).await.unwrap();
        let err = coll
            .update_one(
                &Filter::eq("email", "b@x.io"),
                &UpdateDoc::new().set("email", "a@x.io"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::DuplicateKey { .. }));

        // Null/缺失键不参与唯一性
        coll.insert_one(json!({"name": "ghost"})).await.unwrap();
        coll.insert_one(json!({"name": "ghost2"})).await.unwrap();
    }

    // 测试 Inc 作用于非整数字段时整组更新被拒绝、文档保持原样
    #[tokio::test]
    async fn test_update_rejects_inc_on_non_integer() {
        let coll = users();
        coll.insert_one(json!({"name": "alice", "count": 1})).await.unwrap();

        let err = coll
            .update_one(
                &Filter::eq("name", "alice"),
                &UpdateDoc::new().inc("count", 1).inc("name", 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InvalidArgument { .. }));

        let doc = coll.find_one(&Filter::eq("name", "alice")).await.unwrap().unwrap();
        assert_eq!(doc.get("count").and_then(Value::as_i64), Some(1));
    }

    // 测试批量插入的全有或全无
    #[tokio::test]
    async fn test_insert_many_atomicity() {
        let coll = users();
        coll.create_index(&IndexSpec::unique_ascending("email")).await.unwrap();

        let err = coll
            .insert_many(vec![
                json!({"email": "a@x.io"}),
                json!({"email": "a@x.io"}),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::DuplicateKey { .. }));
        assert_eq!(coll.count(&Filter::All, None).await.unwrap(), 0);
    }

    // 测试唯一索引与既有数据冲突时创建失败
    #[tokio::test]
    async fn test_create_index_on_conflicting_data() {
        let coll = users();
        coll.insert_one(json!({"email": "a@x.io"})).await.unwrap();
        coll.insert_one(json!({"email": "a@x.io"})).await.unwrap();

        let err = coll
            .create_index(&IndexSpec::unique_ascending("email"))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Index { .. }));

        // 幂等：同名索引重复创建直接成功
        coll.create_index(&IndexSpec::ascending("email")).await.unwrap();
        coll.create_index(&IndexSpec::ascending("email")).await.unwrap();
    }

    // 测试排序、跳过与限制
    #[tokio::test]
    async fn test_find_options() {
        let coll = users();
        for level in [3, 1, 2] {
            coll.insert_one(json!({"level": level})).await.unwrap();
        }
        let sorted = coll
            .find(
                &Filter::All,
                FindOptions {
                    sort: Some(("level".to_string(), Order::Descending)),
                    skip: Some(1),
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].get("level").and_then(Value::as_i64), Some(2));
    }

    // 测试聚合管道阶段
    #[tokio::test]
    async fn test_aggregate_pipeline() {
        let coll = users();
        for (name, level) in [("a", 1), ("b", 2), ("c", 3)] {
            coll.insert_one(json!({"name": name, "level": level})).await.unwrap();
        }

        let out = coll
            .aggregate(&[
                PipelineStage::Match(Filter::gte("level", 2)),
                PipelineStage::Sort {
                    field: "level".to_string(),
                    order: Order::Descending,
                },
                PipelineStage::Project(vec!["name".to_string()]),
            ])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], json!({"name": "c"}));

        let counted = coll
            .aggregate(&[
                PipelineStage::Match(Filter::gte("level", 2)),
                PipelineStage::Count("total".to_string()),
            ])
            .await
            .unwrap();
        assert_eq!(counted, vec![json!({"total": 2})]);
    }
}
