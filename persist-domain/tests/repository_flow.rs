use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use persist_domain::collection::CollectionMap;
use persist_domain::entity::{AuditMeta, Entity, EntityMeta, fields};
use persist_domain::error::PersistError;
use persist_domain::filter::Filter;
use persist_domain::repository::Repository;
use persist_domain::store::{MemoryStore, PipelineStage};
use persist_domain::update::UpdateDoc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// 测试实体
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    #[serde(flatten)]
    meta: EntityMeta,
    #[serde(flatten)]
    audit: AuditMeta,
    name: String,
    level: i64,
}

impl Profile {
    fn new(name: &str, level: i64) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            name: name.to_string(),
            level,
        }
    }
}

impl Entity for Profile {
    const TYPE: &'static str = "profile";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

async fn open_repo() -> AnyResult<Repository<Profile>> {
    let store = MemoryStore::new("test");
    let repo = Repository::open(&store, &CollectionMap::new(), vec![]).await?;
    assert_eq!(repo.collection_name(), "profiles");
    Ok(repo)
}

// ============================================================================
// 创建与打戳
// ============================================================================

#[tokio::test]
async fn create_stamps_initial_state() -> AnyResult<()> {
    let repo = open_repo().await?;

    let mut profile = Profile::new("alice", 3);
    // 调用方伪造的元数据必须被覆盖
    profile.meta.version = 9.into();
    profile.meta.is_deleted = true;
    profile.meta.deleted_at = Some(Utc::now());

    let created = repo.create(profile).await?;
    assert!(created.version().is_initial());
    assert!(!created.is_deleted());
    assert!(created.meta().deleted_at.is_none());
    assert_eq!(created.meta().created_at, created.meta().updated_at);

    let loaded = repo.get_by_id(created.id()).await?.expect("created entity");
    assert_eq!(loaded.name, "alice");
    Ok(())
}

#[tokio::test]
async fn create_many_uses_single_timestamp() -> AnyResult<()> {
    let repo = open_repo().await?;

    let batch = vec![
        Profile::new("a", 1),
        Profile::new("b", 2),
        Profile::new("c", 3),
    ];
    let created = repo.create_many(batch).await?;
    assert_eq!(created.len(), 3);

    let stamps: Vec<DateTime<Utc>> = created.iter().map(|p| p.meta().created_at).collect();
    assert!(stamps.iter().all(|at| *at == stamps[0]));
    assert_eq!(repo.count(None).await?, 3);
    Ok(())
}

// ============================================================================
// 乐观锁更新
// ============================================================================

#[tokio::test]
async fn update_bumps_version_and_updated_at() -> AnyResult<()> {
    let repo = open_repo().await?;
    let created = repo.create(Profile::new("alice", 1)).await?;
    let created_version = created.version();

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    let mut changed = created;
    changed.level = 2;
    let updated = repo.update(changed).await?;
    assert_eq!(updated.version().value(), created_version.value() + 1);

    let loaded = repo.get_by_id(updated.id()).await?.expect("entity");
    assert_eq!(loaded.level, 2);
    assert!(loaded.meta().updated_at > loaded.meta().created_at);
    Ok(())
}

#[tokio::test]
async fn stale_update_conflicts_without_mutation() -> AnyResult<()> {
    let repo = open_repo().await?;
    let created = repo.create(Profile::new("alice", 1)).await?;

    // 同一起始版本的两次更新：恰好一次成功、一次冲突
    let mut first = created.clone();
    first.level = 10;
    let mut second = created.clone();
    second.level = 20;

    let winner = repo.update(first).await?;
    let err = repo.update(second).await.unwrap_err();
    match err {
        PersistError::VersionConflict { entity_type, expected, .. } => {
            assert_eq!(entity_type, "profile");
            assert_eq!(expected, created.version().value());
        }
        other => panic!("unexpected {other:?}"),
    }

    // 失败方没有留下任何写入
    let loaded = repo.get_by_id(winner.id()).await?.expect("entity");
    assert_eq!(loaded.level, 10);
    assert_eq!(loaded.version().value(), winner.version().value());
    Ok(())
}

// ============================================================================
// 部分更新
// ============================================================================

#[tokio::test]
async fn update_partial_applies_fields_and_stamps() -> AnyResult<()> {
    let repo = open_repo().await?;
    let created = repo.create(Profile::new("alice", 1)).await?;

    let modified = repo
        .update_partial(
            created.id(),
            UpdateDoc::new().set("name", "bob").inc("level", 4),
        )
        .await?;
    assert!(modified);

    let loaded = repo.get_by_id(created.id()).await?.expect("entity");
    assert_eq!(loaded.name, "bob");
    assert_eq!(loaded.level, 5);
    assert_eq!(loaded.version().value(), created.version().value() + 1);
    Ok(())
}

#[tokio::test]
async fn update_partial_rejects_owned_fields() -> AnyResult<()> {
    let repo = open_repo().await?;
    let created = repo.create(Profile::new("alice", 1)).await?;

    let err = repo
        .update_partial(created.id(), UpdateDoc::new().set(fields::VERSION, 99))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::InvalidArgument { .. }));

    // 被拒绝的更新不产生任何变更
    let loaded = repo.get_by_id(created.id()).await?.expect("entity");
    assert!(loaded.version().is_initial());
    Ok(())
}

// ============================================================================
// 软删除与物理删除
// ============================================================================

#[tokio::test]
async fn soft_delete_hides_entity_and_is_idempotent_false() -> AnyResult<()> {
    let repo = open_repo().await?;
    let created = repo.create(Profile::new("alice", 1)).await?;

    assert!(repo.soft_delete(created.id(), Some("admin-1")).await?);
    assert!(repo.get_by_id(created.id()).await?.is_none());
    assert_eq!(repo.count(None).await?, 0);
    assert!(!repo.exists(Filter::eq("name", "alice")).await?);

    // 第二次软删除是返回 false 的空操作
    assert!(!repo.soft_delete(created.id(), Some("admin-1")).await?);

    // 聚合不做隐式过滤：可以看到删除标记与审计归属
    let raw: Vec<Value> = repo
        .aggregate(&[PipelineStage::Match(Filter::eq(
            fields::ID,
            created.id(),
        ))])
        .await?;
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].get(fields::IS_DELETED), Some(&Value::Bool(true)));
    assert!(raw[0].get(fields::DELETED_AT).is_some());
    assert_eq!(
        raw[0].get(fields::DELETED_BY).and_then(Value::as_str),
        Some("admin-1")
    );

    // 物理删除无视软删除标记
    assert!(repo.delete(created.id()).await?);
    assert!(!repo.delete(created.id()).await?);
    Ok(())
}

#[tokio::test]
async fn delete_many_bypasses_soft_delete_scope() -> AnyResult<()> {
    let repo = open_repo().await?;
    let a = repo.create(Profile::new("a", 1)).await?;
    repo.create(Profile::new("b", 2)).await?;
    repo.soft_delete(a.id(), None).await?;

    // 软删除后常规计数只剩 1，但物理删除作用于全部 2 条
    assert_eq!(repo.count(None).await?, 1);
    assert_eq!(repo.delete_many(Filter::All).await?, 2);
    Ok(())
}

// ============================================================================
// 分页
// ============================================================================

#[tokio::test]
async fn paging_over_25_records() -> AnyResult<()> {
    let repo = open_repo().await?;
    for i in 0..25 {
        repo.create(Profile::new(&format!("u{i}"), i)).await?;
    }

    let first = repo.get_paged(None, 0, 10).await?;
    assert_eq!(first.items().len(), 10);
    assert_eq!(first.total_count(), 25);
    assert_eq!(first.total_pages(), 3);
    assert!(first.has_next_page());
    assert!(!first.has_previous_page());

    let last = repo.get_paged(None, 2, 10).await?;
    assert_eq!(last.items().len(), 5);
    assert!(!last.has_next_page());
    assert!(last.has_previous_page());

    // 越界页：空条目、一致计数，不是错误
    let beyond = repo.get_paged(None, 9, 10).await?;
    assert!(beyond.items().is_empty());
    assert_eq!(beyond.total_count(), 25);
    assert_eq!(beyond.total_pages(), 3);

    let err = repo.get_paged(None, 0, 0).await.unwrap_err();
    assert!(matches!(err, PersistError::InvalidArgument { .. }));
    Ok(())
}

#[tokio::test]
async fn paging_sorts_created_at_descending() -> AnyResult<()> {
    let repo = open_repo().await?;
    for i in 0..3 {
        repo.create(Profile::new(&format!("u{i}"), i)).await?;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page = repo.get_paged(None, 0, 3).await?;
    let names: Vec<&str> = page.items().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["u2", "u1", "u0"]);
    Ok(())
}

// ============================================================================
// 查询与聚合
// ============================================================================

#[tokio::test]
async fn filtered_queries_exclude_soft_deleted() -> AnyResult<()> {
    let repo = open_repo().await?;
    let a = repo.create(Profile::new("a", 5)).await?;
    repo.create(Profile::new("b", 7)).await?;
    repo.soft_delete(a.id(), None).await?;

    let found = repo.find(Filter::gte("level", 5)).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "b");

    assert!(repo.find_one(Filter::eq("name", "a")).await?.is_none());
    assert_eq!(repo.get_all().await?.len(), 1);
    assert!(repo.exists(Filter::eq("name", "b")).await?);
    assert_eq!(repo.count(Some(Filter::gte("level", 0))).await?, 1);
    Ok(())
}

#[tokio::test]
async fn aggregate_projects_into_result_type() -> AnyResult<()> {
    #[derive(Debug, Deserialize)]
    struct LevelOnly {
        level: i64,
    }

    let repo = open_repo().await?;
    for i in 1..=4 {
        repo.create(Profile::new(&format!("u{i}"), i)).await?;
    }

    let levels: Vec<LevelOnly> = repo
        .aggregate(&[
            PipelineStage::Match(Filter::gte("level", 3)),
            PipelineStage::Project(vec!["level".to_string()]),
        ])
        .await?;
    assert_eq!(levels.len(), 2);
    assert!(levels.iter().all(|l| l.level >= 3));
    Ok(())
}
