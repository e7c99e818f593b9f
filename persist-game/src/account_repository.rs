//! 账号仓储
//!
//! 在泛型仓储之上组合出账号专有的查找（用户名/邮箱）、原子计数
//! （失败登录次数）与锁定操作；并声明用户名/邮箱唯一索引等专用索引。
//! 锁定阈值等策略由上层协作方基于这里的原语实现。
//!
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use persist_domain::collection::CollectionMap;
use persist_domain::entity::fields as meta;
use persist_domain::error::PersistResult;
use persist_domain::filter::{Filter, timestamp};
use persist_domain::repository::Repository;
use persist_domain::store::{DocumentStore, FindOptions, IndexSpec, Order};
use persist_domain::update::UpdateDoc;
use persist_domain::value_object::EntityId;

use crate::account::{Account, AccountRole, fields};

/// 账号集合的专用索引
pub fn account_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::unique_ascending(fields::USERNAME),
        IndexSpec::unique_ascending(fields::EMAIL),
        IndexSpec::ascending(fields::STATUS),
        IndexSpec::ascending(fields::ROLE),
        IndexSpec::descending(fields::LAST_LOGIN_AT),
        IndexSpec::builder()
            .name(format!("{}_{}", fields::STATUS, fields::ROLE))
            .keys(vec![
                (fields::STATUS.to_string(), Order::Ascending),
                (fields::ROLE.to_string(), Order::Ascending),
            ])
            .build(),
    ]
}

/// 账号仓储（组合泛型仓储，而非继承）
pub struct AccountRepository {
    repo: Repository<Account>,
}

impl AccountRepository {
    /// 打开账号仓储并幂等创建专用索引
    ///
    /// 唯一索引创建失败时仓储仍可用，但 `index_report` 会标记退化，
    /// 启动期应检查并上报。
    pub async fn open(
        store: &dyn DocumentStore,
        collections: &CollectionMap,
    ) -> PersistResult<Self> {
        let repo = Repository::open(store, collections, account_indexes()).await?;
        Ok(Self { repo })
    }

    /// 泛型操作入口（创建、整体更新、分页等）
    pub fn repository(&self) -> &Repository<Account> {
        &self.repo
    }

    /// 按用户名精确查找（未删除范围）
    pub async fn get_by_username(&self, username: &str) -> PersistResult<Option<Account>> {
        self.repo.find_one(Filter::eq(fields::USERNAME, username)).await
    }

    /// 按邮箱精确查找（未删除范围）
    pub async fn get_by_email(&self, email: &str) -> PersistResult<Option<Account>> {
        self.repo.find_one(Filter::eq(fields::EMAIL, email)).await
    }

    /// 用户名是否已被占用；`exclude_id` 用于资料编辑时排除自身
    pub async fn username_exists(
        &self,
        username: &str,
        exclude_id: Option<&EntityId>,
    ) -> PersistResult<bool> {
        self.field_exists(Filter::eq(fields::USERNAME, username), exclude_id)
            .await
    }

    /// 邮箱是否已被占用；`exclude_id` 用于资料编辑时排除自身
    pub async fn email_exists(
        &self,
        email: &str,
        exclude_id: Option<&EntityId>,
    ) -> PersistResult<bool> {
        self.field_exists(Filter::eq(fields::EMAIL, email), exclude_id)
            .await
    }

    async fn field_exists(
        &self,
        filter: Filter,
        exclude_id: Option<&EntityId>,
    ) -> PersistResult<bool> {
        let filter = match exclude_id {
            Some(id) => Filter::and([filter, Filter::ne(meta::ID, id)]),
            None => filter,
        };
        self.repo.exists(filter).await
    }

    /// 记录一次成功登录：时间、IP 与登录计数在一次原子更新内完成
    pub async fn update_last_login(&self, id: &EntityId, ip: &str) -> PersistResult<bool> {
        let update = UpdateDoc::new()
            .current_date(fields::LAST_LOGIN_AT)
            .set(fields::LAST_LOGIN_IP, ip)
            .inc(fields::LOGIN_COUNT, 1);
        let modified = self.repo.update_partial(id, update).await?;
        debug!(%id, ip, modified, "update_last_login");
        Ok(modified)
    }

    /// 原子自增失败登录次数并返回自增后的值；账号不存在时返回 0
    pub async fn increment_failed_login_attempts(&self, id: &EntityId) -> PersistResult<u32> {
        let update = UpdateDoc::new().inc(fields::FAILED_LOGIN_ATTEMPTS, 1);
        let updated = self.repo.update_partial_fetch(id, update).await?;
        let attempts = updated.map(|a| a.failed_login_attempts).unwrap_or(0);
        debug!(%id, attempts, "increment_failed_login_attempts");
        Ok(attempts)
    }

    /// 清零失败登录次数
    pub async fn reset_failed_login_attempts(&self, id: &EntityId) -> PersistResult<bool> {
        let update = UpdateDoc::new().set(fields::FAILED_LOGIN_ATTEMPTS, 0);
        self.repo.update_partial(id, update).await
    }

    /// 锁定账号至给定时刻
    pub async fn lock(&self, id: &EntityId, until: DateTime<Utc>) -> PersistResult<bool> {
        let update = UpdateDoc::new().set(fields::LOCKED_UNTIL, timestamp(until));
        let modified = self.repo.update_partial(id, update).await?;
        debug!(%id, %until, modified, "lock");
        Ok(modified)
    }

    /// 解锁账号：清除锁定时刻并清零失败计数，一次原子更新
    pub async fn unlock(&self, id: &EntityId) -> PersistResult<bool> {
        let update = UpdateDoc::new()
            .unset(fields::LOCKED_UNTIL)
            .set(fields::FAILED_LOGIN_ATTEMPTS, 0);
        let modified = self.repo.update_partial(id, update).await?;
        debug!(%id, modified, "unlock");
        Ok(modified)
    }

    /// 标记邮箱已验证
    pub async fn verify_email(&self, id: &EntityId) -> PersistResult<bool> {
        let update = UpdateDoc::new()
            .set(fields::EMAIL_VERIFIED, true)
            .current_date(fields::EMAIL_VERIFIED_AT);
        self.repo.update_partial(id, update).await
    }

    /// 按角色列出账号（创建时间降序）
    pub async fn list_by_role(&self, role: AccountRole) -> PersistResult<Vec<Account>> {
        self.repo
            .find_with_options(
                Filter::eq(fields::ROLE, role),
                FindOptions::sorted(meta::CREATED_AT, Order::Descending),
            )
            .await
    }

    /// 统计最近 `days` 天内登录过的账号数量
    pub async fn count_active_since(&self, days: i64) -> PersistResult<u64> {
        let cutoff = Utc::now() - Duration::days(days);
        self.repo
            .count(Some(Filter::gte(fields::LAST_LOGIN_AT, timestamp(cutoff))))
            .await
    }
}
