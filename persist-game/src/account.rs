//! 账号实体
//!
//! 登录主体：用户名/邮箱唯一，携带登录统计、邮箱验证与锁定状态。
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use persist_domain::entity::{AuditMeta, Entity, EntityMeta};

/// 账号专有字段名（供过滤条件与索引构造使用）
pub mod fields {
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const STATUS: &str = "status";
    pub const ROLE: &str = "role";
    pub const LAST_LOGIN_AT: &str = "last_login_at";
    pub const LAST_LOGIN_IP: &str = "last_login_ip";
    pub const LOGIN_COUNT: &str = "login_count";
    pub const EMAIL_VERIFIED: &str = "email_verified";
    pub const EMAIL_VERIFIED_AT: &str = "email_verified_at";
    pub const LOCKED_UNTIL: &str = "locked_until";
    pub const FAILED_LOGIN_ATTEMPTS: &str = "failed_login_attempts";
}

/// 账号状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
    Disabled,
    Deleted,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
            AccountStatus::Disabled => "Disabled",
            AccountStatus::Deleted => "Deleted",
        }
    }
}

impl From<AccountStatus> for Value {
    fn from(status: AccountStatus) -> Self {
        Value::String(status.as_str().to_string())
    }
}

/// 账号角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountRole {
    Player,
    Moderator,
    Administrator,
    SuperAdmin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Player => "Player",
            AccountRole::Moderator => "Moderator",
            AccountRole::Administrator => "Administrator",
            AccountRole::SuperAdmin => "SuperAdmin",
        }
    }
}

impl From<AccountRole> for Value {
    fn from(role: AccountRole) -> Self {
        Value::String(role.as_str().to_string())
    }
}

/// 账号实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(flatten)]
    pub audit: AuditMeta,

    /// 用户名（唯一）
    pub username: String,
    /// 邮箱地址（唯一）
    pub email: String,
    /// 密码哈希
    pub password_hash: String,
    /// 密码盐值
    pub password_salt: String,
    pub status: AccountStatus,
    pub role: AccountRole,
    /// 最后登录时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    /// 最后登录 IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_ip: Option<String>,
    /// 累计登录次数
    pub login_count: u64,
    /// 邮箱验证状态
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified_at: Option<DateTime<Utc>>,
    /// 账号锁定到期时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
    /// 失败登录尝试次数
    pub failed_login_attempts: u32,
}

impl Account {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            audit: AuditMeta::default(),
            username: username.into(),
            email: email.into(),
            password_hash: String::new(),
            password_salt: String::new(),
            status: AccountStatus::Active,
            role: AccountRole::Player,
            last_login_at: None,
            last_login_ip: None,
            login_count: 0,
            email_verified: false,
            email_verified_at: None,
            locked_until: None,
            failed_login_attempts: 0,
        }
    }

    /// 检查账号在给定时刻是否处于锁定中
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// 检查账号是否可用（激活且未锁定）
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == AccountStatus::Active && !self.is_locked(now)
    }
}

impl Entity for Account {
    const TYPE: &'static str = "account";
    const AUDITABLE: bool = true;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
