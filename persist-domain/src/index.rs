//! 索引管理（Index Manager）
//!
//! 幂等地为集合创建一组命名索引。普通索引创建失败仅记录告警、不阻塞仓储
//! 使用；唯一索引创建失败是潜在的正确性风险（后续写路径假设重复不可能
//! 存在），因此在 `IndexReport` 中单独上报，供启动期健康检查升级处理。
//!
use tracing::{debug, error, warn};

use crate::entity::fields;
use crate::store::{DocumentCollection, IndexSpec, Order};

/// 每个实体集合都应具备的基础索引
pub fn base_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending(fields::CREATED_AT),
        IndexSpec::ascending(fields::UPDATED_AT),
        IndexSpec::ascending(fields::IS_DELETED),
        // 支撑默认分页排序的复合索引
        IndexSpec::builder()
            .name(format!("{}_{}_paging", fields::IS_DELETED, fields::CREATED_AT))
            .keys(vec![
                (fields::IS_DELETED.to_string(), Order::Ascending),
                (fields::CREATED_AT.to_string(), Order::Descending),
            ])
            .build(),
    ]
}

/// 索引创建结果
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    provisioned: Vec<String>,
    failed: Vec<String>,
    failed_unique: Vec<String>,
}

impl IndexReport {
    /// 成功创建的索引名
    pub fn provisioned(&self) -> &[String] {
        &self.provisioned
    }

    /// 创建失败的普通索引名（非致命）
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// 创建失败的唯一索引名（必须在启动期上报）
    pub fn failed_unique(&self) -> &[String] {
        &self.failed_unique
    }

    /// 是否存在唯一索引缺失（正确性退化）
    pub fn is_degraded(&self) -> bool {
        !self.failed_unique.is_empty()
    }
}

/// 幂等创建一组索引，逐个隔离失败
pub async fn ensure_indexes(
    collection: &dyn DocumentCollection,
    specs: &[IndexSpec],
) -> IndexReport {
    let mut report = IndexReport::default();
    for spec in specs {
        match collection.create_index(spec).await {
            Ok(()) => {
                debug!(
                    collection = collection.name(),
                    index = spec.name(),
                    unique = spec.is_unique(),
                    "index provisioned"
                );
                report.provisioned.push(spec.name().to_string());
            }
            Err(err) if spec.is_unique() => {
                error!(
                    collection = collection.name(),
                    index = spec.name(),
                    %err,
                    "unique index provisioning failed; duplicate records will not be rejected"
                );
                report.failed_unique.push(spec.name().to_string());
            }
            Err(err) => {
                warn!(
                    collection = collection.name(),
                    index = spec.name(),
                    %err,
                    "index provisioning failed"
                );
                report.failed.push(spec.name().to_string());
            }
        }
    }
    report
}
