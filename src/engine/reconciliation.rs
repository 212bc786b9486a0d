// ==========================================
// 目录数据交换 - 对账引擎 (Upsert by natural key)
// ==========================================
// 职责: 将已校验的行数据按自然键合并进租户数据
// 状态: Scanning → Classifying → Persisting → Committed | RolledBack
// 红线: 全部插入与更新在同一个事务内，任一失败整体回滚
// 红线: 严格顺序处理，不做批内并行
// 已知行为: 同一批次内自然键重复的两行都会被归为 create
//          （分类只查询事务开始前已持久化的数据），提交时由唯一索引拒绝
// ==========================================

use crate::catalogs::rows::CatalogRow;
use crate::domain::catalog::CatalogRecord;
use crate::domain::types::{CatalogKind, TenantId};
use crate::repository::catalog_repo::{
    insert_record_tx, update_record_tx, CatalogRepository, TenantScope,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 对账阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    Scanning,
    Classifying,
    Persisting,
    Committed,
    RolledBack,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconcileStage::Scanning => "SCANNING",
            ReconcileStage::Classifying => "CLASSIFYING",
            ReconcileStage::Persisting => "PERSISTING",
            ReconcileStage::Committed => "COMMITTED",
            ReconcileStage::RolledBack => "ROLLED_BACK",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// 批次整体回滚，无任何部分写入
    #[error("对账失败，已整体回滚 (阶段={stage}): {source}")]
    Persistence {
        stage: ReconcileStage,
        #[source]
        source: RepositoryError,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// 单批次分类结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub created: usize,
    pub updated: usize,
}

impl ReconcileCounts {
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }
}

// ==========================================
// ReconciliationService
// ==========================================
pub struct ReconciliationService {
    repo: Arc<CatalogRepository>,
}

impl ReconciliationService {
    pub fn new(repo: Arc<CatalogRepository>) -> Self {
        Self { repo }
    }

    /// 对账（调用方提供 create / update / find_existing 策略）
    ///
    /// # 参数
    /// - kind: 目录种类，新建记录时由服务注入
    /// - records: 已校验的行数据（按给定顺序处理）
    /// - tenant: 当前租户，新建记录时由服务注入
    /// - create: 行 → 新实体
    /// - update: 以行数据原地修改已有实体
    /// - find_existing: 在租户限定视图中查找已有实体
    ///
    /// # 返回
    /// created + updated 的条数
    #[instrument(skip_all, fields(kind = %kind, tenant = %tenant, records = records.len()))]
    pub fn reconcile<V, C, U, F>(
        &self,
        kind: CatalogKind,
        records: &[V],
        tenant: &TenantId,
        create: C,
        update: U,
        find_existing: F,
    ) -> ReconcileResult<usize>
    where
        C: Fn(&V) -> CatalogRecord,
        U: Fn(&V, &mut CatalogRecord),
        F: Fn(&V, &TenantScope<'_>) -> RepositoryResult<Option<CatalogRecord>>,
    {
        let mut stage = ReconcileStage::Scanning;
        debug!(stage = %stage, "开始对账");

        let outcome = self.repo.with_transaction(|tx| {
            let scope = TenantScope::new(tx, tenant, kind);

            stage = ReconcileStage::Classifying;
            let mut inserts = Vec::new();
            let mut updates = Vec::new();
            for record in records {
                match find_existing(record, &scope)? {
                    Some(mut existing) => {
                        update(record, &mut existing);
                        existing.updated_at = Some(Utc::now());
                        updates.push(existing);
                    }
                    None => {
                        let mut created = create(record);
                        created.tenant_id = tenant.clone();
                        created.kind = kind;
                        inserts.push(created);
                    }
                }
            }
            debug!(
                stage = %stage,
                created = inserts.len(),
                updated = updates.len(),
                "分类完成"
            );

            stage = ReconcileStage::Persisting;
            for record in &inserts {
                insert_record_tx(tx, record)?;
            }
            for record in &updates {
                update_record_tx(tx, record)?;
            }

            Ok(ReconcileCounts {
                created: inserts.len(),
                updated: updates.len(),
            })
        });

        match outcome {
            Ok(counts) => {
                info!(
                    stage = %ReconcileStage::Committed,
                    created = counts.created,
                    updated = counts.updated,
                    "对账已提交"
                );
                Ok(counts.processed())
            }
            Err(source) => {
                warn!(
                    stage = %ReconcileStage::RolledBack,
                    failed_at = %stage,
                    error = %source,
                    "对账失败，事务已回滚"
                );
                Err(ReconcileError::Persistence { stage, source })
            }
        }
    }

    /// 使用行类型的默认策略对账（按 code 忽略大小写匹配）
    pub fn reconcile_rows<V: CatalogRow>(
        &self,
        records: &[V],
        tenant: &TenantId,
    ) -> ReconcileResult<usize> {
        self.reconcile(
            V::KIND,
            records,
            tenant,
            |row| row.to_new_record(tenant),
            |row, existing| row.apply_to(existing),
            |row, scope| scope.find_by_code(row.code()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::rows::{CardTypeRow, CatalogBasics};
    use crate::db::{configure_sqlite_connection, init_schema};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn service() -> (ReconciliationService, Arc<CatalogRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let repo = Arc::new(CatalogRepository::from_connection(Arc::new(Mutex::new(conn))));
        (ReconciliationService::new(repo.clone()), repo)
    }

    fn card(code: &str, name: &str) -> CardTypeRow {
        CardTypeRow {
            basics: CatalogBasics::new(code, name),
        }
    }

    #[test]
    fn test_second_run_updates_instead_of_creating() {
        let (service, repo) = service();
        let tenant = TenantId::from("t1");
        let rows = vec![card("CC", "Cédula"), card("TI", "Tarjeta de identidad")];

        assert_eq!(service.reconcile_rows(&rows, &tenant).unwrap(), 2);
        let first = repo.list_by_tenant(&tenant, CatalogKind::CardType).unwrap();

        assert_eq!(service.reconcile_rows(&rows, &tenant).unwrap(), 2);
        let second = repo.list_by_tenant(&tenant, CatalogKind::CardType).unwrap();

        assert_eq!(second.len(), 2);
        assert_eq!(first[0].id, second[0].id);
        assert!(second.iter().all(|r| r.updated_at.is_some()));
    }

    #[test]
    fn test_service_injects_tenant_and_kind() {
        let (service, repo) = service();
        let tenant = TenantId::from("t1");
        let rows = vec![card("CE", "Cédula de extranjería")];

        let processed = service
            .reconcile(
                CatalogKind::CardType,
                &rows,
                &tenant,
                |row| {
                    CatalogRecord::new(
                        TenantId::from("someone-else"),
                        CatalogKind::Supply,
                        row.basics.code.clone(),
                        row.basics.name.clone(),
                    )
                },
                |_, _| {},
                |row, scope| scope.find_by_code(&row.basics.code),
            )
            .unwrap();

        assert_eq!(processed, 1);
        assert_eq!(repo.count(&tenant, CatalogKind::CardType).unwrap(), 1);
        assert_eq!(repo.count(&TenantId::from("someone-else"), CatalogKind::Supply).unwrap(), 0);
    }

    #[test]
    fn test_batch_duplicates_roll_back_everything() {
        let (service, repo) = service();
        let tenant = TenantId::from("t1");
        let rows = vec![card("PA", "Pasaporte"), card("RC", "Registro civil"), card("rc", "Repetido")];

        let err = service.reconcile_rows(&rows, &tenant).unwrap_err();

        let ReconcileError::Persistence { stage, source } = err;
        assert_eq!(stage, ReconcileStage::Persisting);
        assert!(matches!(source, RepositoryError::UniqueConstraintViolation(_)));
        assert_eq!(repo.count(&tenant, CatalogKind::CardType).unwrap(), 0);
    }

    #[test]
    fn test_lookup_failure_rolls_back() {
        let (service, repo) = service();
        let tenant = TenantId::from("t1");
        let rows = vec![card("PA", "Pasaporte")];

        let err = service
            .reconcile(
                CatalogKind::CardType,
                &rows,
                &tenant,
                |row| row.to_new_record(&tenant),
                |row, existing| row.apply_to(existing),
                |_, _| Err(RepositoryError::DatabaseQueryError("lookup".to_string())),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Persistence {
                stage: ReconcileStage::Classifying,
                ..
            }
        ));
        assert_eq!(repo.count(&tenant, CatalogKind::CardType).unwrap(), 0);
    }

    #[test]
    fn test_empty_batch_commits_nothing() {
        let (service, _) = service();
        let rows: Vec<CardTypeRow> = Vec::new();
        assert_eq!(service.reconcile_rows(&rows, &TenantId::from("t1")).unwrap(), 0);
    }
}
