// ==========================================
// 目录数据交换 - 目录记录 Repository
// ==========================================
// 职责: catalog_record 表的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 红线: 所有查询按 (tenant_id, kind) 限定，不跨租户
// ==========================================

use crate::db::open_and_init;
use crate::domain::catalog::{fold_code, CatalogRecord};
use crate::domain::types::{CatalogKind, TenantId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, kind, code, name, description, active,
           attributes_json, created_at, updated_at
    FROM catalog_record
"#;

// ==========================================
// 行映射
// ==========================================
fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn map_catalog_row(row: &Row<'_>) -> rusqlite::Result<CatalogRecord> {
    let kind_raw: String = row.get(2)?;
    let kind = kind_raw.parse::<CatalogKind>().map_err(|e| conversion_error(2, e))?;

    let attributes_raw: String = row.get(7)?;
    let attributes: Map<String, Value> = serde_json::from_str(&attributes_raw)
        .map_err(|e| conversion_error(7, format!("attributes_json 解析失败: {}", e)))?;

    Ok(CatalogRecord {
        id: row.get(0)?,
        tenant_id: TenantId::new(row.get::<_, String>(1)?),
        kind,
        code: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        active: row.get(6)?,
        attributes,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// ==========================================
// TenantScope - 租户限定的只读视图
// ==========================================
// 可建立在普通连接或事务之上（Transaction 解引用为 Connection），
// 在事务内使用时能看到该事务已写入的数据
pub struct TenantScope<'a> {
    conn: &'a Connection,
    tenant: &'a TenantId,
    kind: CatalogKind,
}

impl<'a> TenantScope<'a> {
    pub fn new(conn: &'a Connection, tenant: &'a TenantId, kind: CatalogKind) -> Self {
        Self { conn, tenant, kind }
    }

    /// 按自然键查找（忽略大小写与首尾空白）
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<CatalogRecord>> {
        let sql = format!(
            "{} WHERE tenant_id = ?1 AND kind = ?2 AND code_folded = ?3",
            SELECT_COLUMNS
        );
        let record = self
            .conn
            .query_row(
                &sql,
                params![self.tenant.as_str(), self.kind.as_str(), fold_code(code)],
                map_catalog_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 列出当前租户该种类的全部记录（按 code 排序）
    pub fn list(&self) -> RepositoryResult<Vec<CatalogRecord>> {
        let sql = format!(
            "{} WHERE tenant_id = ?1 AND kind = ?2 ORDER BY code_folded, code",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![self.tenant.as_str(), self.kind.as_str()],
            map_catalog_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM catalog_record WHERE tenant_id = ?1 AND kind = ?2",
            params![self.tenant.as_str(), self.kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// ==========================================
// CatalogRepository
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 打开数据库文件并确保 schema 存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已打开的连接（调用方负责 schema 初始化）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在同一连接上执行只读的租户限定查询
    pub fn with_scope<R, F>(&self, tenant: &TenantId, kind: CatalogKind, f: F) -> RepositoryResult<R>
    where
        F: FnOnce(&TenantScope<'_>) -> RepositoryResult<R>,
    {
        let conn = self.get_conn()?;
        let scope = TenantScope::new(&conn, tenant, kind);
        f(&scope)
    }

    /// 在一个事务中执行 f；f 返回 Err 时整体回滚
    pub fn with_transaction<R, F>(&self, f: F) -> RepositoryResult<R>
    where
        F: FnOnce(&Transaction<'_>) -> RepositoryResult<R>,
    {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 失败时 tx 被 drop，自动回滚
        let value = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(value)
    }

    pub fn find_by_code(
        &self,
        tenant: &TenantId,
        kind: CatalogKind,
        code: &str,
    ) -> RepositoryResult<Option<CatalogRecord>> {
        self.with_scope(tenant, kind, |scope| scope.find_by_code(code))
    }

    pub fn list_by_tenant(
        &self,
        tenant: &TenantId,
        kind: CatalogKind,
    ) -> RepositoryResult<Vec<CatalogRecord>> {
        self.with_scope(tenant, kind, |scope| scope.list())
    }

    pub fn count(&self, tenant: &TenantId, kind: CatalogKind) -> RepositoryResult<usize> {
        self.with_scope(tenant, kind, |scope| scope.count())
    }

    /// 单条插入（自带事务）
    pub fn insert(&self, record: &CatalogRecord) -> RepositoryResult<()> {
        self.with_transaction(|tx| insert_record_tx(tx, record))
    }
}

/// 在事务中插入一条记录
pub fn insert_record_tx(conn: &Connection, record: &CatalogRecord) -> RepositoryResult<()> {
    let attributes_json = serde_json::to_string(&record.attributes)?;
    conn.execute(
        r#"
        INSERT INTO catalog_record (
            id, tenant_id, kind, code, code_folded, name, description,
            active, attributes_json, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            record.id,
            record.tenant_id.as_str(),
            record.kind.as_str(),
            record.code,
            record.code_folded(),
            record.name,
            record.description,
            record.active,
            attributes_json,
            record.created_at,
            record.updated_at,
        ],
    )?;
    Ok(())
}

/// 在事务中按 id 更新一条记录（code 与租户不变）
pub fn update_record_tx(conn: &Connection, record: &CatalogRecord) -> RepositoryResult<()> {
    let attributes_json = serde_json::to_string(&record.attributes)?;
    let affected = conn.execute(
        r#"
        UPDATE catalog_record
        SET name = ?1, description = ?2, active = ?3,
            attributes_json = ?4, updated_at = ?5
        WHERE id = ?6 AND tenant_id = ?7
        "#,
        params![
            record.name,
            record.description,
            record.active,
            attributes_json,
            record.updated_at,
            record.id,
            record.tenant_id.as_str(),
        ],
    )?;

    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "catalog_record".to_string(),
            id: record.id.clone(),
        });
    }
    Ok(())
}
