// ==========================================
// 目录数据交换 - 目录导入/导出 API
// ==========================================
// 职责: 两阶段上传（preview → commit）、导出、模板下载
// 流程:
// - preview: 解析 + 校验；零错误时把数据写入暂存槽
// - commit: 读取暂存槽 → 对账 → 无论结果如何都清除暂存槽
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::catalogs::configs::default_registry;
use crate::catalogs::rows::CatalogRow;
use crate::config::registry::ConfigurationRegistry;
use crate::config::settings::Settings;
use crate::domain::catalog::fold_code;
use crate::domain::import::ImportResult;
use crate::domain::types::TenantId;
use crate::engine::reconciliation::ReconciliationService;
use crate::importer::tabular_engine::{export_file_name, template_file_name, TabularEngine};
use crate::repository::catalog_repo::CatalogRepository;
use crate::staging::{staging_key, InMemoryStagingStore, StagingError, StagingStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 预览响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    /// 数据行总数（不含表头）
    pub total_rows: usize,
    /// 通过校验的行数
    pub processed: usize,
    /// 被跳过或拒绝的行数
    pub skipped: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 是否已写入暂存槽（可提交）
    pub staged: bool,
}

impl ImportPreview {
    fn from_result<T>(result: &ImportResult<T>, staged: bool) -> Self {
        Self {
            total_rows: result.total_rows,
            processed: result.processed(),
            skipped: result.skipped(),
            errors: result.errors.clone(),
            warnings: result.warnings.clone(),
            staged,
        }
    }
}

/// 提交响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// 新建 + 更新的记录数
    pub processed: usize,
}

/// 生成的文件（导出 / 模板）
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 目录导入/导出API
pub struct CatalogImportApi {
    registry: Arc<ConfigurationRegistry>,
    engine: TabularEngine,
    repo: Arc<CatalogRepository>,
    reconciler: ReconciliationService,
    staging: Arc<dyn StagingStore>,
}

impl CatalogImportApi {
    pub fn new(
        registry: Arc<ConfigurationRegistry>,
        repo: Arc<CatalogRepository>,
        staging: Arc<dyn StagingStore>,
    ) -> Self {
        Self {
            registry,
            engine: TabularEngine::new(),
            reconciler: ReconciliationService::new(repo.clone()),
            repo,
            staging,
        }
    }

    /// 按进程设置装配（默认注册表 + SQLite + 进程内暂存）
    pub fn from_settings(settings: &Settings) -> ApiResult<Self> {
        let repo = CatalogRepository::new(&settings.db_path)?;
        info!(db_path = %settings.db_path, "目录数据库已打开");

        Ok(Self::new(
            Arc::new(default_registry()),
            Arc::new(repo),
            Arc::new(InMemoryStagingStore::from_minutes(settings.staging_ttl_minutes)),
        ))
    }

    /// 阶段一: 解析上传文件并暂存
    ///
    /// # 参数
    /// - tenant: 当前租户
    /// - session: 会话标识（暂存槽按 种类 + 租户 + 会话 区分）
    /// - file_bytes: 上传的 .xlsx 文件内容
    ///
    /// # 返回
    /// - Ok(ImportPreview): 行级汇总；staged=true 表示可提交
    /// - Err(ApiError::MalformedWorkbook): 文件不可读
    pub async fn preview<V: CatalogRow>(
        &self,
        tenant: &TenantId,
        session: &str,
        file_bytes: &[u8],
    ) -> ApiResult<ImportPreview> {
        if file_bytes.is_empty() {
            return Err(ApiError::MalformedWorkbook("上传文件为空".to_string()));
        }

        let cfg = self.registry.import_config::<V>()?;
        let mut result = self.engine.import(file_bytes, cfg)?;
        let duplicates = duplicate_key_warnings(&result);
        result.warnings.extend(duplicates);

        let kind = V::KIND;
        let key = staging_key(kind, tenant, session);
        let staged = !result.has_errors() && !result.data.is_empty();
        if staged {
            let value = serde_json::to_value(&result.data).map_err(StagingError::from)?;
            self.staging.set(&key, value).await?;
        } else {
            // 旧的暂存数据不得在失败的预览之后被提交
            self.staging.clear(&key).await?;
        }

        info!(
            kind = %kind,
            tenant = %tenant,
            total = result.total_rows,
            processed = result.processed(),
            errors = result.errors.len(),
            staged,
            "预览完成"
        );

        Ok(ImportPreview::from_result(&result, staged))
    }

    /// 阶段二: 提交暂存数据
    ///
    /// # 返回
    /// - Ok(CommitSummary): 新建 + 更新条数
    /// - Err(ApiError::NothingStaged): 暂存槽为空或已过期
    /// - Err(ApiError::CommitFailed): 整批回滚，无部分写入
    pub async fn commit<V: CatalogRow>(
        &self,
        tenant: &TenantId,
        session: &str,
    ) -> ApiResult<CommitSummary> {
        let key = staging_key(V::KIND, tenant, session);
        let Some(value) = self.staging.get(&key).await? else {
            return Err(ApiError::NothingStaged { key });
        };

        let outcome = serde_json::from_value::<Vec<V>>(value)
            .map_err(|e| ApiError::InternalError(format!("暂存数据无法还原: {}", e)))
            .and_then(|records| {
                self.reconciler
                    .reconcile_rows(&records, tenant)
                    .map_err(ApiError::from)
            });

        if let Err(e) = self.staging.clear(&key).await {
            warn!(key = %key, error = %e, "暂存槽清除失败");
        }

        let processed = outcome?;
        info!(key = %key, processed, "提交完成");
        Ok(CommitSummary { processed })
    }

    /// 导出租户的全部目录记录（按代码排序）
    pub fn export<V: CatalogRow>(&self, tenant: &TenantId) -> ApiResult<ExportFile> {
        let cfg = self.registry.export_config::<V>()?;
        let rows: Vec<V> = self
            .repo
            .list_by_tenant(tenant, V::KIND)?
            .iter()
            .map(V::from_record)
            .collect();

        let bytes = self.engine.export(&rows, cfg)?;
        Ok(ExportFile {
            file_name: export_file_name(cfg, Utc::now()),
            bytes,
        })
    }

    /// 空白导入模板（表头 + 示例行）
    pub fn template<V: CatalogRow>(&self) -> ApiResult<ExportFile> {
        let cfg = self.registry.import_config::<V>()?;
        let bytes = self.engine.generate_template(cfg)?;
        Ok(ExportFile {
            file_name: template_file_name(cfg, Utc::now()),
            bytes,
        })
    }
}

/// 同一文件内自然键重复的提示（不移除任何行）
pub fn duplicate_key_warnings<V: CatalogRow>(result: &ImportResult<V>) -> Vec<String> {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for (row_number, item) in result.rows() {
        match first_seen.entry(fold_code(item.code())) {
            Entry::Occupied(first) => warnings.push(format!(
                "Row {}: code '{}' repeats row {}; the commit will be rejected",
                row_number,
                item.code(),
                first.get()
            )),
            Entry::Vacant(slot) => {
                slot.insert(row_number);
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::rows::{CatalogBasics, UserConditionRow};

    fn condition(code: &str) -> UserConditionRow {
        UserConditionRow {
            basics: CatalogBasics::new(code, "Condición"),
        }
    }

    #[test]
    fn test_duplicate_warnings_use_sheet_rows() {
        let mut result = ImportResult::default();
        result.accept(condition("GEST"), 2);
        result.accept(condition("LACT"), 3);
        result.accept(condition("gest"), 5);

        assert_eq!(
            duplicate_key_warnings(&result),
            vec!["Row 5: code 'gest' repeats row 2; the commit will be rejected".to_string()]
        );
    }
}
