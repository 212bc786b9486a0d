// ==========================================
// 目录数据交换 - API 层
// ==========================================
// 职责: 面向调用方（HTTP 层 / CLI）的业务接口
// 红线: 租户与会话始终由调用方提供
// ==========================================

pub mod catalog_import_api;
pub mod error;

pub use catalog_import_api::{
    duplicate_key_warnings, CatalogImportApi, CommitSummary, ExportFile, ImportPreview,
};
pub use error::{ApiError, ApiResult};
