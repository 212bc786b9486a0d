// ==========================================
// 目录数据交换 - 领域模型层
// ==========================================
// 职责: 定义目录实体、租户/种类类型、导入结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod import;
pub mod types;

// 重导出核心类型
pub use catalog::{fold_code, CatalogRecord};
pub use import::ImportResult;
pub use types::{CatalogKind, TenantId};
