// ==========================================
// 目录数据交换 - 目录类型
// ==========================================
// 职责: 各目录的行类型、结构约束、导入/导出配置
// ==========================================

pub mod configs;
pub mod rows;

pub use configs::default_registry;
pub use rows::{
    AffiliationRegimeRow, CardTypeRow, CareCenterRow, CatalogBasics, CatalogRow,
    EthnicAffiliationRow, InsurerRow, SupplyRow, UserConditionRow,
};
