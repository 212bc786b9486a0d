// ==========================================
// 目录数据交换 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + xlsx
// 系统定位: 多租户目录数据的 Excel 导入/导出与按自然键对账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 工作簿编解码与表格引擎
pub mod importer;

// 配置层 - 表格配置与进程设置
pub mod config;

// 目录层 - 各目录的行类型与配置
pub mod catalogs;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 对账
pub mod engine;

// 暂存层 - preview 与 commit 之间的暂存槽
pub mod staging;

// API 层 - 业务接口
pub mod api;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{fold_code, CatalogKind, CatalogRecord, ImportResult, TenantId};

// 目录
pub use catalogs::{
    default_registry, AffiliationRegimeRow, CardTypeRow, CareCenterRow, CatalogBasics,
    CatalogRow, EthnicAffiliationRow, InsurerRow, SupplyRow, UserConditionRow,
};

// 配置
pub use config::{ConfigurationRegistry, ExportConfiguration, ImportConfiguration, Settings};

// 引擎
pub use engine::{ReconcileError, ReconciliationService};
pub use importer::{ImportError, TabularEngine};

// 暂存
pub use staging::{staging_key, InMemoryStagingStore, StagingStore};

// API
pub use api::{ApiError, CatalogImportApi, CommitSummary, ExportFile, ImportPreview};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "目录数据交换";
