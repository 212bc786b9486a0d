// ==========================================
// 目录数据交换 - 配置层
// ==========================================
// 职责: 表格导入/导出配置、类型注册表、进程级设置
// 红线: 配置在启动时构建，之后只读
// ==========================================

pub mod registry;
pub mod settings;
pub mod tabular_config;

// 重导出核心配置类型
pub use registry::ConfigurationRegistry;
pub use settings::Settings;
pub use tabular_config::{
    column_mappings, ColumnMapping, ExportConfiguration, ImportConfiguration, RowMapper,
    RowProjector, RowValidator,
};
