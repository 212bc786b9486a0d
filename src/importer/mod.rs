// ==========================================
// 目录数据交换 - 导入/导出层
// ==========================================
// 职责: 工作簿编解码、单元格清洗、结构校验、表格引擎
// 支持: Excel (.xlsx，单工作表，字符串单元格)
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_rules;
pub mod tabular_engine;
pub mod workbook_codec;

// 重导出核心类型
pub use data_cleaner::RawRow;
pub use error::{EngineResult, ImportError};
pub use field_rules::{validate_structure, FieldRule, FieldRules};
pub use tabular_engine::{export_file_name, template_file_name, TabularEngine};
pub use workbook_codec::{column_name, decode, encode};
