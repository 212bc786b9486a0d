// ==========================================
// 目录数据交换 - 表格导入/导出配置
// ==========================================
// 职责: 每种记录类型一份的静态配置（启动时构建，之后只读）
// 导入可配置项: sheet_name / column_mappings / permitted_values /
//              example_rows / row_mapper / row_validator / skip_blank_rows
// 导出可配置项: sheet_name / file_name_stem / column_mappings / row_projector
// ==========================================

use crate::importer::data_cleaner::RawRow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 行映射函数: 原始行 → 记录
///
/// - Ok(Some(T)): 进入校验
/// - Ok(None): 非数据行，静默跳过（不记错误）
/// - Err: 降级为行级错误 "Row N: error processing data - ..."
pub type RowMapper<T> = Box<dyn Fn(&RawRow) -> anyhow::Result<Option<T>> + Send + Sync>;

/// 业务校验函数: (记录, 行号) → 错误信息列表
pub type RowValidator<T> = Box<dyn Fn(&T, usize) -> Vec<String> + Send + Sync>;

/// 导出投影函数: 记录 → 字段键 → 文本
pub type RowProjector<T> = Box<dyn Fn(&T) -> HashMap<String, String> + Send + Sync>;

// ==========================================
// ColumnMapping - 字段键 ↔ 表头
// ==========================================
// 顺序即导出列顺序，也是导入按位置解析的顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub key: String,
    pub header: String,
}

/// 由 (字段键, 表头) 列表构建有序列映射
pub fn column_mappings(pairs: &[(&str, &str)]) -> Vec<ColumnMapping> {
    pairs
        .iter()
        .map(|(key, header)| ColumnMapping {
            key: key.to_string(),
            header: header.to_string(),
        })
        .collect()
}

// ==========================================
// ImportConfiguration
// ==========================================
pub struct ImportConfiguration<T> {
    pub sheet_name: String,
    pub column_mappings: Vec<ColumnMapping>,
    /// 字段允许值清单（仅供说明，解析时不强制）
    pub permitted_values: BTreeMap<String, Vec<String>>,
    /// 模板示例行（原样写入，不校验）
    pub example_rows: Vec<Vec<String>>,
    pub row_mapper: RowMapper<T>,
    pub row_validator: Option<RowValidator<T>>,
    pub skip_blank_rows: bool,
}

impl<T> ImportConfiguration<T> {
    /// 创建导入配置（默认跳过空行）
    pub fn new<F>(sheet_name: &str, column_mappings: Vec<ColumnMapping>, row_mapper: F) -> Self
    where
        F: Fn(&RawRow) -> anyhow::Result<Option<T>> + Send + Sync + 'static,
    {
        Self {
            sheet_name: sheet_name.to_string(),
            column_mappings,
            permitted_values: BTreeMap::new(),
            example_rows: Vec::new(),
            row_mapper: Box::new(row_mapper),
            row_validator: None,
            skip_blank_rows: true,
        }
    }

    pub fn with_permitted_values(mut self, key: &str, values: &[&str]) -> Self {
        self.permitted_values
            .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_example_row(mut self, row: &[&str]) -> Self {
        self.example_rows
            .push(row.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_row_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T, usize) -> Vec<String> + Send + Sync + 'static,
    {
        self.row_validator = Some(Box::new(validator));
        self
    }

    pub fn with_skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }

    /// 按列顺序的表头
    pub fn headers(&self) -> Vec<String> {
        self.column_mappings.iter().map(|c| c.header.clone()).collect()
    }

    /// 字段允许值（无则 None）
    pub fn permitted_values_for(&self, key: &str) -> Option<&[String]> {
        self.permitted_values.get(key).map(Vec::as_slice)
    }
}

impl<T> fmt::Debug for ImportConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfiguration")
            .field("sheet_name", &self.sheet_name)
            .field("column_mappings", &self.column_mappings)
            .field("permitted_values", &self.permitted_values)
            .field("example_rows", &self.example_rows.len())
            .field("has_row_validator", &self.row_validator.is_some())
            .field("skip_blank_rows", &self.skip_blank_rows)
            .finish()
    }
}

// ==========================================
// ExportConfiguration
// ==========================================
pub struct ExportConfiguration<T> {
    pub sheet_name: String,
    pub file_name_stem: String,
    pub column_mappings: Vec<ColumnMapping>,
    /// 缺省时按字段键在序列化结果中查找
    pub row_projector: Option<RowProjector<T>>,
}

impl<T> ExportConfiguration<T> {
    pub fn new(sheet_name: &str, file_name_stem: &str, column_mappings: Vec<ColumnMapping>) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            file_name_stem: file_name_stem.to_string(),
            column_mappings,
            row_projector: None,
        }
    }

    pub fn with_row_projector<F>(mut self, projector: F) -> Self
    where
        F: Fn(&T) -> HashMap<String, String> + Send + Sync + 'static,
    {
        self.row_projector = Some(Box::new(projector));
        self
    }

    pub fn headers(&self) -> Vec<String> {
        self.column_mappings.iter().map(|c| c.header.clone()).collect()
    }
}

impl<T> fmt::Debug for ExportConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfiguration")
            .field("sheet_name", &self.sheet_name)
            .field("file_name_stem", &self.file_name_stem)
            .field("column_mappings", &self.column_mappings)
            .field("has_row_projector", &self.row_projector.is_some())
            .finish()
    }
}
