// ==========================================
// 目录数据交换 - 表格导入/导出引擎
// ==========================================
// 职责: 编排编解码器 + 类型配置，生成导出文件/空白模板，
//       并把上传文件解析为带行号的校验结果
// 流程: 解码 → 表头核对 → 按位置映射 → 空行跳过 → 行映射 → 结构校验 → 业务校验
// 红线: 行级错误只累积不抛出，单行失败不影响其余行
// ==========================================

use crate::config::tabular_config::{ColumnMapping, ExportConfiguration, ImportConfiguration};
use crate::domain::import::ImportResult;
use crate::importer::data_cleaner::RawRow;
use crate::importer::error::{EngineResult, ImportError};
use crate::importer::field_rules::{validate_structure, value_text, FieldRules};
use crate::importer::workbook_codec::{self, column_name};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// 导出/模板文件名中的时间戳格式
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ==========================================
// TabularEngine - 无状态，按记录类型泛型化
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularEngine;

impl TabularEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出记录集合为工作簿
    ///
    /// 每条记录优先使用 row_projector；未配置时按字段键在序列化结果中查找。
    /// 缺失字段输出空串，不报错。
    #[instrument(skip_all, fields(sheet = %cfg.sheet_name, items = items.len()))]
    pub fn export<T: Serialize>(
        &self,
        items: &[T],
        cfg: &ExportConfiguration<T>,
    ) -> EngineResult<Vec<u8>> {
        let rows = items
            .iter()
            .map(|item| project_row(item, cfg))
            .collect::<EngineResult<Vec<_>>>()?;

        let bytes = workbook_codec::encode(&cfg.sheet_name, &cfg.headers(), &rows)?;
        info!(rows = rows.len(), bytes = bytes.len(), "导出完成");
        Ok(bytes)
    }

    /// 生成空白导入模板（表头 + 示例行，示例行原样写入）
    #[instrument(skip_all, fields(sheet = %cfg.sheet_name))]
    pub fn generate_template<T>(&self, cfg: &ImportConfiguration<T>) -> EngineResult<Vec<u8>> {
        let bytes = workbook_codec::encode(&cfg.sheet_name, &cfg.headers(), &cfg.example_rows)?;
        for mapping in &cfg.column_mappings {
            if let Some(values) = cfg.permitted_values_for(&mapping.key) {
                debug!(column = %mapping.header, permitted = ?values, "列允许值");
            }
        }
        debug!(examples = cfg.example_rows.len(), "模板生成完成");
        Ok(bytes)
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 解析上传文件
    ///
    /// # 返回
    /// - Ok(ImportResult): 行级汇总（data / errors / warnings / total_rows）
    /// - Err(MalformedWorkbook): 文件不可读，整个导入中止
    ///
    /// # 行号
    /// 表头为第 1 行，第一条数据行报告为第 2 行。
    #[instrument(skip_all, fields(sheet = %cfg.sheet_name, bytes = file_bytes.len()))]
    pub fn import<T>(
        &self,
        file_bytes: &[u8],
        cfg: &ImportConfiguration<T>,
    ) -> EngineResult<ImportResult<T>>
    where
        T: Serialize + FieldRules,
    {
        let mut rows = workbook_codec::decode(file_bytes)?.into_iter();
        let mut result = ImportResult::default();

        // 第一行始终视为表头
        let Some(header_row) = rows.next() else {
            result.warnings.push("The file contains no rows".to_string());
            return Ok(result);
        };
        check_header(&header_row, &cfg.column_mappings, &mut result.warnings);

        let data_rows: Vec<Vec<String>> = rows.collect();
        result.total_rows = data_rows.len();
        if data_rows.is_empty() {
            result.warnings.push("The file contains no data rows".to_string());
        }

        for (idx, cells) in data_rows.into_iter().enumerate() {
            let row_number = idx + 2;
            let raw = zip_row(&cfg.column_mappings, cells);

            if cfg.skip_blank_rows && raw.values().all(|v| v.trim().is_empty()) {
                debug!(row_number, "空行跳过");
                continue;
            }

            let item = match (cfg.row_mapper)(&raw) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!(row_number, "非数据行，静默跳过");
                    continue;
                }
                Err(e) => {
                    warn!(row_number, error = %e, "行映射失败");
                    result
                        .errors
                        .push(format!("Row {}: error processing data - {:#}", row_number, e));
                    continue;
                }
            };

            let mut row_errors = validate_structure(&item, row_number);
            // 业务校验只在结构校验通过后执行（业务规则可依赖必填字段存在）
            if row_errors.is_empty() {
                if let Some(validator) = &cfg.row_validator {
                    row_errors = validator(&item, row_number);
                }
            }

            if row_errors.is_empty() {
                result.accept(item, row_number);
            } else {
                debug!(row_number, errors = row_errors.len(), "行校验未通过");
                result.errors.extend(row_errors);
            }
        }

        info!(
            total = result.total_rows,
            processed = result.processed(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "导入解析完成"
        );

        Ok(result)
    }
}

// ==========================================
// 文件命名
// ==========================================

/// 导出文件名: {file_name_stem}_{yyyyMMdd_HHmmss}.xlsx（UTC）
pub fn export_file_name<T>(cfg: &ExportConfiguration<T>, at: DateTime<Utc>) -> String {
    format!("{}_{}.xlsx", cfg.file_name_stem, at.format(FILE_TIMESTAMP_FORMAT))
}

/// 模板文件名: Plantilla_{去空白的 sheet_name}_{yyyyMMdd_HHmmss}.xlsx（UTC）
pub fn template_file_name<T>(cfg: &ImportConfiguration<T>, at: DateTime<Utc>) -> String {
    let compact: String = cfg.sheet_name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("Plantilla_{}_{}.xlsx", compact, at.format(FILE_TIMESTAMP_FORMAT))
}

// ==========================================
// 辅助函数
// ==========================================

/// 导出: 记录 → 按列顺序的文本行
fn project_row<T: Serialize>(item: &T, cfg: &ExportConfiguration<T>) -> EngineResult<Vec<String>> {
    if let Some(projector) = &cfg.row_projector {
        let projected = projector(item);
        return Ok(cfg
            .column_mappings
            .iter()
            .map(|c| projected.get(&c.key).cloned().unwrap_or_default())
            .collect());
    }

    let fields = match serde_json::to_value(item)
        .map_err(|e| ImportError::InternalError(format!("记录序列化失败: {}", e)))?
    {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    Ok(cfg
        .column_mappings
        .iter()
        .map(|c| fields.get(&c.key).map(value_text).unwrap_or_default())
        .collect())
}

/// 导入: 按位置把列映射键与单元格拼成原始行（缺少的尾部单元格为空串）
fn zip_row(mappings: &[ColumnMapping], cells: Vec<String>) -> RawRow {
    let mut cells = cells.into_iter();
    mappings
        .iter()
        .map(|m| (m.key.clone(), cells.next().unwrap_or_default()))
        .collect()
}

/// 表头核对（只产生警告，解析仍按位置进行）
fn check_header(header_row: &[String], mappings: &[ColumnMapping], warnings: &mut Vec<String>) {
    for (idx, mapping) in mappings.iter().enumerate() {
        let actual = header_row.get(idx).map(|h| h.trim()).unwrap_or("");
        if actual.to_lowercase() != mapping.header.trim().to_lowercase() {
            warnings.push(format!(
                "Column {}: expected header '{}' but found '{}'",
                column_name(idx + 1),
                mapping.header,
                actual
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tabular_config::column_mappings;
    use crate::importer::data_cleaner::{cell_or_empty, cell_text};
    use crate::importer::field_rules::FieldRule;
    use chrono::TimeZone;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        code: String,
        name: String,
        note: Option<String>,
    }

    impl FieldRules for Item {
        const FIELD_RULES: &'static [FieldRule] = &[
            FieldRule::new("code", "Code").required().max_length(10),
            FieldRule::new("name", "Name").required(),
        ];
    }

    fn mappings() -> Vec<ColumnMapping> {
        column_mappings(&[("code", "Code"), ("name", "Name"), ("note", "Note")])
    }

    fn import_config() -> ImportConfiguration<Item> {
        ImportConfiguration::new("Items", mappings(), |row| {
            if cell_text(row, "code").as_deref() == Some("#") {
                return Ok(None);
            }
            if cell_text(row, "code").as_deref() == Some("BOOM") {
                anyhow::bail!("unreadable code");
            }
            Ok(Some(Item {
                code: cell_or_empty(row, "code"),
                name: cell_or_empty(row, "name"),
                note: cell_text(row, "note"),
            }))
        })
    }

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let header = vec!["Code".to_string(), "Name".to_string(), "Note".to_string()];
        let body: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        workbook_codec::encode("Items", &header, &body).unwrap()
    }

    #[test]
    fn test_partial_failure_isolation() {
        let bytes = workbook(&[
            &["A1", "Alfa", ""],
            &["B2", "Beta", ""],
            &["C3-TOO-LONG-CODE", "Gamma", ""],
            &["D4", "Delta", "nota"],
        ]);

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.total_rows, 4);
        assert_eq!(result.data.len(), 3);
        assert_eq!(result.skipped(), 1);
        assert_eq!(
            result.errors,
            vec!["Row 4: Code cannot exceed 10 characters".to_string()]
        );
        assert_eq!(result.data[2].note.as_deref(), Some("nota"));
        assert_eq!(result.source_rows, vec![2, 3, 5]);
    }

    #[test]
    fn test_blank_rows_are_counted_but_silent() {
        let bytes = workbook(&[&["A1", "Alfa", ""], &["", "", ""], &["B2", "Beta", ""]]);

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.data.len(), 2);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_trailing_blank_row_is_counted() {
        let bytes = workbook(&[&["A1", "Alfa", ""], &["", "", ""]]);

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.total_rows, 2);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.skipped(), 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_blank_rows_validated_when_not_skipped() {
        let bytes = workbook(&[&["A1", "Alfa", ""], &["", "", ""], &["B2", "Beta", ""]]);
        let cfg = import_config().with_skip_blank_rows(false);

        let result = TabularEngine::new().import(&bytes, &cfg).unwrap();

        assert_eq!(result.data.len(), 2);
        assert_eq!(
            result.errors,
            vec![
                "Row 3: Code is required".to_string(),
                "Row 3: Name is required".to_string()
            ]
        );
    }

    #[test]
    fn test_mapper_none_and_failure() {
        let bytes = workbook(&[&["#", "comentario", ""], &["BOOM", "x", ""], &["A1", "Alfa", ""]]);

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.data.len(), 1);
        assert_eq!(
            result.errors,
            vec!["Row 3: error processing data - unreadable code".to_string()]
        );
    }

    #[test]
    fn test_business_validation_runs_after_structure() {
        let cfg = import_config().with_row_validator(|item: &Item, row| {
            if item.name.eq_ignore_ascii_case("prohibido") {
                vec![format!("Row {}: name '{}' is reserved", row, item.name)]
            } else {
                Vec::new()
            }
        });
        let bytes = workbook(&[&["A1", "Prohibido", ""], &["", "Prohibido", ""], &["B2", "Beta", ""]]);

        let result = TabularEngine::new().import(&bytes, &cfg).unwrap();

        assert_eq!(result.data.len(), 1);
        assert_eq!(
            result.errors,
            vec![
                "Row 2: name 'Prohibido' is reserved".to_string(),
                "Row 3: Code is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_trailing_cells_map_to_empty() {
        let bytes = workbook(&[&["A1", "Alfa"]]);

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.data[0].note, None);
    }

    #[test]
    fn test_header_mismatch_only_warns() {
        let header = vec!["Codigo".to_string(), "name".to_string()];
        let bytes = workbook_codec::encode(
            "Items",
            &header,
            &[vec!["A1".to_string(), "Alfa".to_string()]],
        )
        .unwrap();

        let result = TabularEngine::new().import(&bytes, &import_config()).unwrap();

        assert_eq!(result.data.len(), 1);
        assert_eq!(
            result.warnings,
            vec![
                "Column A: expected header 'Code' but found 'Codigo'".to_string(),
                "Column C: expected header 'Note' but found ''".to_string(),
            ]
        );
    }

    #[test]
    fn test_header_only_file_warns() {
        let result = TabularEngine::new()
            .import(&workbook(&[]), &import_config())
            .unwrap();

        assert_eq!(result.total_rows, 0);
        assert_eq!(result.warnings, vec!["The file contains no data rows".to_string()]);
    }

    #[test]
    fn test_malformed_workbook_aborts() {
        let result = TabularEngine::new().import(b"PK-not-really", &import_config());
        assert!(matches!(result, Err(ImportError::MalformedWorkbook(_))));
    }

    #[test]
    fn test_export_reflection_and_projector() {
        let items = vec![
            Item {
                code: "A1".to_string(),
                name: "Alfa".to_string(),
                note: None,
            },
            Item {
                code: "B2".to_string(),
                name: "Beta".to_string(),
                note: Some("x".to_string()),
            },
        ];
        let engine = TabularEngine::new();

        // 按字段键查找（note 为 null → 空串）
        let cfg = ExportConfiguration::new("Items", "Items", mappings());
        let decoded = workbook_codec::decode(&engine.export(&items, &cfg).unwrap()).unwrap();
        assert_eq!(decoded[0], vec!["Code", "Name", "Note"]);
        assert_eq!(decoded[1], vec!["A1", "Alfa", ""]);
        assert_eq!(decoded[2], vec!["B2", "Beta", "x"]);

        // 投影函数 + 不存在的字段键
        let cfg = ExportConfiguration::new(
            "Items",
            "Items",
            column_mappings(&[("label", "Label"), ("missing", "Missing")]),
        )
        .with_row_projector(|item: &Item| {
            HashMap::from([("label".to_string(), format!("{} - {}", item.code, item.name))])
        });
        let decoded = workbook_codec::decode(&engine.export(&items, &cfg).unwrap()).unwrap();
        assert_eq!(decoded[1][0], "A1 - Alfa");
        assert_eq!(decoded[0], vec!["Label", "Missing"]);
    }

    #[test]
    fn test_template_contains_header_and_examples() {
        let cfg = import_config().with_example_row(&["EJ1", "Ejemplo", "no se valida"]);

        let bytes = TabularEngine::new().generate_template(&cfg).unwrap();
        let decoded = workbook_codec::decode(&bytes).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], vec!["Code", "Name", "Note"]);
        assert_eq!(decoded[1], vec!["EJ1", "Ejemplo", "no se valida"]);
    }

    #[test]
    fn test_file_names() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let export_cfg: ExportConfiguration<Item> =
            ExportConfiguration::new("Items", "Aseguradoras", mappings());
        let import_cfg = ImportConfiguration::<Item>::new("Centros de Atención", mappings(), |_| Ok(None));

        assert_eq!(export_file_name(&export_cfg, at), "Aseguradoras_20240309_070501.xlsx");
        assert_eq!(
            template_file_name(&import_cfg, at),
            "Plantilla_CentrosdeAtención_20240309_070501.xlsx"
        );
    }
}
