// ==========================================
// 目录数据交换 - 单元格清洗
// ==========================================
// 职责: TRIM / NULL 标准化 / 状态标记解析
// 使用方: 各目录类型的行映射函数（RowMapper）
// ==========================================

use anyhow::bail;
use std::collections::HashMap;

/// 原始行（字段键 → 单元格文本）
pub type RawRow = HashMap<String, String>;

/// 读取并清洗单元格（TRIM，空白 → None）
pub fn cell_text(row: &RawRow, key: &str) -> Option<String> {
    normalize_null(row.get(key).cloned())
}

/// 读取单元格，缺失时返回空串（交给结构校验判定必填）
pub fn cell_or_empty(row: &RawRow, key: &str) -> String {
    cell_text(row, key).unwrap_or_default()
}

/// 标准化 NULL 值（空字符串/空白 → None）
pub fn normalize_null(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 解析启用标记
///
/// - 空值: 默认启用
/// - "SI"/"SÍ"/"S"/"1"/"Y"/"TRUE"/"ACTIVO" → true
/// - "NO"/"N"/"0"/"FALSE"/"INACTIVO" → false
/// - 其他: 报错（由引擎降级为行级错误）
pub fn parse_active_flag(value: Option<String>) -> anyhow::Result<bool> {
    let Some(raw) = normalize_null(value) else {
        return Ok(true);
    };

    match raw.to_uppercase().as_str() {
        "SI" | "SÍ" | "S" | "1" | "Y" | "YES" | "TRUE" | "ACTIVO" => Ok(true),
        "NO" | "N" | "0" | "FALSE" | "INACTIVO" => Ok(false),
        _ => bail!("unrecognized active flag '{}'", raw),
    }
}

/// 导出用的启用标记文本
pub fn format_active_flag(active: bool) -> &'static str {
    if active {
        "SI"
    } else {
        "NO"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cell_text_trims_and_nulls() {
        let raw = row(&[("code", "  A1 "), ("name", "   ")]);

        assert_eq!(cell_text(&raw, "code"), Some("A1".to_string()));
        assert_eq!(cell_text(&raw, "name"), None);
        assert_eq!(cell_text(&raw, "missing"), None);
        assert_eq!(cell_or_empty(&raw, "name"), "");
    }

    #[test]
    fn test_parse_active_flag() {
        assert!(parse_active_flag(None).unwrap());
        assert!(parse_active_flag(Some("sí".to_string())).unwrap());
        assert!(parse_active_flag(Some(" 1 ".to_string())).unwrap());
        assert!(!parse_active_flag(Some("No".to_string())).unwrap());
        assert!(!parse_active_flag(Some("inactivo".to_string())).unwrap());

        let err = parse_active_flag(Some("tal vez".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized active flag 'tal vez'");
    }
}
