// ==========================================
// 目录数据交换 - 结构校验（字段约束描述）
// ==========================================
// 职责: 以显式的字段约束描述替代运行时属性反射
// 规则: 必填 / 最大长度（按字符数）
// 输出: "Row N: <字段> is required" / "Row N: <字段> cannot exceed M characters"
// ==========================================

use serde::Serialize;
use serde_json::Value;

// ==========================================
// FieldRule - 单字段约束描述
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: &'static str,   // 序列化字段名
    pub label: &'static str, // 错误信息中的字段显示名
    pub required: bool,
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: false,
            max_length: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

// ==========================================
// FieldRules Trait - 挂在记录类型上的约束声明
// ==========================================
pub trait FieldRules {
    const FIELD_RULES: &'static [FieldRule];
}

/// 按类型声明的字段约束校验一条记录
///
/// # 参数
/// - item: 已映射的记录
/// - row_number: 行号（表头为第 1 行）
///
/// # 返回
/// - 空 Vec: 通过
/// - 非空: 每条约束违规一条错误信息
pub fn validate_structure<T>(item: &T, row_number: usize) -> Vec<String>
where
    T: Serialize + FieldRules,
{
    let fields = match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map,
        Ok(_) => serde_json::Map::new(),
        Err(e) => {
            return vec![format!(
                "Row {}: error processing data - {}",
                row_number, e
            )]
        }
    };

    let mut errors = Vec::new();
    for rule in T::FIELD_RULES {
        let text = fields.get(rule.key).map(value_text).unwrap_or_default();

        if rule.required && text.trim().is_empty() {
            errors.push(format!("Row {}: {} is required", row_number, rule.label));
            continue;
        }

        if let Some(max) = rule.max_length {
            if text.chars().count() > max {
                errors.push(format!(
                    "Row {}: {} cannot exceed {} characters",
                    row_number, rule.label, max
                ));
            }
        }
    }

    errors
}

/// JSON 值转文本（null → 空串）
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        code: String,
        name: Option<String>,
        quantity: u32,
    }

    impl FieldRules for Sample {
        const FIELD_RULES: &'static [FieldRule] = &[
            FieldRule::new("code", "Code").required().max_length(10),
            FieldRule::new("name", "Name").required(),
            FieldRule::new("quantity", "Quantity").max_length(3),
        ];
    }

    #[test]
    fn test_valid_record_passes() {
        let sample = Sample {
            code: "ABC".to_string(),
            name: Some("Alfa".to_string()),
            quantity: 12,
        };
        assert!(validate_structure(&sample, 2).is_empty());
    }

    #[test]
    fn test_required_and_max_length() {
        let sample = Sample {
            code: "ABCDEFGHIJK".to_string(),
            name: None,
            quantity: 1234,
        };

        let errors = validate_structure(&sample, 5);

        assert_eq!(
            errors,
            vec![
                "Row 5: Code cannot exceed 10 characters".to_string(),
                "Row 5: Name is required".to_string(),
                "Row 5: Quantity cannot exceed 3 characters".to_string(),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let sample = Sample {
            code: "   ".to_string(),
            name: Some("Alfa".to_string()),
            quantity: 1,
        };

        assert_eq!(validate_structure(&sample, 3), vec!["Row 3: Code is required".to_string()]);
    }

    #[test]
    fn test_max_length_counts_characters_not_bytes() {
        let sample = Sample {
            code: "ÑÑÑÑÑÑÑÑÑÑ".to_string(),
            name: Some("Alfa".to_string()),
            quantity: 1,
        };

        assert!(validate_structure(&sample, 2).is_empty());
    }
}
