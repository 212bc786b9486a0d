// ==========================================
// 目录数据交换 - 目录记录实体
// ==========================================
// 职责: 所有可对账目录记录的统一形态
// 红线: 同一租户、同一种类下 code 忽略大小写唯一
// ==========================================

use crate::domain::types::{CatalogKind, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ==========================================
// CatalogRecord - 目录记录 (catalog_record 表)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub tenant_id: TenantId,
    pub kind: CatalogKind,
    pub code: String,                  // 自然键
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub attributes: Map<String, Value>, // 种类专属字段（如税号、计量单位）
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogRecord {
    /// 创建新记录（id 与 created_at 自动生成）
    pub fn new(
        tenant_id: TenantId,
        kind: CatalogKind,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            kind,
            code: code.into(),
            name: name.into(),
            description: None,
            active: true,
            attributes: Map::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// 自然键的比较形式（忽略大小写）
    pub fn code_folded(&self) -> String {
        fold_code(&self.code)
    }

    /// 读取种类专属字符串属性
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// 写入种类专属字符串属性（None 则移除）
    pub fn set_attribute(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(v) => {
                self.attributes.insert(key.to_string(), Value::String(v));
            }
            None => {
                self.attributes.remove(key);
            }
        }
    }
}

/// 自然键折叠: 去除首尾空白并转小写
pub fn fold_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_code_ignores_case_and_padding() {
        assert_eq!(fold_code(" ABC "), fold_code("abc"));
        assert_eq!(fold_code("Ñandú"), "ñandú");
    }

    #[test]
    fn test_set_attribute_removes_on_none() {
        let mut record = CatalogRecord::new(TenantId::from("1"), CatalogKind::Supply, "S1", "Gasa");
        record.set_attribute("unit", Some("caja".to_string()));
        assert_eq!(record.attribute_str("unit"), Some("caja"));

        record.set_attribute("unit", None);
        assert_eq!(record.attribute_str("unit"), None);
    }
}
