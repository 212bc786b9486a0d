// ==========================================
// 目录数据交换 - 领域类型定义
// ==========================================
// 职责: 租户标识、目录种类
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 租户标识 (Tenant)
// ==========================================
// 红线: 引擎从不推断租户,始终由调用方提供
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ==========================================
// 目录种类 (Catalog Kind)
// ==========================================
// 序列化格式: snake_case (与数据库 kind 列一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Insurer,            // 保险机构
    CareCenter,         // 医疗服务点
    UserCondition,      // 用户状况
    Supply,             // 耗材
    EthnicAffiliation,  // 民族归属
    AffiliationRegime,  // 参保制度
    CardType,           // 证件类型
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 7] = [
        CatalogKind::Insurer,
        CatalogKind::CareCenter,
        CatalogKind::UserCondition,
        CatalogKind::Supply,
        CatalogKind::EthnicAffiliation,
        CatalogKind::AffiliationRegime,
        CatalogKind::CardType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Insurer => "insurer",
            CatalogKind::CareCenter => "care_center",
            CatalogKind::UserCondition => "user_condition",
            CatalogKind::Supply => "supply",
            CatalogKind::EthnicAffiliation => "ethnic_affiliation",
            CatalogKind::AffiliationRegime => "affiliation_regime",
            CatalogKind::CardType => "card_type",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        CatalogKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("未知目录种类: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_kind_parse() {
        assert_eq!("care-center".parse::<CatalogKind>(), Ok(CatalogKind::CareCenter));
        assert_eq!(" INSURER ".parse::<CatalogKind>(), Ok(CatalogKind::Insurer));
        assert!("vaccine".parse::<CatalogKind>().is_err());
    }

    #[test]
    fn test_catalog_kind_round_trip_through_str() {
        for kind in CatalogKind::ALL {
            assert_eq!(kind.as_str().parse::<CatalogKind>(), Ok(kind));
        }
    }
}
