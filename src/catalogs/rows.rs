// ==========================================
// 目录数据交换 - 目录行视图模型
// ==========================================
// 职责: 每种目录一份独立的行类型（导入/暂存/导出共用），
//       并声明结构约束与实体转换
// 红线: 更新时不改写已存储的自然键（保留原大小写）
// ==========================================

use crate::domain::catalog::CatalogRecord;
use crate::domain::types::{CatalogKind, TenantId};
use crate::importer::field_rules::{FieldRule, FieldRules};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ==========================================
// CatalogRow Trait
// ==========================================
pub trait CatalogRow:
    Serialize + DeserializeOwned + FieldRules + Clone + Send + Sync + 'static
{
    const KIND: CatalogKind;

    fn basics(&self) -> &CatalogBasics;

    /// 种类专属字段写入实体
    fn apply_attributes(&self, _record: &mut CatalogRecord) {}

    /// 实体 → 行（导出用）
    fn from_record(record: &CatalogRecord) -> Self;

    /// 自然键
    fn code(&self) -> &str {
        self.basics().code.trim()
    }

    /// 新建实体（create 策略）
    fn to_new_record(&self, tenant: &TenantId) -> CatalogRecord {
        let mut record = CatalogRecord::new(tenant.clone(), Self::KIND, self.code(), "");
        self.apply_to(&mut record);
        record
    }

    /// 以行数据覆盖已有实体（update 策略）
    fn apply_to(&self, record: &mut CatalogRecord) {
        let basics = self.basics();
        record.name = basics.name.trim().to_string();
        record.description = basics.description.clone();
        record.active = basics.active;
        self.apply_attributes(record);
    }
}

// ==========================================
// CatalogBasics - 所有目录共有字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBasics {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

impl CatalogBasics {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            active: true,
        }
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            active: record.active,
        }
    }
}

/// 通用约束: 代码必填 ≤10、名称必填 ≤150、描述 ≤500
const BASIC_RULES: [FieldRule; 3] = [
    FieldRule::new("code", "Código").required().max_length(10),
    FieldRule::new("name", "Nombre").required().max_length(150),
    FieldRule::new("description", "Descripción").max_length(500),
];

// ==========================================
// 保险机构 (Aseguradoras)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurerRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
    pub tax_id: Option<String>, // NIT
    pub phone: Option<String>,
}

impl FieldRules for InsurerRow {
    const FIELD_RULES: &'static [FieldRule] = &[
        BASIC_RULES[0],
        BASIC_RULES[1],
        BASIC_RULES[2],
        FieldRule::new("tax_id", "NIT").max_length(20),
        FieldRule::new("phone", "Teléfono").max_length(20),
    ];
}

impl CatalogRow for InsurerRow {
    const KIND: CatalogKind = CatalogKind::Insurer;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn apply_attributes(&self, record: &mut CatalogRecord) {
        record.set_attribute("tax_id", self.tax_id.clone());
        record.set_attribute("phone", self.phone.clone());
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
            tax_id: record.attribute_str("tax_id").map(str::to_string),
            phone: record.attribute_str("phone").map(str::to_string),
        }
    }
}

// ==========================================
// 医疗服务点 (Centros de Atención)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareCenterRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
    pub address: Option<String>,
    pub municipality: Option<String>,
}

impl FieldRules for CareCenterRow {
    const FIELD_RULES: &'static [FieldRule] = &[
        BASIC_RULES[0],
        BASIC_RULES[1],
        BASIC_RULES[2],
        FieldRule::new("address", "Dirección").max_length(200),
        FieldRule::new("municipality", "Municipio").required().max_length(100),
    ];
}

impl CatalogRow for CareCenterRow {
    const KIND: CatalogKind = CatalogKind::CareCenter;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn apply_attributes(&self, record: &mut CatalogRecord) {
        record.set_attribute("address", self.address.clone());
        record.set_attribute("municipality", self.municipality.clone());
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
            address: record.attribute_str("address").map(str::to_string),
            municipality: record.attribute_str("municipality").map(str::to_string),
        }
    }
}

// ==========================================
// 耗材 (Insumos)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
    pub unit_of_measure: String,
}

impl FieldRules for SupplyRow {
    const FIELD_RULES: &'static [FieldRule] = &[
        FieldRule::new("code", "Código").required().max_length(20),
        BASIC_RULES[1],
        BASIC_RULES[2],
        FieldRule::new("unit_of_measure", "Unidad de Medida").required().max_length(20),
    ];
}

impl CatalogRow for SupplyRow {
    const KIND: CatalogKind = CatalogKind::Supply;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn apply_attributes(&self, record: &mut CatalogRecord) {
        record.set_attribute("unit_of_measure", Some(self.unit_of_measure.clone()));
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
            unit_of_measure: record
                .attribute_str("unit_of_measure")
                .unwrap_or_default()
                .to_string(),
        }
    }
}

// ==========================================
// 仅含通用字段的目录
// ==========================================

/// 用户状况 (Condiciones de Usuario)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConditionRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
}

/// 民族归属 (Pertenencias Étnicas)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthnicAffiliationRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
}

/// 参保制度 (Regímenes de Afiliación)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliationRegimeRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
}

/// 证件类型 (Tipos de Carné)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTypeRow {
    #[serde(flatten)]
    pub basics: CatalogBasics,
}

impl FieldRules for UserConditionRow {
    const FIELD_RULES: &'static [FieldRule] = &BASIC_RULES;
}

impl FieldRules for EthnicAffiliationRow {
    const FIELD_RULES: &'static [FieldRule] = &BASIC_RULES;
}

impl FieldRules for AffiliationRegimeRow {
    const FIELD_RULES: &'static [FieldRule] = &BASIC_RULES;
}

impl FieldRules for CardTypeRow {
    const FIELD_RULES: &'static [FieldRule] = &BASIC_RULES;
}

impl CatalogRow for UserConditionRow {
    const KIND: CatalogKind = CatalogKind::UserCondition;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
        }
    }
}

impl CatalogRow for EthnicAffiliationRow {
    const KIND: CatalogKind = CatalogKind::EthnicAffiliation;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
        }
    }
}

impl CatalogRow for AffiliationRegimeRow {
    const KIND: CatalogKind = CatalogKind::AffiliationRegime;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
        }
    }
}

impl CatalogRow for CardTypeRow {
    const KIND: CatalogKind = CatalogKind::CardType;

    fn basics(&self) -> &CatalogBasics {
        &self.basics
    }

    fn from_record(record: &CatalogRecord) -> Self {
        Self {
            basics: CatalogBasics::from_record(record),
        }
    }
}
