// ==========================================
// 目录数据交换 - 各目录的导入/导出配置
// ==========================================
// 职责: 启动时为每种目录构建一次配置并注册
// 约定: 列顺序 = 代码 / 名称 / 描述 / 启用 / 种类专属列
// ==========================================

use crate::catalogs::rows::{
    AffiliationRegimeRow, CardTypeRow, CareCenterRow, CatalogBasics, CatalogRow,
    EthnicAffiliationRow, InsurerRow, SupplyRow, UserConditionRow,
};
use crate::config::registry::ConfigurationRegistry;
use crate::config::tabular_config::{
    column_mappings, ColumnMapping, ExportConfiguration, ImportConfiguration,
};
use crate::importer::data_cleaner::{cell_text, format_active_flag, parse_active_flag, RawRow};
use anyhow::Context;
use std::collections::HashMap;

const BASIC_COLUMNS: [(&str, &str); 4] = [
    ("code", "Código"),
    ("name", "Nombre"),
    ("description", "Descripción"),
    ("active", "Activo"),
];

const ACTIVE_VALUES: [&str; 2] = ["SI", "NO"];

const SUPPLY_UNITS: [&str; 6] = ["Unidad", "Caja", "Frasco", "Ampolla", "Sobre", "Rollo"];

/// 构建包含全部目录配置的注册表
pub fn default_registry() -> ConfigurationRegistry {
    let mut registry = ConfigurationRegistry::new();

    registry
        .register_import(insurer_import())
        .register_export(insurer_export())
        .register_import(care_center_import())
        .register_export(care_center_export())
        .register_import(supply_import())
        .register_export(supply_export())
        .register_import(basic_import("Condiciones de Usuario", |basics| UserConditionRow { basics }))
        .register_export(basic_export::<UserConditionRow>("Condiciones de Usuario", "CondicionesUsuario"))
        .register_import(basic_import("Pertenencias Étnicas", |basics| EthnicAffiliationRow { basics }))
        .register_export(basic_export::<EthnicAffiliationRow>("Pertenencias Étnicas", "PertenenciasEtnicas"))
        .register_import(basic_import("Regímenes de Afiliación", |basics| AffiliationRegimeRow { basics }))
        .register_export(basic_export::<AffiliationRegimeRow>("Regímenes de Afiliación", "RegimenesAfiliacion"))
        .register_import(basic_import("Tipos de Carné", |basics| CardTypeRow { basics }))
        .register_export(basic_export::<CardTypeRow>("Tipos de Carné", "TiposCarne"));

    registry
}

// ==========================================
// 通用部分
// ==========================================

fn columns_with(extra: &[(&str, &str)]) -> Vec<ColumnMapping> {
    let mut pairs: Vec<(&str, &str)> = BASIC_COLUMNS.to_vec();
    pairs.extend_from_slice(extra);
    column_mappings(&pairs)
}

/// 通用字段映射
///
/// 代码与名称都为空时视为非数据行（返回 None，静默跳过）。
fn map_basics(row: &RawRow) -> anyhow::Result<Option<CatalogBasics>> {
    let code = cell_text(row, "code");
    let name = cell_text(row, "name");
    if code.is_none() && name.is_none() {
        return Ok(None);
    }

    let active = parse_active_flag(row.get("active").cloned())
        .context("invalid value in column Activo")?;

    Ok(Some(CatalogBasics {
        code: code.unwrap_or_default(),
        name: name.unwrap_or_default(),
        description: cell_text(row, "description"),
        active,
    }))
}

/// 代码不得包含空白（所有目录共用的业务规则）
fn validate_code<T: CatalogRow>(item: &T, row_number: usize) -> Vec<String> {
    if item.code().chars().any(char::is_whitespace) {
        vec![format!("Row {}: Código must not contain spaces", row_number)]
    } else {
        Vec::new()
    }
}

fn project_basics(basics: &CatalogBasics) -> HashMap<String, String> {
    HashMap::from([
        ("code".to_string(), basics.code.clone()),
        ("name".to_string(), basics.name.clone()),
        (
            "description".to_string(),
            basics.description.clone().unwrap_or_default(),
        ),
        (
            "active".to_string(),
            format_active_flag(basics.active).to_string(),
        ),
    ])
}

fn basic_import<T, F>(sheet_name: &str, wrap: F) -> ImportConfiguration<T>
where
    T: CatalogRow,
    F: Fn(CatalogBasics) -> T + Send + Sync + 'static,
{
    ImportConfiguration::new(sheet_name, columns_with(&[]), move |row| {
        Ok(map_basics(row)?.map(&wrap))
    })
    .with_permitted_values("active", &ACTIVE_VALUES)
    .with_example_row(&["01", "Ejemplo", "Descripción de ejemplo", "SI"])
    .with_row_validator(validate_code::<T>)
}

fn basic_export<T: CatalogRow>(sheet_name: &str, stem: &str) -> ExportConfiguration<T> {
    ExportConfiguration::new(sheet_name, stem, columns_with(&[]))
        .with_row_projector(|item: &T| project_basics(item.basics()))
}

// ==========================================
// 保险机构
// ==========================================

const INSURER_EXTRA: [(&str, &str); 2] = [("tax_id", "NIT"), ("phone", "Teléfono")];

pub fn insurer_import() -> ImportConfiguration<InsurerRow> {
    ImportConfiguration::new("Aseguradoras", columns_with(&INSURER_EXTRA), |row| {
        Ok(map_basics(row)?.map(|basics| InsurerRow {
            basics,
            tax_id: cell_text(row, "tax_id"),
            phone: cell_text(row, "phone"),
        }))
    })
    .with_permitted_values("active", &ACTIVE_VALUES)
    .with_example_row(&["EPS001", "Aseguradora Ejemplo", "", "SI", "900123456-7", "6015550000"])
    .with_row_validator(|item: &InsurerRow, row_number| {
        let mut errors = validate_code(item, row_number);
        if let Some(tax_id) = &item.tax_id {
            if !tax_id.chars().all(|c| c.is_ascii_digit() || c == '-') {
                errors.push(format!(
                    "Row {}: NIT must contain only digits and '-'",
                    row_number
                ));
            }
        }
        errors
    })
}

pub fn insurer_export() -> ExportConfiguration<InsurerRow> {
    ExportConfiguration::new("Aseguradoras", "Aseguradoras", columns_with(&INSURER_EXTRA))
        .with_row_projector(|item: &InsurerRow| {
            let mut row = project_basics(&item.basics);
            row.insert("tax_id".to_string(), item.tax_id.clone().unwrap_or_default());
            row.insert("phone".to_string(), item.phone.clone().unwrap_or_default());
            row
        })
}

// ==========================================
// 医疗服务点
// ==========================================

const CARE_CENTER_EXTRA: [(&str, &str); 2] = [("address", "Dirección"), ("municipality", "Municipio")];

pub fn care_center_import() -> ImportConfiguration<CareCenterRow> {
    ImportConfiguration::new("Centros de Atención", columns_with(&CARE_CENTER_EXTRA), |row| {
        Ok(map_basics(row)?.map(|basics| CareCenterRow {
            basics,
            address: cell_text(row, "address"),
            municipality: cell_text(row, "municipality"),
        }))
    })
    .with_permitted_values("active", &ACTIVE_VALUES)
    .with_example_row(&["CA01", "Centro Norte", "", "SI", "Calle 10 # 5-20", "Bogotá"])
    .with_row_validator(validate_code::<CareCenterRow>)
}

pub fn care_center_export() -> ExportConfiguration<CareCenterRow> {
    ExportConfiguration::new("Centros de Atención", "CentrosAtencion", columns_with(&CARE_CENTER_EXTRA))
        .with_row_projector(|item: &CareCenterRow| {
            let mut row = project_basics(&item.basics);
            row.insert("address".to_string(), item.address.clone().unwrap_or_default());
            row.insert(
                "municipality".to_string(),
                item.municipality.clone().unwrap_or_default(),
            );
            row
        })
}

// ==========================================
// 耗材
// ==========================================

const SUPPLY_EXTRA: [(&str, &str); 1] = [("unit_of_measure", "Unidad de Medida")];

pub fn supply_import() -> ImportConfiguration<SupplyRow> {
    ImportConfiguration::new("Insumos", columns_with(&SUPPLY_EXTRA), |row| {
        Ok(map_basics(row)?.map(|basics| SupplyRow {
            basics,
            unit_of_measure: cell_text(row, "unit_of_measure").unwrap_or_default(),
        }))
    })
    .with_permitted_values("active", &ACTIVE_VALUES)
    .with_permitted_values("unit_of_measure", &SUPPLY_UNITS)
    .with_example_row(&["GASA-01", "Gasa estéril", "Paquete x 10", "SI", "Caja"])
    .with_row_validator(validate_code::<SupplyRow>)
}

pub fn supply_export() -> ExportConfiguration<SupplyRow> {
    // 无投影函数: 按字段键直接取值（active 输出为 true/false，可原样再导入）
    ExportConfiguration::new("Insumos", "Insumos", columns_with(&SUPPLY_EXTRA))
}
