// ==========================================
// 目录数据交换 - 配置注册表
// ==========================================
// 职责: 以记录类型标识（TypeId）为键保存导入/导出配置
// 生命周期: 启动时注册一次，之后只读（Arc 共享）
// ==========================================

use crate::config::tabular_config::{ExportConfiguration, ImportConfiguration};
use crate::importer::error::{EngineResult, ImportError};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use tracing::debug;

type ConfigSlot = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ConfigurationRegistry {
    imports: HashMap<TypeId, ConfigSlot>,
    exports: HashMap<TypeId, ConfigSlot>,
}

impl ConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册导入配置（同类型重复注册时后者覆盖）
    pub fn register_import<T: 'static>(&mut self, cfg: ImportConfiguration<T>) -> &mut Self {
        debug!(record_type = type_name::<T>(), sheet = %cfg.sheet_name, "注册导入配置");
        self.imports.insert(TypeId::of::<T>(), Box::new(cfg));
        self
    }

    /// 注册导出配置
    pub fn register_export<T: 'static>(&mut self, cfg: ExportConfiguration<T>) -> &mut Self {
        debug!(record_type = type_name::<T>(), sheet = %cfg.sheet_name, "注册导出配置");
        self.exports.insert(TypeId::of::<T>(), Box::new(cfg));
        self
    }

    /// 获取导入配置
    ///
    /// # 错误
    /// - ConfigurationNotFound: 该类型从未注册（程序错误）
    pub fn import_config<T: 'static>(&self) -> EngineResult<&ImportConfiguration<T>> {
        self.imports
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<ImportConfiguration<T>>())
            .ok_or(ImportError::ConfigurationNotFound {
                kind: "ImportConfiguration",
                type_name: type_name::<T>(),
            })
    }

    /// 获取导出配置
    pub fn export_config<T: 'static>(&self) -> EngineResult<&ExportConfiguration<T>> {
        self.exports
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<ExportConfiguration<T>>())
            .ok_or(ImportError::ConfigurationNotFound {
                kind: "ExportConfiguration",
                type_name: type_name::<T>(),
            })
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn export_count(&self) -> usize {
        self.exports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tabular_config::column_mappings;

    struct Alpha;
    struct Beta;

    #[test]
    fn test_lookup_by_type() {
        let mut registry = ConfigurationRegistry::new();
        registry.register_import::<Alpha>(ImportConfiguration::new(
            "Alfa",
            column_mappings(&[("code", "Código")]),
            |_| Ok(Some(Alpha)),
        ));
        registry.register_export::<Beta>(ExportConfiguration::new(
            "Beta",
            "Betas",
            column_mappings(&[("code", "Código")]),
        ));

        assert_eq!(registry.import_config::<Alpha>().unwrap().sheet_name, "Alfa");
        assert_eq!(registry.export_config::<Beta>().unwrap().file_name_stem, "Betas");
        assert_eq!(registry.import_count(), 1);
        assert_eq!(registry.export_count(), 1);
    }

    #[test]
    fn test_missing_configuration_is_reported() {
        let registry = ConfigurationRegistry::new();

        let err = registry.import_config::<Alpha>().unwrap_err();
        assert!(matches!(
            err,
            ImportError::ConfigurationNotFound { kind: "ImportConfiguration", .. }
        ));

        // 注册导入不代表注册导出
        let mut registry = ConfigurationRegistry::new();
        registry.register_import::<Beta>(ImportConfiguration::new(
            "Beta",
            column_mappings(&[("code", "Código")]),
            |_| Ok(Some(Beta)),
        ));
        assert!(registry.export_config::<Beta>().is_err());
    }
}
