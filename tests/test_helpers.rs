// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、工作簿构造等功能
// ==========================================
#![allow(dead_code)]

use catalog_exchange::db::open_and_init;
use catalog_exchange::importer::workbook_codec;
use catalog_exchange::repository::CatalogRepository;
use catalog_exchange::{default_registry, CatalogImportApi, InMemoryStagingStore};
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("非 UTF-8 路径")?.to_string();

    // 初始化 schema
    open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 打开测试仓储
pub fn open_repo(db_path: &str) -> Arc<CatalogRepository> {
    Arc::new(CatalogRepository::new(db_path).expect("打开测试数据库失败"))
}

/// 创建测试 API（默认注册表 + 进程内暂存）
pub fn create_test_api(repo: Arc<CatalogRepository>) -> CatalogImportApi {
    CatalogImportApi::new(
        Arc::new(default_registry()),
        repo,
        Arc::new(InMemoryStagingStore::from_minutes(20)),
    )
}

/// 构造工作簿（第一行为表头）
pub fn workbook(header: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
    workbook_codec::encode("Hoja", &header, &body).expect("构造工作簿失败")
}

pub const CARD_TYPE_HEADER: [&str; 4] = ["Código", "Nombre", "Descripción", "Activo"];

pub const INSURER_HEADER: [&str; 6] = ["Código", "Nombre", "Descripción", "Activo", "NIT", "Teléfono"];

pub const SUPPLY_HEADER: [&str; 5] = ["Código", "Nombre", "Descripción", "Activo", "Unidad de Medida"];
