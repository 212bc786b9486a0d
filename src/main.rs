// ==========================================
// 目录数据交换 - 命令行入口
// ==========================================
// 用法:
//   catalog-exchange template <kind> <out_dir>
//   catalog-exchange export <kind> <tenant> <out_dir>
//   catalog-exchange import <kind> <tenant> <file>
//
// 数据库路径与暂存有效期来自环境变量（见 config::settings）
// ==========================================

use anyhow::{bail, Context};
use catalog_exchange::catalogs::{
    AffiliationRegimeRow, CardTypeRow, CareCenterRow, CatalogRow, EthnicAffiliationRow,
    InsurerRow, SupplyRow, UserConditionRow,
};
use catalog_exchange::{logging, CatalogImportApi, CatalogKind, ExportFile, Settings, TenantId};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const USAGE: &str = "用法:
  catalog-exchange template <kind> <out_dir>
  catalog-exchange export <kind> <tenant> <out_dir>
  catalog-exchange import <kind> <tenant> <file>

kind: insurer | care_center | user_condition | supply | ethnic_affiliation | affiliation_regime | card_type";

/// 按目录种类分派到对应的行类型
macro_rules! dispatch {
    ($kind:expr, $func:ident ( $($arg:expr),* )) => {
        match $kind {
            CatalogKind::Insurer => $func::<InsurerRow>($($arg),*).await,
            CatalogKind::CareCenter => $func::<CareCenterRow>($($arg),*).await,
            CatalogKind::UserCondition => $func::<UserConditionRow>($($arg),*).await,
            CatalogKind::Supply => $func::<SupplyRow>($($arg),*).await,
            CatalogKind::EthnicAffiliation => $func::<EthnicAffiliationRow>($($arg),*).await,
            CatalogKind::AffiliationRegime => $func::<AffiliationRegimeRow>($($arg),*).await,
            CatalogKind::CardType => $func::<CardTypeRow>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let settings = Settings::from_env();
    tracing::debug!(db_path = %settings.db_path, version = catalog_exchange::VERSION, "启动");

    match args.as_slice() {
        ["template", kind, out_dir] => {
            let api = CatalogImportApi::from_settings(&settings)?;
            let kind = parse_kind(kind)?;
            dispatch!(kind, run_template(&api, Path::new(out_dir)))
        }
        ["export", kind, tenant, out_dir] => {
            let api = CatalogImportApi::from_settings(&settings)?;
            let kind = parse_kind(kind)?;
            let tenant = TenantId::new(*tenant);
            dispatch!(kind, run_export(&api, &tenant, Path::new(out_dir)))
        }
        ["import", kind, tenant, file] => {
            let api = CatalogImportApi::from_settings(&settings)?;
            let kind = parse_kind(kind)?;
            let tenant = TenantId::new(*tenant);
            dispatch!(kind, run_import(&api, &tenant, Path::new(file)))
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn parse_kind(raw: &str) -> anyhow::Result<CatalogKind> {
    raw.parse::<CatalogKind>().map_err(anyhow::Error::msg)
}

fn write_file(out_dir: &Path, file: &ExportFile) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("无法创建输出目录 {}", out_dir.display()))?;
    let path = out_dir.join(&file.file_name);
    std::fs::write(&path, &file.bytes)
        .with_context(|| format!("无法写入文件 {}", path.display()))?;
    Ok(path)
}

async fn run_template<V: CatalogRow>(api: &CatalogImportApi, out_dir: &Path) -> anyhow::Result<()> {
    let file = api.template::<V>()?;
    let path = write_file(out_dir, &file)?;
    println!("{}", path.display());
    Ok(())
}

async fn run_export<V: CatalogRow>(
    api: &CatalogImportApi,
    tenant: &TenantId,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let file = api.export::<V>(tenant)?;
    let path = write_file(out_dir, &file)?;
    println!("{}", path.display());
    Ok(())
}

async fn run_import<V: CatalogRow>(
    api: &CatalogImportApi,
    tenant: &TenantId,
    file: &Path,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("无法读取文件 {}", file.display()))?;
    let session = Uuid::new_v4().to_string();

    let preview = api.preview::<V>(tenant, &session, &bytes).await?;
    println!(
        "total_rows={} processed={} skipped={}",
        preview.total_rows, preview.processed, preview.skipped
    );
    for warning in &preview.warnings {
        println!("warning: {}", warning);
    }
    for error in &preview.errors {
        println!("error: {}", error);
    }

    if !preview.staged {
        bail!("文件未通过校验，未提交任何数据");
    }

    let summary = api.commit::<V>(tenant, &session).await?;
    println!("committed={}", summary.processed);
    Ok(())
}
