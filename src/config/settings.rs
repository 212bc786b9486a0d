// ==========================================
// 目录数据交换 - 进程级设置
// ==========================================
// 来源: 环境变量（优先）→ 默认值
// - CATALOG_EXCHANGE_DB_PATH: 数据库文件路径
// - CATALOG_EXCHANGE_STAGING_TTL_MINUTES: 暂存槽有效期（分钟）
// ==========================================

use std::path::PathBuf;
use tracing::warn;

pub const DB_PATH_ENV: &str = "CATALOG_EXCHANGE_DB_PATH";
pub const STAGING_TTL_ENV: &str = "CATALOG_EXCHANGE_STAGING_TTL_MINUTES";

/// 暂存槽默认有效期（与会话超时一致）
pub const DEFAULT_STAGING_TTL_MINUTES: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: String,
    pub staging_ttl_minutes: i64,
}

impl Settings {
    /// 从环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_db_path);

        let staging_ttl_minutes = match lookup(STAGING_TTL_ENV) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    warn!(value = %raw, "暂存有效期配置非法，使用默认值");
                    DEFAULT_STAGING_TTL_MINUTES
                }
            },
            None => DEFAULT_STAGING_TTL_MINUTES,
        };

        Self {
            db_path,
            staging_ttl_minutes,
        }
    }
}

/// 默认数据库路径（用户数据目录，取不到时回退到当前目录）
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./catalog_exchange.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("catalog-exchange");
        // 确保目录存在
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("catalog_exchange.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_explicit_values_win() {
        let env = HashMap::from([
            (DB_PATH_ENV, " /tmp/catalogos.db "),
            (STAGING_TTL_ENV, "45"),
        ]);

        let settings = Settings::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.db_path, "/tmp/catalogos.db");
        assert_eq!(settings.staging_ttl_minutes, 45);
    }

    #[test]
    fn test_invalid_ttl_falls_back() {
        let env = HashMap::from([(DB_PATH_ENV, "x.db"), (STAGING_TTL_ENV, "-3")]);

        let settings = Settings::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.staging_ttl_minutes, DEFAULT_STAGING_TTL_MINUTES);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None);

        assert!(settings.db_path.ends_with("catalog_exchange.db"));
        assert_eq!(settings.staging_ttl_minutes, DEFAULT_STAGING_TTL_MINUTES);
    }
}
