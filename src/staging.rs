// ==========================================
// 目录数据交换 - 暂存槽 (preview → commit)
// ==========================================
// 职责: 在预览与提交之间保存已校验的行数据
// 红线: 暂存由调用方注入，不使用全局状态
// 约束: 每个会话单写者；槽位过期后视为不存在
// ==========================================

use crate::domain::types::{CatalogKind, TenantId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("暂存锁获取失败: {0}")]
    LockError(String),

    #[error("暂存数据序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StagingResult<T> = Result<T, StagingError>;

/// 暂存键: catalog_import:{kind}:{tenant}:{session}
pub fn staging_key(kind: CatalogKind, tenant: &TenantId, session: &str) -> String {
    format!("catalog_import:{}:{}:{}", kind.as_str(), tenant, session)
}

// ==========================================
// StagingStore Trait
// ==========================================
// 实现者: InMemoryStagingStore（进程内，带有效期）
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// 读取槽位（不存在或已过期返回 None）
    async fn get(&self, key: &str) -> StagingResult<Option<Value>>;

    /// 写入槽位（覆盖旧值并重置有效期）
    async fn set(&self, key: &str, value: Value) -> StagingResult<()>;

    /// 清除槽位（不存在时无操作）
    async fn clear(&self, key: &str) -> StagingResult<()>;
}

struct StagedSlot {
    value: Value,
    expires_at: DateTime<Utc>,
}

// ==========================================
// InMemoryStagingStore
// ==========================================
pub struct InMemoryStagingStore {
    slots: Mutex<HashMap<String, StagedSlot>>,
    ttl: Duration,
}

impl InMemoryStagingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    /// 移除所有已过期槽位，返回移除数量
    pub fn purge_expired(&self) -> StagingResult<usize> {
        let mut slots = self.lock()?;
        Ok(purge_locked(&mut slots, Utc::now()))
    }

    fn lock(&self) -> StagingResult<std::sync::MutexGuard<'_, HashMap<String, StagedSlot>>> {
        self.slots
            .lock()
            .map_err(|e| StagingError::LockError(e.to_string()))
    }
}

fn purge_locked(slots: &mut HashMap<String, StagedSlot>, now: DateTime<Utc>) -> usize {
    let before = slots.len();
    slots.retain(|_, slot| slot.expires_at > now);
    before - slots.len()
}

#[async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn get(&self, key: &str) -> StagingResult<Option<Value>> {
        let mut slots = self.lock()?;
        let expired = match slots.get(key) {
            Some(slot) if slot.expires_at > Utc::now() => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(key = %key, "暂存槽已过期");
            slots.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value) -> StagingResult<()> {
        let mut slots = self.lock()?;
        let now = Utc::now();
        // 未提交的预览不会再被读取，写入时顺带回收
        let purged = purge_locked(&mut slots, now);
        if purged > 0 {
            debug!(purged, "过期暂存槽已回收");
        }
        slots.insert(
            key.to_string(),
            StagedSlot {
                value,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self, key: &str) -> StagingResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_staging_key_format() {
        let key = staging_key(CatalogKind::CareCenter, &TenantId::from("42"), "sess-1");
        assert_eq!(key, "catalog_import:care_center:42:sess-1");
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = InMemoryStagingStore::from_minutes(20);

        store.set("k", json!([{"code": "A"}])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!([{"code": "A"}])));

        store.clear("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // 清除不存在的键无副作用
        store.clear("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_slot_is_gone() {
        let store = InMemoryStagingStore::new(Duration::zero());

        store.set("k", json!(1)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k2", json!(2)).await.unwrap();
        assert_eq!(store.purge_expired().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_reclaims_abandoned_slots() {
        let store = InMemoryStagingStore::new(Duration::milliseconds(50));

        store.set("abandoned", json!(1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        store.set("fresh", json!(2)).await.unwrap();

        let slots = store.slots.lock().unwrap();
        assert!(!slots.contains_key("abandoned"));
        assert!(slots.contains_key("fresh"));
    }
}
