//! L1 micro-cache.
//!
//! 프로세스 로컬의 짧은 TTL 캐시입니다. 같은 심볼을 연달아 조회할 때
//! 내구성 저장소 왕복을 줄입니다. 백그라운드 정리는 없고 읽을 때 만료를 확인합니다.

use chrono::{DateTime, Duration, Utc};
use quote_core::QuoteView;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct MicroEntry {
    view: QuoteView,
    expires_at: DateTime<Utc>,
}

/// 캐시 키 → (뷰, 만료 시각).
#[derive(Debug, Default)]
pub struct MicroCache {
    entries: RwLock<HashMap<String, MicroEntry>>,
}

impl MicroCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 유효한 뷰를 가져옵니다.
    ///
    /// 만료 시각이 `now` 이하이면 만료로 보고 제거합니다 (TTL 0은 즉시 만료).
    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> Option<QuoteView> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > now => return Some(entry.view.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    /// 뷰를 저장합니다.
    pub async fn set(&self, key: &str, view: QuoteView, ttl_secs: u64, now: DateTime<Utc>) {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::zero());
        let expires_at = now.checked_add_signed(ttl).unwrap_or(now);

        self.entries
            .write()
            .await
            .insert(key.to_string(), MicroEntry { view, expires_at });
    }

    /// 모든 항목을 제거합니다.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// 저장된 항목 수 (만료 여부 무관).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quote_core::{Market, ReasonCode, SymbolKey};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 26, 2, 0, 0).unwrap()
    }

    fn view() -> QuoteView {
        QuoteView::missing(&SymbolKey::new("2330", "2330", Market::Tw), ReasonCode::KvMiss)
    }

    #[tokio::test]
    async fn test_get_within_ttl() {
        let cache = MicroCache::new();
        cache.set("quote:TW:2330", view(), 20, now()).await;

        let hit = cache.get("quote:TW:2330", now() + Duration::seconds(19)).await;
        assert_eq!(hit, Some(view()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let cache = MicroCache::new();
        cache.set("quote:TW:2330", view(), 20, now()).await;

        assert!(cache.get("quote:TW:2330", now() + Duration::seconds(20)).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MicroCache::new();
        cache.set("k", view(), 0, now()).await;
        assert!(cache.get("k", now()).await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MicroCache::new();
        cache.set("a", view(), 20, now()).await;
        cache.set("b", view(), 20, now()).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.get("a", now()).await.is_none());
    }
}
