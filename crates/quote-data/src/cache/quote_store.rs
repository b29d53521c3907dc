//! L2 시세 저장소.
//!
//! `DurableStore` 위에서 `QuoteRecord`를 JSON으로 읽고 씁니다.

use quote_core::QuoteRecord;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::storage::DurableStore;

/// 시세 레코드 저장소.
#[derive(Clone)]
pub struct QuoteStore {
    store: Arc<dyn DurableStore>,
}

impl QuoteStore {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// 레코드를 읽습니다.
    ///
    /// 역직렬화에 실패한 값은 없는 것으로 취급합니다. 저장소 통신 오류만 `Err`입니다.
    pub async fn get_quote(&self, key: &str) -> Result<Option<QuoteRecord>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<QuoteRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                debug!(key, error = %e, "Discarding undecodable cache record");
                Ok(None)
            }
        }
    }

    /// 레코드를 통째로 덮어씁니다.
    ///
    /// `hard_ttl_secs`가 양수일 때만 저장소 만료를 설정합니다.
    pub async fn put_quote(
        &self,
        key: &str,
        record: &QuoteRecord,
        hard_ttl_secs: Option<u64>,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        let ttl = hard_ttl_secs.filter(|ttl| *ttl > 0);
        self.store.put(key, bytes, ttl).await
    }
}
