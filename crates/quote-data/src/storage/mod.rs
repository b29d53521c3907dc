//! 내구성 키-값 저장소.
//!
//! - `RedisStore`: Redis 기반 저장소 (운영)
//! - `MemoryStore`: 프로세스 메모리 저장소 (개발/테스트, `REDIS_URL` 미설정 시)

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis::{RedisStore, RedisStoreConfig};

/// 바이트 값을 키로 저장하는 내구성 저장소.
///
/// 만료는 저장소가 처리합니다. 만료된 키는 없는 키와 구분되지 않습니다.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// 키의 값을 가져옵니다.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 값을 저장합니다. `ttl_secs`가 있으면 그 시간 뒤 만료됩니다.
    async fn put(&self, key: &str, value: Vec<u8>, ttl_secs: Option<u64>) -> Result<()>;
}
