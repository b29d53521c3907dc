//! 시세 데이터 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 내구성 저장소 (Redis, 메모리)
//! - 2단계 캐시 (L1 micro-cache, L2 시세 저장소)
//! - 상위 시세 provider (Fugle, Finnhub)
//! - 배치 조회 오케스트레이터

pub mod cache;
pub mod error;
pub mod jitter;
pub mod orchestrator;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

pub use cache::{MicroCache, QuoteStore};
pub use jitter::{FixedJitter, JitterSource, RandomJitter};
pub use orchestrator::QuoteOrchestrator;
pub use provider::{FinnhubProvider, FugleProvider, ProviderQuote, QuoteProvider};
pub use storage::{DurableStore, MemoryStore, RedisStore, RedisStoreConfig};
