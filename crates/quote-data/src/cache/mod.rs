//! 2단계 캐시.
//!
//! - L1 `MicroCache`: 프로세스 로컬, 짧은 TTL의 응답 뷰 캐시
//! - L2 `QuoteStore`: 내구성 저장소의 시세 레코드

pub mod micro;
pub mod quote_store;

pub use micro::MicroCache;
pub use quote_store::QuoteStore;
