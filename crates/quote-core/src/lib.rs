//! # Quote Core
//!
//! 대만(TW)/미국(US) 시세 캐시의 핵심 도메인 모델과 정책을 제공합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 시장 및 심볼 정규화 타입
//! - 캐시 레코드와 응답 뷰 타입
//! - 시장 시계 (거래 세션, 휴장일, 다음 개장까지 남은 시간)
//! - 시장 세션 기반 TTL 정책
//! - 신선도 분류기 (fresh / stale / missing)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod freshness;
pub mod logging;
pub mod market;
pub mod types;

pub use config::*;
pub use error::*;
pub use freshness::classify;
pub use logging::*;
pub use market::*;
pub use types::*;
