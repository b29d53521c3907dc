//! 애플리케이션 공유 상태.

use quote_data::QuoteOrchestrator;

/// 모든 핸들러가 `Arc<AppState>`로 공유하는 상태.
pub struct AppState {
    /// 배치 시세 조회 서비스 (L1 캐시 포함)
    pub orchestrator: QuoteOrchestrator,
    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(orchestrator: QuoteOrchestrator) -> Self {
        Self {
            orchestrator,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 요청당 최대 심볼 수.
    pub fn max_symbols(&self) -> usize {
        self.orchestrator.max_symbols_per_request()
    }
}
