//! 시세 조회 HTTP 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (`POST /quotes/batch`, `GET /health`)
//! - CORS 및 요청 추적 미들웨어
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`error`]: API 에러 응답

pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiErrorResponse, ApiResult};
pub use state::AppState;

/// 브라우저 preflight 결과 캐시 시간.
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// 모든 origin에서 배치 조회를 허용하는 CORS 레이어.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

/// 미들웨어가 적용된 전체 라우터를 만듭니다.
pub fn create_router(state: Arc<AppState>) -> Router {
    routes::create_api_router()
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
