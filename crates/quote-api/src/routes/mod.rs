//! API 라우트.
//!
//! - `POST /quotes/batch`: 배치 시세 조회
//! - `GET /health`: 헬스 체크

pub mod health;
pub mod quotes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::error::ApiErrorResponse;
use crate::state::AppState;

pub use health::health_check;
pub use quotes::{batch_quotes, BatchQuoteRequest, BatchQuoteResponse};

/// 알 수 없는 경로.
async fn not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found()
}

/// 경로는 있지만 메서드가 맞지 않는 요청.
async fn method_not_allowed() -> ApiErrorResponse {
    ApiErrorResponse::method_not_allowed()
}

/// 모든 라우트를 구성합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes/batch", post(batch_quotes))
        .route("/health", get(health_check))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}
