//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)의 liveness probe용입니다.

use axum::{http::StatusCode, response::IntoResponse};

/// 간단한 헬스 체크.
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
