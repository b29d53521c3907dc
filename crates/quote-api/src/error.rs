//! API 에러 응답 타입.
//!
//! 모든 에러는 `{ "error": "<메시지>" }` 형식의 JSON 본문으로 응답합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quote_core::QuoteError;
use serde::{Deserialize, Serialize};

fn default_status() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// API 에러 응답.
///
/// ```json
/// { "error": "symbols cannot be empty" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 사람이 읽을 수 있는 에러 메시지
    pub error: String,
    /// HTTP 상태 코드 (본문에는 포함되지 않음)
    #[serde(skip, default = "default_status")]
    pub status: StatusCode,
}

impl ApiErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status,
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<QuoteError> for ApiErrorResponse {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidInput(message) => Self::bad_request(message),
            other => Self::internal(other.to_string()),
        }
    }
}

/// API 핸들러 결과 타입.
pub type ApiResult<T> = Result<T, ApiErrorResponse>;
