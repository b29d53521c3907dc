//! 배치 시세 endpoint.
//!
//! `POST /quotes/batch`
//!
//! ```json
//! { "symbols": ["2330", "AAPL.US"], "market": "TW" }
//! ```

use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Utc};
use quote_core::{normalize_symbols, prepare_symbols, QuoteView};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 검증된 배치 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQuoteRequest {
    /// 공백 제거된 심볼 목록
    pub symbols: Vec<String>,
    /// 명시적 시장 지정 (별칭 허용)
    pub market: Option<String>,
}

/// 배치 응답.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuoteResponse {
    pub server_time: DateTime<Utc>,
    pub results: Vec<QuoteView>,
}

/// 문자열이 아닌 항목은 JSON 표기 그대로 문자열로 바꿉니다.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 요청 본문을 파싱하고 검증합니다.
pub fn parse_request(body: &[u8], max_symbols: usize) -> ApiResult<BatchQuoteRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiErrorResponse::bad_request("Invalid JSON body"))?;

    let raw: Vec<String> = value
        .get("symbols")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiErrorResponse::bad_request("symbols must be an array"))?
        .iter()
        .map(stringify)
        .collect();

    let symbols = prepare_symbols(&raw, max_symbols)?;
    let market = value
        .get("market")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(BatchQuoteRequest { symbols, market })
}

/// 배치 시세 조회.
///
/// POST /quotes/batch
pub async fn batch_quotes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<BatchQuoteResponse>> {
    let request = parse_request(&body, state.max_symbols())?;
    let market = request.market.as_deref();

    let default_market = state.orchestrator.default_market();
    if normalize_symbols(&request.symbols, market, default_market).is_empty() {
        return Err(ApiErrorResponse::bad_request("symbols cannot be empty"));
    }

    let server_time = Utc::now();
    let results = state
        .orchestrator
        .resolve_batch_at(&request.symbols, market, server_time)
        .await;

    debug!(
        requested = request.symbols.len(),
        returned = results.len(),
        "Batch quotes resolved"
    );

    Ok(Json(BatchQuoteResponse {
        server_time,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn parse(body: &str) -> ApiResult<BatchQuoteRequest> {
        parse_request(body.as_bytes(), 10)
    }

    fn error_of(body: &str) -> (StatusCode, String) {
        let err = parse(body).unwrap_err();
        (err.status, err.error)
    }

    #[test]
    fn test_parse_valid_request() {
        let request = parse(r#"{"symbols":[" 2330 ","AAPL.US"],"market":"tw"}"#).unwrap();
        assert_eq!(request.symbols, vec!["2330", "AAPL.US"]);
        assert_eq!(request.market.as_deref(), Some("tw"));
    }

    #[test]
    fn test_non_string_entries_are_stringified() {
        let request = parse(r#"{"symbols":[2330, "2317", true]}"#).unwrap();
        assert_eq!(request.symbols, vec!["2330", "2317", "true"]);
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(
            error_of("{symbols:"),
            (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string())
        );
    }

    #[test]
    fn test_symbols_not_array() {
        for body in [r#"{"symbols":"2330"}"#, r#"{}"#, r#"["2330"]"#] {
            assert_eq!(error_of(body).1, "symbols must be an array");
        }
    }

    #[test]
    fn test_empty_and_blank_symbols() {
        assert_eq!(error_of(r#"{"symbols":[]}"#).1, "symbols cannot be empty");
        assert_eq!(error_of(r#"{"symbols":["  ",""]}"#).1, "symbols cannot be empty");
    }

    #[test]
    fn test_too_many_symbols() {
        let symbols: Vec<String> = (0..11).map(|i| format!("\"{}\"", 2300 + i)).collect();
        let body = format!(r#"{{"symbols":[{}]}}"#, symbols.join(","));
        assert_eq!(error_of(&body).1, "symbols exceeds max 10");
    }
}
