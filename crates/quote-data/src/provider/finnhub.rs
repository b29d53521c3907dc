//! Finnhub 시세 provider (미국 주식).
//!
//! `GET {base}/api/v1/quote?symbol={ticker}&token={key}`.
//! 토큰이 쿼리 문자열에 들어가므로 오류 메시지에서 URL을 제거합니다.

use async_trait::async_trait;
use quote_core::UpstreamConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{epoch_to_datetime, number_value, ProviderQuote, QuoteProvider};
use crate::error::{DataError, Result};

/// Finnhub `/quote` 응답을 시세로 변환합니다.
///
/// 현재가 `c`가 유한한 숫자가 아니면 모든 필드가 비어 있습니다.
/// 시각은 epoch 초 `t`에서 가져옵니다.
pub fn extract_quote(data: &Value) -> ProviderQuote {
    let Some(price) = data.get("c").and_then(number_value) else {
        return ProviderQuote::default();
    };

    ProviderQuote {
        price: Some(price),
        currency: Some("USD".to_string()),
        as_of: data.get("t").and_then(number_value).and_then(epoch_to_datetime),
    }
}

/// Finnhub Quote API 클라이언트.
pub struct FinnhubProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl FinnhubProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Self::new(
            SecretString::from(config.finnhub_api_key.expose_secret().to_string()),
            config.finnhub_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<ProviderQuote> {
        let url = format!("{}/api/v1/quote", self.base_url.trim_end_matches('/'));
        debug!(ticker, url = %url, "Finnhub 시세 요청");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", ticker), ("token", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(|e| DataError::from(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::FetchError(format!("Finnhub API error: {}", status)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| DataError::from(e.without_url()))?;
        Ok(extract_quote(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use serde_json::json;

    fn provider(base_url: String) -> FinnhubProvider {
        FinnhubProvider::new(
            SecretString::from("finnhub-token".to_string()),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_quote() {
        let quote = extract_quote(&json!({ "c": 261.74, "h": 263.31, "t": 1_582_641_000 }));
        assert_eq!(quote.price, Some(261.74));
        assert_eq!(quote.currency.as_deref(), Some("USD"));
        assert_eq!(
            quote.as_of,
            Some(Utc.with_ymd_and_hms(2020, 2, 25, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_without_price() {
        assert_eq!(extract_quote(&json!({ "t": 1_582_641_000 })), ProviderQuote::default());
        assert_eq!(extract_quote(&json!({ "c": "n/a" })), ProviderQuote::default());
        assert_eq!(extract_quote(&json!({ "c": null })), ProviderQuote::default());
    }

    #[test]
    fn test_extract_accepts_zero_and_negative() {
        assert_eq!(extract_quote(&json!({ "c": 0 })).price, Some(0.0));
        assert_eq!(extract_quote(&json!({ "c": "-3.5" })).price, Some(-3.5));
        assert_eq!(extract_quote(&json!({ "c": 0 })).as_of, None);
    }

    #[test]
    fn test_extract_rejects_non_finite_strings() {
        assert_eq!(extract_quote(&json!({ "c": "NaN" })).price, None);
        assert_eq!(extract_quote(&json!({ "c": "Infinity" })).price, None);
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/quote")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "AAPL".into()),
                Matcher::UrlEncoded("token".into(), "finnhub-token".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"c":261.74,"d":1.2,"t":1582641000}"#)
            .create_async()
            .await;

        let quote = provider(server.url()).fetch_quote("AAPL").await.unwrap();
        mock.assert_async().await;
        assert_eq!(quote.price, Some(261.74));
        assert_eq!(quote.currency.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_fetch_quote_error_hides_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/quote")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = provider(server.url()).fetch_quote("AAPL").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(!message.contains("finnhub-token"));
    }

    #[tokio::test]
    async fn test_fetch_quote_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/quote")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = provider(server.url()).fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, DataError::ParseError(_)));
        assert!(!err.to_string().contains("finnhub-token"));
    }
}
