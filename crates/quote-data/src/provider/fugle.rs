//! Fugle 시세 provider (대만 주식).
//!
//! `GET {base}/marketdata/v1.0/stock/intraday/quote/{ticker}`, 인증은 `X-API-KEY` 헤더.
//! 응답 형태가 엔드포인트 버전마다 달라서 여러 경로를 순서대로 살펴봅니다.

use async_trait::async_trait;
use quote_core::UpstreamConfig;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{first_present, number_value, timestamp_value, ProviderQuote, QuoteProvider};
use crate::error::{DataError, Result};

const PRICE_POINTERS: &[&str] = &[
    "/lastPrice",
    "/closePrice",
    "/openPrice",
    "/referencePrice",
    "/data/quote/trade/price",
    "/data/quote/last/price",
    "/data/quote/price",
    "/data/price",
    "/price",
];

const CURRENCY_POINTERS: &[&str] = &["/data/quote/currency", "/data/currency", "/currency"];

const AS_OF_POINTERS: &[&str] = &[
    "/lastUpdated",
    "/closeTime",
    "/lastTrade/time",
    "/lastTrial/time",
    "/total/time",
    "/data/quote/trade/time",
    "/data/quote/last/time",
    "/data/quote/time",
    "/data/time",
];

const DEFAULT_CURRENCY: &str = "TWD";

/// Fugle 응답에서 시세를 뽑아냅니다.
///
/// - 가격: 후보 경로 중 처음으로 유한한 숫자(또는 숫자 문자열)인 값
/// - 통화: 명시된 통화, 없으면 `exchange`나 가격이 있을 때 TWD
/// - 시각: 처음으로 존재하는 시각 필드 (ISO 문자열 또는 epoch 초/밀리초/마이크로초)
pub fn extract_quote(data: &Value) -> ProviderQuote {
    let price = PRICE_POINTERS
        .iter()
        .filter_map(|pointer| data.pointer(pointer))
        .find_map(number_value);

    let has_exchange = data
        .get("exchange")
        .is_some_and(|v| !v.is_null() && v.as_str() != Some("") && v.as_bool() != Some(false));

    let currency = first_present(data, CURRENCY_POINTERS)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| (has_exchange || price.is_some()).then(|| DEFAULT_CURRENCY.to_string()));

    let as_of = first_present(data, AS_OF_POINTERS).and_then(timestamp_value);

    ProviderQuote {
        price,
        currency,
        as_of,
    }
}

/// Fugle Market Data API 클라이언트.
pub struct FugleProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl FugleProvider {
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
            SecretString::from(config.fugle_api_key.expose_secret().to_string()),
            config.fugle_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn quote_url(&self, ticker: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DataError::ConfigError(format!("잘못된 Fugle URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| DataError::ConfigError(format!("잘못된 Fugle URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["marketdata", "v1.0", "stock", "intraday", "quote", ticker]);
        Ok(url)
    }
}

#[async_trait]
impl QuoteProvider for FugleProvider {
    fn name(&self) -> &str {
        "fugle"
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<ProviderQuote> {
        let url = self.quote_url(ticker)?;
        debug!(ticker, url = %url, "Fugle 시세 요청");

        let response = self
            .client
            .get(url)
            .header("X-API-KEY", self.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::FetchError(format!("Fugle API error: {}", status)));
        }

        let data: Value = response.json().await?;
        Ok(extract_quote(&data))
    }
}
