//! 캐시 레코드와 응답 뷰 타입.
//!
//! - `QuoteRecord` - 내구성 캐시(L2)에 통째로 저장되는 레코드
//! - `QuoteView` - 레코드(또는 부재) + 신선도 분류의 읽기 전용 투영
//! - `QuoteStatus` / `ReasonCode` - 분류 결과와 사유 코드

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::symbol::{Market, SymbolKey};

/// 신선도 분류 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// soft TTL(+jitter) 이내
    Fresh,
    /// soft TTL은 지났지만 hard TTL 이내 (제공 가능)
    Stale,
    /// hard TTL 초과 또는 캐시 없음
    Missing,
}

impl QuoteStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, QuoteStatus::Stale)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteStatus::Fresh => write!(f, "fresh"),
            QuoteStatus::Stale => write!(f, "stale"),
            QuoteStatus::Missing => write!(f, "missing"),
        }
    }
}

/// 응답에 붙는 사유 코드.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// 내구성 캐시에 레코드 없음
    KvMiss,
    /// 레코드가 hard TTL을 넘김
    HardExpired,
    /// 상위 provider 조회 실패 (provider 이름, 대문자)
    ProviderError(String),
}

impl ReasonCode {
    /// provider 이름으로 에러 사유를 생성합니다 (예: "fugle" → `FUGLE_ERROR`).
    pub fn provider_error(provider: &str) -> Self {
        ReasonCode::ProviderError(provider.to_uppercase())
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::KvMiss => write!(f, "KV_MISS"),
            ReasonCode::HardExpired => write!(f, "HARD_EXPIRED"),
            ReasonCode::ProviderError(name) => write!(f, "{}_ERROR", name),
        }
    }
}

impl std::str::FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KV_MISS" => Ok(ReasonCode::KvMiss),
            "HARD_EXPIRED" => Ok(ReasonCode::HardExpired),
            other => other
                .strip_suffix("_ERROR")
                .filter(|name| !name.is_empty())
                .map(|name| ReasonCode::ProviderError(name.to_string()))
                .ok_or_else(|| format!("Unknown reason code: {}", s)),
        }
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReasonCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 내구성 캐시에 저장되는 시세 레코드.
///
/// 부분 업데이트 없이 성공한 조회마다 통째로 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// 티커
    #[serde(rename = "symbol")]
    pub ticker: String,
    /// 정규 심볼 (예: "2330.TW")
    pub canonical_symbol: String,
    /// 시장
    pub market: Market,
    /// 가격
    pub price: Option<f64>,
    /// 통화 (예: "TWD", "USD")
    pub currency: Option<String>,
    /// 상위 provider가 보고한 시세 시각
    pub as_of: Option<DateTime<Utc>>,
    /// 기록 시각
    pub fetched_at: DateTime<Utc>,
    /// soft TTL 연장 jitter (초), 기록 시점에 결정
    #[serde(default)]
    pub soft_ttl_jitter_sec: u32,
    /// 기록 시점의 hard TTL (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_hard_sec: Option<u64>,
    /// 기록 시점 기준 만료 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// 응답용 시세 뷰.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    /// 사용자가 입력한 원래 표기
    pub symbol: String,
    /// 정규 심볼
    pub canonical_symbol: String,
    /// 시장
    pub market: Market,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub as_of: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// 신선도 분류
    pub status: QuoteStatus,
    /// stale 여부 (status == stale)
    pub is_stale: bool,
    /// 사유 코드
    pub reason: Option<ReasonCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_hard_sec: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl QuoteView {
    /// 캐시에 아무것도 없는 심볼의 뷰.
    pub fn missing(key: &SymbolKey, reason: ReasonCode) -> Self {
        Self {
            symbol: key.original_symbol.clone(),
            canonical_symbol: key.canonical_symbol.clone(),
            market: key.market,
            price: None,
            currency: None,
            as_of: None,
            fetched_at: None,
            status: QuoteStatus::Missing,
            is_stale: false,
            reason: Some(reason),
            ttl_hard_sec: None,
            expires_at: None,
        }
    }

    /// 캐시 레코드와 분류 결과로 뷰를 만듭니다.
    ///
    /// missing으로 분류되면 `HARD_EXPIRED` 사유가 붙습니다.
    pub fn from_record(key: &SymbolKey, record: &QuoteRecord, status: QuoteStatus) -> Self {
        Self {
            symbol: key.original_symbol.clone(),
            canonical_symbol: key.canonical_symbol.clone(),
            market: key.market,
            price: record.price,
            currency: record.currency.clone(),
            as_of: record.as_of,
            fetched_at: Some(record.fetched_at),
            status,
            is_stale: status.is_stale(),
            reason: (status == QuoteStatus::Missing).then_some(ReasonCode::HardExpired),
            ttl_hard_sec: record.ttl_hard_sec,
            expires_at: record.expires_at,
        }
    }

    /// 사유 코드를 교체합니다.
    pub fn with_reason(mut self, reason: ReasonCode) -> Self {
        self.reason = Some(reason);
        self
    }

    /// 응답 에코용 원래 표기를 교체합니다.
    pub fn echo(mut self, original_symbol: &str) -> Self {
        self.symbol = original_symbol.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> QuoteRecord {
        QuoteRecord {
            ticker: "2330".to_string(),
            canonical_symbol: "2330.TW".to_string(),
            market: Market::Tw,
            price: Some(590.0),
            currency: Some("TWD".to_string()),
            as_of: Some(Utc.with_ymd_and_hms(2026, 1, 26, 0, 0, 0).unwrap()),
            fetched_at: Utc.with_ymd_and_hms(2026, 1, 26, 0, 0, 1).unwrap(),
            soft_ttl_jitter_sec: 12,
            ttl_hard_sec: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_reason_code_strings() {
        assert_eq!(ReasonCode::KvMiss.to_string(), "KV_MISS");
        assert_eq!(ReasonCode::HardExpired.to_string(), "HARD_EXPIRED");
        assert_eq!(ReasonCode::provider_error("fugle").to_string(), "FUGLE_ERROR");
        assert_eq!(
            "FINNHUB_ERROR".parse::<ReasonCode>().unwrap(),
            ReasonCode::ProviderError("FINNHUB".to_string())
        );
        assert!("_ERROR".parse::<ReasonCode>().is_err());
    }

    #[test]
    fn test_record_wire_format() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["symbol"], "2330");
        assert_eq!(json["canonicalSymbol"], "2330.TW");
        assert_eq!(json["market"], "TW");
        assert_eq!(json["softTtlJitterSec"], 12);
        assert!(json.get("ttlHardSec").is_none());
    }

    #[test]
    fn test_record_without_jitter_decodes() {
        let raw = r#"{"symbol":"AAPL","canonicalSymbol":"AAPL.US","market":"US",
            "price":261.74,"currency":"USD","asOf":null,
            "fetchedAt":"2026-01-26T00:00:01Z"}"#;
        let parsed: QuoteRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.soft_ttl_jitter_sec, 0);
        assert_eq!(parsed.market, Market::Us);
    }

    #[test]
    fn test_view_from_record() {
        let key = SymbolKey::new("2330", "2330", Market::Tw);

        let stale = QuoteView::from_record(&key, &record(), QuoteStatus::Stale);
        assert!(stale.is_stale);
        assert_eq!(stale.reason, None);

        let expired = QuoteView::from_record(&key, &record(), QuoteStatus::Missing);
        assert!(!expired.is_stale);
        assert_eq!(expired.reason, Some(ReasonCode::HardExpired));
        assert_eq!(expired.price, Some(590.0));

        let json = serde_json::to_value(&expired).unwrap();
        assert_eq!(json["status"], "missing");
        assert_eq!(json["reason"], "HARD_EXPIRED");
        assert_eq!(json["isStale"], false);
    }
}
