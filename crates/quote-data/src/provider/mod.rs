//! 상위 시세 Provider.
//!
//! 시장마다 하나의 provider가 있습니다:
//! - `FugleProvider`: 대만 주식 (Fugle Market Data API)
//! - `FinnhubProvider`: 미국 주식 (Finnhub Quote API)
//!
//! 응답 JSON에서 가격/통화/시각을 찾아내는 규칙은 각 provider의 `extract_quote`에 있습니다.

pub mod finnhub;
pub mod fugle;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;

pub use finnhub::FinnhubProvider;
pub use fugle::FugleProvider;

/// provider가 돌려준 시세 값.
///
/// 가격이 없으면 조회 실패로 취급됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderQuote {
    pub price: Option<f64>,
    pub currency: Option<String>,
    /// provider가 보고한 시세 시각
    pub as_of: Option<DateTime<Utc>>,
}

/// 시세 provider.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 사유 코드에 쓰이는 provider 이름 (예: "fugle").
    fn name(&self) -> &str;

    /// 티커 하나의 시세를 가져옵니다.
    ///
    /// 통신 오류와 2xx가 아닌 응답은 `DataError::FetchError`입니다.
    async fn fetch_quote(&self, ticker: &str) -> Result<ProviderQuote>;
}

/// 유한한 숫자 또는 숫자 문자열을 f64로 읽습니다.
pub(crate) fn number_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// epoch 값을 시각으로 변환합니다.
///
/// 크기로 단위를 추정합니다: 1e11 미만은 초, 1e14 초과는 마이크로초, 그 사이는 밀리초.
pub(crate) fn epoch_to_datetime(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value < 1e11 {
        value * 1000.0
    } else if value > 1e14 {
        (value / 1000.0).floor()
    } else {
        value
    };
    DateTime::from_timestamp_millis(millis as i64)
}

/// ISO 8601 문자열 또는 epoch 숫자를 시각으로 변환합니다.
pub(crate) fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) if !s.is_empty() => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_f64().and_then(epoch_to_datetime),
        _ => None,
    }
}

/// JSON pointer 목록 중 null이 아닌 첫 값을 찾습니다.
pub(crate) fn first_present<'a>(data: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers
        .iter()
        .filter_map(|pointer| data.pointer(pointer))
        .find(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(&json!(12.5)), Some(12.5));
        assert_eq!(number_value(&json!(" 590 ")), Some(590.0));
        assert_eq!(number_value(&json!(0)), Some(0.0));
        assert_eq!(number_value(&json!(-1.5)), Some(-1.5));
        assert_eq!(number_value(&json!("")), None);
        assert_eq!(number_value(&json!("abc")), None);
        assert_eq!(number_value(&json!("NaN")), None);
        assert_eq!(number_value(&json!("Infinity")), None);
        assert_eq!(number_value(&json!(null)), None);
        assert_eq!(number_value(&json!(true)), None);
    }

    #[test]
    fn test_epoch_units() {
        let expected = Utc.with_ymd_and_hms(2020, 2, 25, 14, 30, 0).unwrap();
        assert_eq!(epoch_to_datetime(1_582_641_000.0), Some(expected));
        assert_eq!(epoch_to_datetime(1_582_641_000_000.0), Some(expected));
        assert_eq!(epoch_to_datetime(1_582_641_000_000_000.0), Some(expected));
        assert_eq!(epoch_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_timestamp_value() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 26, 5, 30, 0).unwrap();
        assert_eq!(timestamp_value(&json!("2026-01-26T13:30:00+08:00")), Some(expected));
        assert_eq!(timestamp_value(&json!("yesterday")), None);
        assert_eq!(timestamp_value(&json!("")), None);
    }

    #[test]
    fn test_first_present_skips_null() {
        let data = json!({ "a": null, "b": { "c": 3 } });
        assert_eq!(first_present(&data, &["/a", "/missing", "/b/c"]), Some(&json!(3)));
        assert_eq!(first_present(&data, &["/a"]), None);
    }
}
