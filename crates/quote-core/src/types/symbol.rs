//! 시장 및 심볼 정의.
//!
//! 이 모듈은 심볼 관련 타입을 정의합니다:
//! - `Market` - 시장 구분 (TW, US)
//! - `SymbolKey` - 캐시 식별자가 되는 정규화된 심볼
//! - `normalize_symbols` - 입력 순서를 유지하는 정규화 + 중복 제거

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{QuoteError, QuoteResult};

/// 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// 대만 증권거래소
    #[serde(rename = "TW")]
    Tw,
    /// 미국 주식 시장
    #[serde(rename = "US")]
    Us,
}

impl Market {
    /// 시장 별칭을 해석합니다 (대소문자 무시).
    ///
    /// - `TW`, `TPE`, `TWO` → `Market::Tw`
    /// - `US`, `NASDAQ`, `NYSE`, `AMEX` → `Market::Us`
    pub fn from_alias(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "TW" | "TPE" | "TWO" => Some(Market::Tw),
            "US" | "NASDAQ" | "NYSE" | "AMEX" => Some(Market::Us),
            _ => None,
        }
    }

    /// 시장 코드 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Tw => "TW",
            Market::Us => "US",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 정규화된 심볼 식별자.
///
/// `(ticker, market)` 쌍이 캐시 식별자이며, 사용자가 입력한
/// 원래 표기는 응답 에코용으로 별도 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolKey {
    /// 사용자가 입력한 원래 표기
    pub original_symbol: String,
    /// 대문자 티커 (예: "2330", "AAPL")
    pub ticker: String,
    /// 시장
    pub market: Market,
    /// 시장이 붙은 정규 심볼 (예: "2330.TW")
    pub canonical_symbol: String,
    /// 캐시 키 (예: "quote:TW:2330")
    pub cache_key: String,
}

impl SymbolKey {
    /// 티커와 시장으로 심볼 키를 생성합니다.
    pub fn new(original: impl Into<String>, ticker: impl Into<String>, market: Market) -> Self {
        let ticker = ticker.into().to_uppercase();
        Self {
            original_symbol: original.into(),
            canonical_symbol: format!("{}.{}", ticker, market),
            cache_key: Self::cache_key_for(&ticker, market),
            ticker,
            market,
        }
    }

    /// 캐시 키 형식: `quote:{MARKET}:{TICKER}`
    pub fn cache_key_for(ticker: &str, market: Market) -> String {
        format!("quote:{}:{}", market, ticker)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_symbol)
    }
}

/// 입력을 티커와 시장 힌트로 분리합니다.
///
/// `MKT:TICKER`가 `TICKER.MKT`보다 우선합니다.
fn split_symbol(input: &str) -> (&str, Option<&str>) {
    if let Some((left, right)) = input.split_once(':') {
        let ticker = right.split(':').next().unwrap_or_default();
        return (ticker, Some(left));
    }
    if let Some((left, right)) = input.split_once('.') {
        let hint = right.split('.').next().unwrap_or_default();
        return (left, Some(hint));
    }
    (input, None)
}

/// 단일 심볼을 정규화합니다.
///
/// 시장 결정 순서: 명시적 override → 입력의 시장 힌트 → 기본 시장.
/// override가 지정되었지만 알 수 없는 별칭이면 힌트를 보지 않고 기본 시장을 사용합니다.
pub fn normalize_symbol(
    input: &str,
    market_override: Option<&str>,
    default_market: Market,
) -> SymbolKey {
    let upper = input.trim().to_uppercase();
    let (ticker, hint) = split_symbol(&upper);

    let market = market_override
        .or(hint)
        .and_then(Market::from_alias)
        .unwrap_or(default_market);

    SymbolKey::new(input, ticker, market)
}

/// 심볼 목록을 정규화하고 정규 심볼 기준으로 중복을 제거합니다.
///
/// 첫 번째 항목이 남고 입력 순서가 유지됩니다. 티커가 비어 있는 항목은 버립니다.
pub fn normalize_symbols<S: AsRef<str>>(
    symbols: &[S],
    market_override: Option<&str>,
    default_market: Market,
) -> Vec<SymbolKey> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let key = normalize_symbol(symbol.as_ref(), market_override, default_market);
        if key.ticker.is_empty() {
            continue;
        }
        if !seen.insert(key.canonical_symbol.clone()) {
            continue;
        }
        result.push(key);
    }

    result
}

/// 요청 심볼 목록을 검증하고 공백을 제거합니다.
///
/// # Errors
/// 목록이 비었거나, `max_symbols`를 넘거나, 공백 제거 후 남는 항목이 없으면
/// `QuoteError::InvalidInput`을 반환합니다.
pub fn prepare_symbols(raw: &[String], max_symbols: usize) -> QuoteResult<Vec<String>> {
    if raw.is_empty() {
        return Err(QuoteError::InvalidInput("symbols cannot be empty".to_string()));
    }
    if raw.len() > max_symbols {
        return Err(QuoteError::InvalidInput(format!(
            "symbols exceeds max {}",
            max_symbols
        )));
    }

    let symbols: Vec<String> = raw
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(QuoteError::InvalidInput("symbols cannot be empty".to_string()));
    }

    Ok(symbols)
}
