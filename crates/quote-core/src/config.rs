//! 설정 관리.
//!
//! 모든 값은 선택 사항이며, 없거나 숫자가 아니거나 유한하지 않은 값은
//! 조용히 기본값으로 대체됩니다. 설정 오류로 서비스가 멈추지 않습니다.
//!
//! # 환경 변수
//!
//! - `TW_OPEN` / `TW_CLOSE`: 대만 세션 (기본값: 09:00 / 13:30)
//! - `US_OPEN` / `US_CLOSE`: 미국 세션, 타이베이 현지 시각 (기본값: 22:30 / 05:00)
//! - `US_HOLIDAYS`: 미국 휴장일, 쉼표 구분 ISO 날짜
//! - `SOFT_TTL_TRADING_SEC` / `HARD_TTL_TRADING_SEC`: 거래 중 TTL (기본값: 300 / 300)
//! - `SOFT_TTL_OFFHOURS_SEC` / `HARD_TTL_OFFHOURS_SEC`: 장외 TTL (기본값: 300 / 259200)
//! - `OFFHOURS_OPEN_BUFFER_SEC`: 다음 개장 이후 여유 (기본값: 180)
//! - `SOFT_TTL_JITTER_MAX_SEC`: 기록 시 jitter 상한 (기본값: 300)
//! - `L1_TTL_SEC`: 프로세스 로컬 캐시 TTL (기본값: 20)
//! - `DEFAULT_MARKET`: 기본 시장 (기본값: TW)
//! - `MAX_SYMBOLS_PER_REQUEST` / `MAX_SYNC_FETCH`: 요청당 한도 (기본값: 10 / 10)
//! - `US_FETCH_CHUNK_SIZE`: 미국 provider 동시 호출 묶음 크기 (기본값: 5)
//! - `UPSTREAM_TIMEOUT_SEC`: 상위 provider 요청 타임아웃 (기본값: 10)
//! - `FUGLE_API_KEY` / `FINNHUB_API_KEY`, `FUGLE_BASE_URL` / `FINNHUB_BASE_URL`
//! - `REDIS_URL`: 내구성 캐시 (없으면 메모리 저장소)
//! - `CONFIG_PATH`: 선택적 설정 파일 경로 (기본값: config/quote.toml)

use secrecy::SecretString;
use std::path::Path;

use crate::error::QuoteResult;
use crate::market::clock::{HolidayCalendar, Session};
use crate::types::Market;

pub const DEFAULT_CONFIG_PATH: &str = "config/quote.toml";
pub const DEFAULT_TW_OPEN: &str = "09:00";
pub const DEFAULT_TW_CLOSE: &str = "13:30";
pub const DEFAULT_US_OPEN: &str = "22:30";
pub const DEFAULT_US_CLOSE: &str = "05:00";
pub const DEFAULT_FUGLE_BASE_URL: &str = "https://api.fugle.tw";
pub const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io";

/// 시장별 세션 시각과 휴장일.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketHours {
    pub tw: Session,
    pub us: Session,
    pub us_holidays: HolidayCalendar,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            tw: Session::parse(DEFAULT_TW_OPEN, DEFAULT_TW_CLOSE),
            us: Session::parse(DEFAULT_US_OPEN, DEFAULT_US_CLOSE),
            us_holidays: HolidayCalendar::default(),
        }
    }
}

/// TTL 설정 (초).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlSettings {
    pub trading_soft_secs: u64,
    pub trading_hard_secs: u64,
    pub offhours_soft_secs: u64,
    /// 다음 개장 시각을 찾지 못했을 때의 장외 hard TTL
    pub offhours_hard_secs: u64,
    pub open_buffer_secs: u64,
}

impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            trading_soft_secs: 300,
            trading_hard_secs: 300,
            offhours_soft_secs: 300,
            offhours_hard_secs: 259_200,
            open_buffer_secs: 180,
        }
    }
}

/// 캐시 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// L1 micro-cache TTL (초)
    pub l1_ttl_secs: u64,
    /// 기록 시 jitter 상한 (초, 포함)
    pub jitter_max_secs: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1_ttl_secs: 20,
            jitter_max_secs: 300,
        }
    }
}

/// 배치 처리 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    pub default_market: Market,
    pub max_symbols_per_request: usize,
    /// 요청당 동기 재조회 예산
    pub max_sync_fetch: usize,
    /// 미국 provider 묶음 크기 (동시 호출 상한)
    pub us_chunk_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            default_market: Market::Tw,
            max_symbols_per_request: 10,
            max_sync_fetch: 10,
            us_chunk_size: 5,
        }
    }
}

/// 상위 provider 설정.
#[derive(Debug)]
pub struct UpstreamConfig {
    pub fugle_api_key: SecretString,
    pub finnhub_api_key: SecretString,
    pub fugle_base_url: String,
    pub finnhub_base_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            fugle_api_key: SecretString::from(String::new()),
            finnhub_api_key: SecretString::from(String::new()),
            fugle_base_url: DEFAULT_FUGLE_BASE_URL.to_string(),
            finnhub_base_url: DEFAULT_FINNHUB_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// 서비스 전체 설정.
#[derive(Debug, Default)]
pub struct QuoteConfig {
    pub market_hours: MarketHours,
    pub ttl: TtlSettings,
    pub cache: CacheSettings,
    pub batch: BatchSettings,
    pub upstream: UpstreamConfig,
    /// Redis URL (없으면 메모리 저장소)
    pub redis_url: Option<String>,
}

/// 초 단위 값을 관대하게 파싱합니다: 유한한 숫자만, 음수는 0, 소수점 이하는 버림.
fn parse_seconds(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(default)
}

fn parse_count(raw: Option<String>, default: usize) -> usize {
    usize::try_from(parse_seconds(raw, default as u64)).unwrap_or(default)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl QuoteConfig {
    /// 키 조회 함수로 설정을 구성합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| non_empty(lookup(key)).unwrap_or_else(|| default.to_string());

        let market_hours = MarketHours {
            tw: Session::parse(&text("TW_OPEN", DEFAULT_TW_OPEN), &text("TW_CLOSE", DEFAULT_TW_CLOSE)),
            us: Session::parse(&text("US_OPEN", DEFAULT_US_OPEN), &text("US_CLOSE", DEFAULT_US_CLOSE)),
            us_holidays: HolidayCalendar::parse(&text("US_HOLIDAYS", "")),
        };

        let d = TtlSettings::default();
        let ttl = TtlSettings {
            trading_soft_secs: parse_seconds(lookup("SOFT_TTL_TRADING_SEC"), d.trading_soft_secs),
            trading_hard_secs: parse_seconds(lookup("HARD_TTL_TRADING_SEC"), d.trading_hard_secs),
            offhours_soft_secs: parse_seconds(lookup("SOFT_TTL_OFFHOURS_SEC"), d.offhours_soft_secs),
            offhours_hard_secs: parse_seconds(lookup("HARD_TTL_OFFHOURS_SEC"), d.offhours_hard_secs),
            open_buffer_secs: parse_seconds(lookup("OFFHOURS_OPEN_BUFFER_SEC"), d.open_buffer_secs),
        };

        let d = CacheSettings::default();
        let cache = CacheSettings {
            l1_ttl_secs: parse_seconds(lookup("L1_TTL_SEC"), d.l1_ttl_secs),
            jitter_max_secs: u32::try_from(parse_seconds(
                lookup("SOFT_TTL_JITTER_MAX_SEC"),
                u64::from(d.jitter_max_secs),
            ))
            .unwrap_or(d.jitter_max_secs),
        };

        let d = BatchSettings::default();
        let batch = BatchSettings {
            default_market: lookup("DEFAULT_MARKET")
                .and_then(|m| Market::from_alias(&m))
                .unwrap_or(d.default_market),
            max_symbols_per_request: parse_count(lookup("MAX_SYMBOLS_PER_REQUEST"), d.max_symbols_per_request),
            max_sync_fetch: parse_count(lookup("MAX_SYNC_FETCH"), d.max_sync_fetch),
            us_chunk_size: parse_count(lookup("US_FETCH_CHUNK_SIZE"), d.us_chunk_size).max(1),
        };

        let d = UpstreamConfig::default();
        let upstream = UpstreamConfig {
            fugle_api_key: SecretString::from(lookup("FUGLE_API_KEY").unwrap_or_default()),
            finnhub_api_key: SecretString::from(lookup("FINNHUB_API_KEY").unwrap_or_default()),
            fugle_base_url: non_empty(lookup("FUGLE_BASE_URL")).unwrap_or(d.fugle_base_url),
            finnhub_base_url: non_empty(lookup("FINNHUB_BASE_URL")).unwrap_or(d.finnhub_base_url),
            timeout_secs: parse_seconds(lookup("UPSTREAM_TIMEOUT_SEC"), d.timeout_secs).max(1),
        };

        Self {
            market_hours,
            ttl,
            cache,
            batch,
            upstream,
            redis_url: non_empty(lookup("REDIS_URL")),
        }
    }

    /// 환경 변수에서 설정을 로드합니다 (`.env` 파일이 있으면 먼저 읽음).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 설정 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일 키는 소문자(`tw_open = "09:00"`)이며 환경 변수가 우선합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> QuoteResult<Self> {
        let _ = dotenvy::dotenv();
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::default().try_parsing(false))
            .build()?;

        Ok(Self::from_lookup(|key| {
            settings.get_string(&key.to_lowercase()).ok()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::clock::TimeOfDay;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> QuoteConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QuoteConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.ttl, TtlSettings::default());
        assert_eq!(config.cache.l1_ttl_secs, 20);
        assert_eq!(config.batch.max_sync_fetch, 10);
        assert_eq!(config.batch.us_chunk_size, 5);
        assert_eq!(config.batch.default_market, Market::Tw);
        assert_eq!(config.market_hours.tw.open, TimeOfDay::new(9, 0));
        assert_eq!(config.market_hours.us.open, TimeOfDay::new(22, 30));
        assert!(config.market_hours.us.is_overnight());
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("SOFT_TTL_TRADING_SEC", "120"),
            ("HARD_TTL_TRADING_SEC", "600.9"),
            ("DEFAULT_MARKET", "nasdaq"),
            ("US_HOLIDAYS", "2026-01-19,2026-02-16"),
            ("TW_OPEN", "9:15"),
            ("FINNHUB_API_KEY", "secret"),
            ("REDIS_URL", "redis://localhost:6379/0"),
        ]);
        assert_eq!(config.ttl.trading_soft_secs, 120);
        assert_eq!(config.ttl.trading_hard_secs, 600);
        assert_eq!(config.batch.default_market, Market::Us);
        assert_eq!(config.market_hours.us_holidays.len(), 2);
        assert_eq!(config.market_hours.tw.open, TimeOfDay::new(9, 15));
        assert_eq!(config.upstream.finnhub_api_key.expose_secret(), "secret");
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379/0"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = from_pairs(&[
            ("SOFT_TTL_TRADING_SEC", "abc"),
            ("HARD_TTL_OFFHOURS_SEC", "inf"),
            ("OFFHOURS_OPEN_BUFFER_SEC", "NaN"),
            ("L1_TTL_SEC", "-5"),
            ("US_FETCH_CHUNK_SIZE", "0"),
            ("DEFAULT_MARKET", "KRX"),
            ("MAX_SYNC_FETCH", ""),
        ]);
        assert_eq!(config.ttl.trading_soft_secs, 300);
        assert_eq!(config.ttl.offhours_hard_secs, 259_200);
        assert_eq!(config.ttl.open_buffer_secs, 180);
        assert_eq!(config.cache.l1_ttl_secs, 0);
        assert_eq!(config.batch.us_chunk_size, 1);
        assert_eq!(config.batch.default_market, Market::Tw);
        assert_eq!(config.batch.max_sync_fetch, 10);
    }

    #[test]
    fn test_load_reads_file_values() {
        let path = std::env::temp_dir().join(format!("quote-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "tw_open = \"08:30\"\nmax_sync_fetch = 4\nus_holidays = \"2026-02-16\"\n",
        )
        .unwrap();

        let config = QuoteConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.market_hours.tw.open, TimeOfDay::new(8, 30));
        assert_eq!(config.batch.max_sync_fetch, 4);
        assert_eq!(config.market_hours.us_holidays.len(), 1);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = QuoteConfig::load("does/not/exist.toml").unwrap();
        assert!(config.batch.max_symbols_per_request > 0);
    }
}
