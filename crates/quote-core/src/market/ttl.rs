//! 시장 세션 기반 TTL 정책.
//!
//! | 시장 | 세션 | soft | hard |
//! |------|------|------|------|
//! | TW | 거래 중 | trading-soft | trading-hard |
//! | TW | 장외 | off-hours-soft | max(다음 개장까지 + buffer, soft) |
//! | US | 거래 중 | min(trading-soft, 300) | min(trading-hard, 300) |
//! | US | 장외 | off-hours-soft | max(다음 개장까지(휴장일 반영) + buffer, soft) |
//!
//! 장외 hard TTL은 실제 달력을 따라가므로 다음 개장 이후까지 캐시가 살아남지 않습니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::clock::{is_trading, next_open, HolidayCalendar, Session};
use crate::config::{MarketHours, TtlSettings};
use crate::types::Market;

/// 미국 거래 세션 중 soft/hard TTL 상한 (초).
pub const US_TRADING_TTL_CAP_SECS: u64 = 300;

/// soft/hard TTL 쌍 (초).
///
/// 생성 시 `hard >= soft`가 보장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TtlPair {
    pub soft: u64,
    pub hard: u64,
}

impl TtlPair {
    pub fn new(soft: u64, hard: u64) -> Self {
        Self {
            soft,
            hard: hard.max(soft),
        }
    }
}

/// TTL 정책.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    hours: MarketHours,
    settings: TtlSettings,
}

impl TtlPolicy {
    pub fn new(hours: MarketHours, settings: TtlSettings) -> Self {
        Self { hours, settings }
    }

    fn session(&self, market: Market) -> Session {
        match market {
            Market::Tw => self.hours.tw,
            Market::Us => self.hours.us,
        }
    }

    fn holidays(&self, market: Market) -> Option<&HolidayCalendar> {
        match market {
            Market::Tw => None,
            Market::Us => Some(&self.hours.us_holidays),
        }
    }

    /// 시장이 지금 거래 중인지 확인합니다.
    pub fn is_trading(&self, market: Market, now: DateTime<Utc>) -> bool {
        is_trading(market, now, self.session(market), self.holidays(market))
    }

    /// 시장과 순간에 맞는 TTL 쌍을 계산합니다.
    pub fn ttl_seconds(&self, market: Market, now: DateTime<Utc>) -> TtlPair {
        let s = &self.settings;

        if self.is_trading(market, now) {
            return match market {
                Market::Tw => TtlPair::new(s.trading_soft_secs, s.trading_hard_secs),
                Market::Us => TtlPair::new(
                    s.trading_soft_secs.min(US_TRADING_TTL_CAP_SECS),
                    s.trading_hard_secs.min(US_TRADING_TTL_CAP_SECS),
                ),
            };
        }

        let until_open = next_open(market, now, self.session(market).open, self.holidays(market))
            .map(|open_at| (open_at.with_timezone(&Utc) - now).num_seconds().max(0) as u64)
            .unwrap_or(s.offhours_hard_secs);

        let soft = s.offhours_soft_secs;
        let hard = until_open.saturating_add(s.open_buffer_secs).max(soft);
        TtlPair::new(soft, hard)
    }
}
