//! 시장 시계와 TTL 정책.

pub mod clock;
pub mod ttl;

pub use clock::{
    is_trading, is_trading_day, local_date, local_parts, next_open, parse_hhmm,
    seconds_until_next_open, HolidayCalendar, LocalParts, Session, TimeOfDay, MARKET_TZ,
};
pub use ttl::{TtlPair, TtlPolicy, US_TRADING_TTL_CAP_SECS};
