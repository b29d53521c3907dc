//! 시장 시계.
//!
//! 고정 시간대(Asia/Taipei)의 벽시계 분해와 거래 세션/휴장일 계산을 제공합니다.
//! 미국 세션도 타이베이 현지 시각으로 표현하므로 자정을 넘는 세션(overnight)이 됩니다.
//!
//! 모든 계산은 `chrono-tz` 달력 연산으로 수행하며 호출자 로케일과 무관합니다.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::types::Market;

/// 모든 세션 계산의 기준 시간대.
pub const MARKET_TZ: Tz = chrono_tz::Asia::Taipei;

/// 다음 개장 탐색 범위 (오늘 포함, 일).
const NEXT_OPEN_SCAN_DAYS: i64 = 7;

/// 하루 중 시각 (시:분).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// 범위를 벗어난 값은 23:59로 잘립니다.
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    /// 자정 기준 분.
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    fn naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// `"HH:MM"` 문자열을 파싱합니다.
///
/// 빠졌거나 숫자가 아닌 부분은 0으로 취급합니다 (`"7:5"` → 07:05, `""` → 00:00).
pub fn parse_hhmm(value: &str) -> TimeOfDay {
    let mut parts = value.trim().splitn(2, ':');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let hour = next();
    let minute = next();
    TimeOfDay::new(hour, minute)
}

/// 거래 세션 (개장/폐장 시각).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl Session {
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Self {
        Self { open, close }
    }

    /// `"HH:MM"` 쌍으로 세션을 생성합니다.
    pub fn parse(open: &str, close: &str) -> Self {
        Self::new(parse_hhmm(open), parse_hhmm(close))
    }

    /// 개장 시각이 폐장 시각보다 늦으면 자정을 넘는 세션입니다.
    pub fn is_overnight(&self) -> bool {
        self.open.minute_of_day() > self.close.minute_of_day()
    }
}

/// 현지 벽시계 분해 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalParts {
    /// 1 = 월요일 ... 7 = 일요일
    pub weekday: u32,
    pub hour: u32,
    pub minute: u32,
}

impl LocalParts {
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn is_weekday(&self) -> bool {
        (1..=5).contains(&self.weekday)
    }
}

/// 순간을 기준 시간대의 {요일, 시, 분}으로 분해합니다.
pub fn local_parts(instant: DateTime<Utc>) -> LocalParts {
    let local = instant.with_timezone(&MARKET_TZ);
    LocalParts {
        weekday: local.weekday().number_from_monday(),
        hour: local.hour(),
        minute: local.minute(),
    }
}

/// 순간의 현지 날짜.
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&MARKET_TZ).date_naive()
}

/// 휴장일 목록 (현지 ISO 날짜).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// 쉼표로 구분된 ISO 날짜 목록을 파싱합니다. 잘못된 항목은 건너뜁니다.
    pub fn parse(raw: &str) -> Self {
        Self::from_dates(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// 평일이고 휴장일이 아니면 거래일입니다.
pub fn is_trading_day(date: NaiveDate, holidays: Option<&HolidayCalendar>) -> bool {
    let weekday = date.weekday().number_from_monday();
    if weekday > 5 {
        return false;
    }
    !holidays.is_some_and(|h| h.contains(date))
}

/// 대만 시장은 휴장일 목록을 보지 않습니다.
fn effective_holidays(market: Market, holidays: Option<&HolidayCalendar>) -> Option<&HolidayCalendar> {
    match market {
        Market::Tw => None,
        Market::Us => holidays,
    }
}

/// 분해된 시각이 대만 거래 세션 안인지 확인합니다 (양 끝 포함).
pub fn is_trading_session_tw(parts: LocalParts, session: Session) -> bool {
    if !parts.is_weekday() {
        return false;
    }
    let minutes = parts.minute_of_day();
    minutes >= session.open.minute_of_day() && minutes <= session.close.minute_of_day()
}

/// 주어진 순간이 시장의 거래 세션 안인지 확인합니다.
///
/// - TW: 평일이고 [open, close] 구간 (양 끝 포함)
/// - US: overnight 세션이면 `close` 이전 시각은 전날 세션에 속하므로,
///   휴장일 판단 기준일도 전날이 됩니다.
pub fn is_trading(
    market: Market,
    instant: DateTime<Utc>,
    session: Session,
    holidays: Option<&HolidayCalendar>,
) -> bool {
    let parts = local_parts(instant);

    if market == Market::Tw {
        return is_trading_session_tw(parts, session);
    }

    let holidays = effective_holidays(market, holidays);
    let minutes = parts.minute_of_day();
    let open = session.open.minute_of_day();
    let close = session.close.minute_of_day();
    let today = local_date(instant);

    if session.is_overnight() {
        let governing = if minutes <= close {
            match today.pred_opt() {
                Some(date) => date,
                None => return false,
            }
        } else {
            today
        };
        return is_trading_day(governing, holidays) && (minutes >= open || minutes <= close);
    }

    is_trading_day(today, holidays) && minutes >= open && minutes <= close
}

/// 다음 개장 시각을 찾습니다.
///
/// 오늘부터 7일 동안 주말과 휴장일을 건너뛰며, 개장 시각이 아직 지나지 않은
/// 첫 거래일의 개장 시각을 반환합니다. 범위 안에 없으면 `None`.
pub fn next_open(
    market: Market,
    instant: DateTime<Utc>,
    open: TimeOfDay,
    holidays: Option<&HolidayCalendar>,
) -> Option<DateTime<Tz>> {
    let holidays = effective_holidays(market, holidays);
    let today = local_date(instant);

    (0..NEXT_OPEN_SCAN_DAYS)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .filter(|date| is_trading_day(*date, holidays))
        .filter_map(|date| {
            MARKET_TZ
                .from_local_datetime(&date.and_time(open.naive()))
                .earliest()
        })
        .find(|open_at| open_at.with_timezone(&Utc) > instant)
}

/// 다음 개장까지 남은 초 (음수 없음).
///
/// 금요일 폐장 후와 토요일에는 월요일 개장까지의 시간이 됩니다.
/// 탐색 범위 안에 개장일이 없으면 0을 반환합니다.
pub fn seconds_until_next_open(
    market: Market,
    instant: DateTime<Utc>,
    open: TimeOfDay,
    holidays: Option<&HolidayCalendar>,
) -> u64 {
    next_open(market, instant, open, holidays)
        .map(|open_at| (open_at.with_timezone(&Utc) - instant).num_seconds().max(0) as u64)
        .unwrap_or(0)
}
