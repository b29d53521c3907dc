//! 신선도 분류기.
//!
//! 기록 후 경과 시간과 {soft, hard, jitter}로 시세를 fresh / stale / missing으로 나눕니다.
//! jitter는 기록 시점마다 달라서 여러 심볼이 동시에 만료되는 것을 막습니다.

use chrono::{DateTime, Utc};

use crate::types::QuoteStatus;

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1000)
}

/// 시세를 분류합니다.
///
/// - `age = max(0, now - fetched_at)`
/// - fresh: `age <= (soft + jitter)`
/// - stale: `(soft + jitter) < age <= hard`
/// - missing: `age > hard`
pub fn classify(
    now: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
    soft_secs: u64,
    hard_secs: u64,
    jitter_secs: u32,
) -> QuoteStatus {
    let age_ms = (now - fetched_at).num_milliseconds().max(0);
    let soft_ms = secs_to_ms(soft_secs.saturating_add(u64::from(jitter_secs)));
    let hard_ms = secs_to_ms(hard_secs);

    if age_ms <= soft_ms {
        QuoteStatus::Fresh
    } else if age_ms <= hard_ms {
        QuoteStatus::Stale
    } else {
        QuoteStatus::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 26, 2, 0, 0).unwrap()
    }

    #[test]
    fn test_classify_fresh() {
        let fetched = now() - Duration::seconds(60);
        assert_eq!(classify(now(), fetched, 300, 3600, 0), QuoteStatus::Fresh);
    }

    #[test]
    fn test_classify_stale() {
        let fetched = now() - Duration::seconds(600);
        assert_eq!(classify(now(), fetched, 300, 3600, 0), QuoteStatus::Stale);
    }

    #[test]
    fn test_classify_missing() {
        let fetched = now() - Duration::seconds(4000);
        assert_eq!(classify(now(), fetched, 300, 3600, 0), QuoteStatus::Missing);
    }

    #[test]
    fn test_jitter_extends_soft() {
        let fetched = now() - Duration::seconds(350);
        assert_eq!(classify(now(), fetched, 300, 3600, 0), QuoteStatus::Stale);
        assert_eq!(classify(now(), fetched, 300, 3600, 100), QuoteStatus::Fresh);
    }

    #[test]
    fn test_boundaries_inclusive() {
        assert_eq!(
            classify(now(), now() - Duration::seconds(300), 300, 3600, 0),
            QuoteStatus::Fresh
        );
        assert_eq!(
            classify(now(), now() - Duration::seconds(3600), 300, 3600, 0),
            QuoteStatus::Stale
        );
        assert_eq!(
            classify(now(), now() - Duration::milliseconds(3_600_001), 300, 3600, 0),
            QuoteStatus::Missing
        );
    }

    #[test]
    fn test_future_fetched_at_is_fresh() {
        let fetched = now() + Duration::seconds(30);
        assert_eq!(classify(now(), fetched, 0, 0, 0), QuoteStatus::Fresh);
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_age(
            a in 0i64..10_000_000,
            b in 0i64..10_000_000,
            soft in 0u64..5_000,
            hard in 0u64..10_000,
            jitter in 0u32..300,
        ) {
            let (young, old) = if a <= b { (a, b) } else { (b, a) };
            let s1 = classify(now(), now() - Duration::milliseconds(young), soft, hard, jitter);
            let s2 = classify(now(), now() - Duration::milliseconds(old), soft, hard, jitter);
            prop_assert!(s1 <= s2);
        }

        #[test]
        fn prop_zero_age_is_fresh(soft in 0u64..1_000_000, hard in 0u64..1_000_000) {
            prop_assert_eq!(classify(now(), now(), soft, hard, 0), QuoteStatus::Fresh);
        }

        #[test]
        fn prop_pure(age in 0i64..10_000_000, soft in 0u64..5_000, hard in 0u64..10_000, jitter in 0u32..300) {
            let fetched = now() - Duration::milliseconds(age);
            let first = classify(now(), fetched, soft, hard, jitter);
            let second = classify(now(), fetched, soft, hard, jitter);
            prop_assert_eq!(first, second);
        }
    }
}
