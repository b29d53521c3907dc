//! 배치 시세 조회 오케스트레이터.
//!
//! 심볼마다 L1 → L2 → 신선도 분류 순서로 캐시를 확인하고, 없거나 hard TTL을 넘긴
//! 심볼만 상위 provider에서 다시 가져옵니다.
//!
//! ```text
//! L1 적중  → 완료 (캐시된 뷰, 이번 요청의 표기로 에코)
//! L2 적중  → 분류 → fresh | stale → 완료
//!                  → missing      → 재조회 대상 (HARD_EXPIRED)
//! L2 없음  → 재조회 대상 (KV_MISS)
//! 재조회   → 성공 → 완료 (fresh)
//!          → 실패 → 완료 (기존 뷰 + provider 사유)
//! ```
//!
//! 재조회는 요청당 예산(앞에서부터 N개)만큼만 수행합니다. TW 심볼은 모두 동시에,
//! US 심볼은 고정 크기 묶음 단위로 순차 처리하며 두 풀은 동시에 진행됩니다.
//! 결과는 입력 순서 그대로 반환됩니다.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use quote_core::{
    classify, normalize_symbols, BatchSettings, CacheSettings, Market, QuoteConfig, QuoteRecord,
    QuoteStatus, QuoteView, ReasonCode, SymbolKey, TtlPolicy,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{MicroCache, QuoteStore};
use crate::jitter::{JitterSource, RandomJitter};
use crate::provider::QuoteProvider;
use crate::storage::DurableStore;

/// 조회 결과를 얻은 캐시 계층.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    L1,
    L2,
}

/// 재조회 대상.
struct RefetchTarget<'a> {
    index: usize,
    key: &'a SymbolKey,
    reason: ReasonCode,
}

/// 배치 시세 조회 서비스.
pub struct QuoteOrchestrator {
    l1: Arc<MicroCache>,
    l2: QuoteStore,
    policy: TtlPolicy,
    tw_provider: Arc<dyn QuoteProvider>,
    us_provider: Arc<dyn QuoteProvider>,
    jitter: Arc<dyn JitterSource>,
    cache: CacheSettings,
    batch: BatchSettings,
}

impl QuoteOrchestrator {
    /// 설정과 저장소, 시장별 provider로 오케스트레이터를 만듭니다.
    pub fn new(
        config: &QuoteConfig,
        store: Arc<dyn DurableStore>,
        tw_provider: Arc<dyn QuoteProvider>,
        us_provider: Arc<dyn QuoteProvider>,
    ) -> Self {
        Self {
            l1: Arc::new(MicroCache::new()),
            l2: QuoteStore::new(store),
            policy: TtlPolicy::new(config.market_hours.clone(), config.ttl.clone()),
            tw_provider,
            us_provider,
            jitter: Arc::new(RandomJitter::new(config.cache.jitter_max_secs)),
            cache: config.cache.clone(),
            batch: config.batch.clone(),
        }
    }

    /// L1 캐시를 교체합니다 (여러 인스턴스가 공유하거나 테스트에서 들여다볼 때).
    pub fn with_micro_cache(mut self, l1: Arc<MicroCache>) -> Self {
        self.l1 = l1;
        self
    }

    /// jitter 선택기를 교체합니다.
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn micro_cache(&self) -> &Arc<MicroCache> {
        &self.l1
    }

    pub fn default_market(&self) -> Market {
        self.batch.default_market
    }

    pub fn max_symbols_per_request(&self) -> usize {
        self.batch.max_symbols_per_request
    }

    fn provider(&self, market: Market) -> &Arc<dyn QuoteProvider> {
        match market {
            Market::Tw => &self.tw_provider,
            Market::Us => &self.us_provider,
        }
    }

    fn l1_ttl(&self, hard_secs: u64) -> u64 {
        self.cache.l1_ttl_secs.min(hard_secs)
    }

    /// 현재 시각 기준으로 심볼 목록의 시세를 조회합니다.
    pub async fn resolve_batch<S: AsRef<str>>(
        &self,
        symbols: &[S],
        market_override: Option<&str>,
    ) -> Vec<QuoteView> {
        self.resolve_batch_at(symbols, market_override, Utc::now()).await
    }

    /// 주어진 시각 기준으로 심볼 목록의 시세를 조회합니다.
    ///
    /// 심볼은 정규화 후 중복 제거되며, 결과는 남은 심볼의 입력 순서를 따릅니다.
    /// 재조회 기록 시각은 `now`에 배치 시작 후 경과 시간을 더한 값입니다.
    #[instrument(skip(self, symbols), fields(requested = symbols.len()))]
    pub async fn resolve_batch_at<S: AsRef<str>>(
        &self,
        symbols: &[S],
        market_override: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<QuoteView> {
        let started = Instant::now();
        let keys = normalize_symbols(symbols, market_override, self.batch.default_market);

        let mut results = Vec::with_capacity(keys.len());
        let mut candidates = Vec::new();

        for (index, key) in keys.iter().enumerate() {
            let (view, tier) = self.lookup(key, now).await;
            if tier == Tier::L2 && view.status == QuoteStatus::Missing {
                let reason = view.reason.clone().unwrap_or(ReasonCode::KvMiss);
                candidates.push(RefetchTarget { index, key, reason });
            }
            results.push(view);
        }

        if candidates.is_empty() || self.batch.max_sync_fetch == 0 {
            return results;
        }

        let deferred = candidates.len().saturating_sub(self.batch.max_sync_fetch);
        candidates.truncate(self.batch.max_sync_fetch);
        if deferred > 0 {
            debug!(deferred, budget = self.batch.max_sync_fetch, "Refetch budget exhausted");
        }

        let (tw_targets, us_targets): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|target| target.key.market == Market::Tw);

        info!(
            tw = tw_targets.len(),
            us = us_targets.len(),
            "Refetching quotes from upstream"
        );

        let tw_pool = join_all(
            tw_targets
                .iter()
                .map(|target| self.refetch(target, &results[target.index], now, started)),
        );

        let us_pool = async {
            let mut outcomes = Vec::with_capacity(us_targets.len());
            for chunk in us_targets.chunks(self.batch.us_chunk_size.max(1)) {
                let chunk_outcomes = join_all(
                    chunk
                        .iter()
                        .map(|target| self.refetch(target, &results[target.index], now, started)),
                )
                .await;
                outcomes.extend(chunk_outcomes);
            }
            outcomes
        };

        let (tw_outcomes, us_outcomes) = tokio::join!(tw_pool, us_pool);

        for (index, view) in tw_outcomes.into_iter().chain(us_outcomes) {
            results[index] = view;
        }

        results
    }

    /// L1, L2를 차례로 확인하고 분류된 뷰를 돌려줍니다.
    ///
    /// L1 적중은 그대로 응답에 쓰이며 재조회 대상이 되지 않습니다.
    async fn lookup(&self, key: &SymbolKey, now: DateTime<Utc>) -> (QuoteView, Tier) {
        if let Some(view) = self.l1.get(&key.cache_key, now).await {
            debug!(canonical = %key.canonical_symbol, "L1 hit");
            return (view.echo(&key.original_symbol), Tier::L1);
        }

        let record = match self.l2.get_quote(&key.cache_key).await {
            Ok(record) => record,
            Err(e) => {
                warn!(canonical = %key.canonical_symbol, error = %e, "L2 read failed, treating as miss");
                None
            }
        };

        let Some(record) = record else {
            debug!(canonical = %key.canonical_symbol, "L2 miss");
            return (QuoteView::missing(key, ReasonCode::KvMiss), Tier::L2);
        };

        let ttl = self.policy.ttl_seconds(key.market, now);
        let status = classify(
            now,
            record.fetched_at,
            ttl.soft,
            ttl.hard,
            record.soft_ttl_jitter_sec,
        );
        debug!(
            canonical = %key.canonical_symbol,
            status = %status,
            soft = ttl.soft,
            hard = ttl.hard,
            "L2 hit"
        );

        let view = QuoteView::from_record(key, &record, status);
        self.l1
            .set(&key.cache_key, view.clone(), self.l1_ttl(ttl.hard), now)
            .await;
        (view, Tier::L2)
    }

    /// provider에서 시세를 다시 가져와 두 캐시 계층에 기록합니다.
    ///
    /// 실패하면 기존 뷰에 provider 사유를 붙여 돌려줍니다.
    async fn refetch(
        &self,
        target: &RefetchTarget<'_>,
        prior: &QuoteView,
        now: DateTime<Utc>,
        started: Instant,
    ) -> (usize, QuoteView) {
        let key = target.key;
        let provider = self.provider(key.market);
        let failed = || {
            prior
                .clone()
                .with_reason(ReasonCode::provider_error(provider.name()))
        };

        let elapsed = Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());
        let fetched_at = now + elapsed;

        let quote = match provider.fetch_quote(&key.ticker).await {
            Ok(quote) => quote,
            Err(e) => {
                error!(
                    canonical = %key.canonical_symbol,
                    provider = provider.name(),
                    prior_reason = %target.reason,
                    error = %e,
                    "Upstream quote failed"
                );
                return (target.index, failed());
            }
        };

        let Some(price) = quote.price.filter(|p| p.is_finite()) else {
            warn!(
                canonical = %key.canonical_symbol,
                provider = provider.name(),
                "Upstream quote missing price"
            );
            return (target.index, failed());
        };

        let ttl = self.policy.ttl_seconds(key.market, fetched_at);
        let expires_at = i64::try_from(ttl.hard)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|d| fetched_at.checked_add_signed(d));

        let record = QuoteRecord {
            ticker: key.ticker.clone(),
            canonical_symbol: key.canonical_symbol.clone(),
            market: key.market,
            price: Some(price),
            currency: quote.currency,
            as_of: Some(quote.as_of.unwrap_or(fetched_at)),
            fetched_at,
            soft_ttl_jitter_sec: self.jitter.jitter_secs(),
            ttl_hard_sec: Some(ttl.hard),
            expires_at,
        };

        if let Err(e) = self.l2.put_quote(&key.cache_key, &record, Some(ttl.hard)).await {
            warn!(canonical = %key.canonical_symbol, error = %e, "L2 write failed");
        }

        let view = QuoteView::from_record(key, &record, QuoteStatus::Fresh);
        self.l1
            .set(&key.cache_key, view.clone(), self.l1_ttl(ttl.hard), fetched_at)
            .await;

        debug!(
            canonical = %key.canonical_symbol,
            price,
            jitter = record.soft_ttl_jitter_sec,
            hard = ttl.hard,
            "Quote refreshed"
        );
        (target.index, view)
    }
}
