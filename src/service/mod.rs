//! The rate service: cache first, then the schedule gate, then the source chain.

pub mod cache;
pub mod schedule;
pub mod usage;

use crate::core::config::AppConfig;
use crate::core::{Clock, RateQuote, RateResponse, RateSource};
use crate::providers::util::RetryPolicy;
use crate::providers::{DelhiMarketSource, LiveSpotSource, SimulatedSource, emergency_quote};
use crate::store::KeyValueStore;
use anyhow::Result;
use cache::CacheStore;
use chrono::{DateTime, FixedOffset};
use schedule::{GateDecision, ScheduleGate};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use usage::{UsageRecord, UsageTracker};

/// Snapshot of the scheduling state for the current instant.
#[derive(Debug, Clone)]
pub struct ScheduleStatus {
    pub now: DateTime<FixedOffset>,
    pub usage: UsageRecord,
    pub max_daily_requests: u32,
    pub decision: GateDecision,
    pub cached: Option<RateQuote>,
}

pub struct RateService {
    clock: Arc<dyn Clock>,
    usage: UsageTracker,
    cache: CacheStore,
    gate: ScheduleGate,
    primary: Vec<Box<dyn RateSource>>,
    fallback: Box<dyn RateSource>,
}

impl RateService {
    /// Builds the service with the sources the configuration enables.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Result<Self> {
        let mut primary: Vec<Box<dyn RateSource>> = Vec::new();
        if let (Some(metal), Some(exchange)) = (
            config.providers.metal_price.clone(),
            config.providers.exchange_rate.clone(),
        ) {
            primary.push(Box::new(LiveSpotSource::new(
                metal,
                exchange,
                RetryPolicy::default(),
            )?));
        }
        primary.push(Box::new(DelhiMarketSource::default()));

        Ok(Self {
            usage: UsageTracker::new(Arc::clone(&store), Arc::clone(&clock)),
            cache: CacheStore::new(store, Arc::clone(&clock), &config.cache),
            gate: ScheduleGate::new(&config.schedule),
            clock,
            primary,
            fallback: Box::new(SimulatedSource),
        })
    }

    /// Replaces the source chain.
    pub fn with_sources(
        mut self,
        primary: Vec<Box<dyn RateSource>>,
        fallback: Box<dyn RateSource>,
    ) -> Self {
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.primary.iter().map(|s| s.name()).collect()
    }

    /// Current rates. Never fails: every failure path still yields a renderable quote.
    pub async fn fetch_live_metal_rates(&self) -> RateResponse {
        let now = self.clock.now();

        if let Some(cached) = self.cache.get_cached_rates().await {
            debug!(source = %cached.source, "Serving cached rates");
            return RateResponse::ok(cached);
        }

        let usage = self.usage.usage_today().await;
        let decision = self.gate.check(now, &usage);
        if !decision.is_allowed() {
            info!(%decision, "Live update not due, serving fallback rates");
            return self.fallback_response(now, decision.to_string()).await;
        }

        info!(%decision, "Fetching live metal rates");
        let mut failures = Vec::new();
        for source in &self.primary {
            match source.fetch(now).await {
                Ok(quote) => {
                    self.cache.cache_rates(&quote).await;
                    let usage = self.usage.increment_usage().await;
                    info!(
                        source = %quote.source,
                        gold = quote.gold_rate,
                        silver = quote.silver_rate,
                        calls_today = usage.count,
                        "Fetched live metal rates"
                    );
                    return RateResponse::ok(quote);
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        error = %format_args!("{e:#}"),
                        "Rate source failed"
                    );
                    failures.push(format!("{}: {e:#}", source.name()));
                }
            }
        }

        // Count the attempt so a failing source is not retried until the next window.
        self.usage.increment_usage().await;
        let error = if failures.is_empty() {
            "no live rate source configured".to_string()
        } else {
            format!("live rate sources failed ({})", failures.join("; "))
        };
        self.fallback_response(now, error).await
    }

    async fn fallback_response(&self, now: DateTime<FixedOffset>, error: String) -> RateResponse {
        match self.fallback.fetch(now).await {
            Ok(quote) => RateResponse::degraded(quote, error),
            Err(e) => {
                error!(
                    error = %format_args!("{e:#}"),
                    "Fallback rate source failed, serving emergency rates"
                );
                RateResponse::degraded(
                    emergency_quote(now),
                    format!("{error}; fallback rates unavailable: {e:#}"),
                )
            }
        }
    }

    pub async fn cache_rates(&self, quote: &RateQuote) {
        self.cache.cache_rates(quote).await
    }

    pub async fn get_cached_rates(&self) -> Option<RateQuote> {
        self.cache.get_cached_rates().await
    }

    /// The last cached quote even if expired, for comparing against a new fetch.
    pub async fn last_cached_rates(&self) -> Option<RateQuote> {
        self.cache.last_cached_rates().await
    }

    pub async fn clear_cached_rates(&self) -> bool {
        self.cache.clear_cached_rates().await
    }

    pub async fn usage_today(&self) -> UsageRecord {
        self.usage.usage_today().await
    }

    pub async fn schedule_status(&self) -> ScheduleStatus {
        let now = self.clock.now();
        let usage = self.usage.usage_today().await;
        ScheduleStatus {
            now,
            decision: self.gate.check(now, &usage),
            max_daily_requests: self.gate.max_daily_requests(),
            usage,
            cached: self.cache.get_cached_rates().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::providers::delhi::DELHI_MARKET_LABEL;
    use crate::providers::simulated::SIMULATED_LABEL;
    use crate::providers::{BASE_GOLD_RATE, EMERGENCY_LABEL};
    use crate::store::{MemoryStore, StoreError};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        label: &'static str,
        gold_rate: Option<f64>,
        call_count: Arc<AtomicUsize>,
    }

    impl MockSource {
        fn ok(label: &'static str, gold_rate: f64) -> (Box<dyn RateSource>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source: Box<dyn RateSource> = Box::new(MockSource {
                label,
                gold_rate: Some(gold_rate),
                call_count: Arc::clone(&calls),
            });
            (source, calls)
        }

        fn failing(label: &'static str) -> (Box<dyn RateSource>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source: Box<dyn RateSource> = Box::new(MockSource {
                label,
                gold_rate: None,
                call_count: Arc::clone(&calls),
            });
            (source, calls)
        }
    }

    #[async_trait]
    impl RateSource for MockSource {
        fn name(&self) -> &str {
            self.label
        }

        async fn fetch(&self, now: DateTime<FixedOffset>) -> Result<RateQuote> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.gold_rate {
                Some(gold) => Ok(RateQuote::domestic(gold, 150.0, self.label, now)),
                None => {
                    Err(anyhow!("connection refused").context(format!("{} is down", self.label)))
                }
            }
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _slot: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        async fn set(&self, _slot: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        async fn remove(&self, _slot: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn service_at(now: &str) -> (RateService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::parse(now).unwrap());
        let service = RateService::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            &AppConfig::default(),
        )
        .unwrap();
        (service, clock)
    }

    #[tokio::test]
    async fn test_default_chain() {
        let (service, _) = service_at("2026-10-19T08:00:00+05:30");
        assert_eq!(service.source_names(), vec![DELHI_MARKET_LABEL]);
    }

    #[tokio::test]
    async fn test_outside_window_serves_fallback() {
        let (service, _) = service_at("2026-10-19T09:00:00+05:30");

        let response = service.fetch_live_metal_rates().await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("not scheduled"));
        assert_eq!(response.data.source, SIMULATED_LABEL);
        assert_eq!(service.usage_today().await.count, 0);
        assert!(service.get_cached_rates().await.is_none());
    }

    #[tokio::test]
    async fn test_scheduled_fetch_caches_and_counts() {
        let (service, _) = service_at("2026-10-19T08:05:00+05:30");

        let response = service.fetch_live_metal_rates().await;
        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.data.source, DELHI_MARKET_LABEL);
        assert_eq!(service.usage_today().await.count, 1);
        assert_eq!(service.get_cached_rates().await, Some(response.data));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_gate_and_sources() {
        let (service, _) = service_at("2026-10-19T08:05:00+05:30");
        let (primary, calls) = MockSource::ok("Primary", 12000.0);
        let (fallback, _) = MockSource::ok("Fallback", 11000.0);
        let service = service.with_sources(vec![primary], fallback);

        let first = service.fetch_live_metal_rates().await;
        let second = service.fetch_live_metal_rates().await;

        assert!(first.success && second.success);
        assert_eq!(first.data, second.data);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.usage_today().await.count, 1);
    }

    #[tokio::test]
    async fn test_second_call_in_window_after_clear_is_denied() {
        let (service, clock) = service_at("2026-10-19T08:05:00+05:30");
        assert!(service.fetch_live_metal_rates().await.success);
        assert!(service.clear_cached_rates().await);

        clock.advance(Duration::minutes(30));
        let response = service.fetch_live_metal_rates().await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("already updated"));
    }

    #[tokio::test]
    async fn test_both_windows_then_daily_limit() {
        let (service, clock) = service_at("2026-10-19T08:05:00+05:30");
        assert!(service.fetch_live_metal_rates().await.success);

        clock.advance(Duration::hours(7));
        service.clear_cached_rates().await;
        assert!(service.fetch_live_metal_rates().await.success);
        assert_eq!(service.usage_today().await.count, 2);

        clock.advance(Duration::minutes(10));
        service.clear_cached_rates().await;
        let response = service.fetch_live_metal_rates().await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("daily limit reached"));
        assert_eq!(service.usage_today().await.count, 2);
    }

    #[tokio::test]
    async fn test_primary_failure_counts_usage_and_falls_back() {
        let (service, _) = service_at("2026-10-19T15:10:00+05:30");
        let (live, live_calls) = MockSource::failing("Live");
        let (delhi, delhi_calls) = MockSource::failing("Delhi");
        let (fallback, _) = MockSource::ok("Fallback", 11000.0);
        let service = service.with_sources(vec![live, delhi], fallback);

        let response = service.fetch_live_metal_rates().await;
        assert!(!response.success);
        assert_eq!(response.data.source, "Fallback");
        let error = response.error.unwrap();
        assert!(error.contains("Live: Live is down: connection refused"));
        assert!(error.contains("Delhi: Delhi is down: connection refused"));
        assert_eq!(live_calls.load(Ordering::SeqCst), 1);
        assert_eq!(delhi_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.usage_today().await.count, 1);
        assert!(service.get_cached_rates().await.is_none());
    }

    #[tokio::test]
    async fn test_chain_moves_to_next_primary() {
        let (service, _) = service_at("2026-10-19T08:10:00+05:30");
        let (live, _) = MockSource::failing("Live");
        let (delhi, _) = MockSource::ok("Delhi", 11500.0);
        let (fallback, fallback_calls) = MockSource::ok("Fallback", 11000.0);
        let service = service.with_sources(vec![live, delhi], fallback);

        let response = service.fetch_live_metal_rates().await;
        assert!(response.success);
        assert_eq!(response.data.source, "Delhi");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_source_failing_serves_emergency_rates() {
        for now in ["2026-10-19T08:10:00+05:30", "2026-10-19T11:00:00+05:30"] {
            let (service, _) = service_at(now);
            let (live, _) = MockSource::failing("Live");
            let (fallback, _) = MockSource::failing("Fallback");
            let service = service.with_sources(vec![live], fallback);

            let response = service.fetch_live_metal_rates().await;
            assert!(!response.success);
            assert_eq!(response.data.source, EMERGENCY_LABEL);
            assert_eq!(response.data.gold_rate, BASE_GOLD_RATE);
            assert!(response.data.gold_rate > 0.0);
            assert!(response.error.unwrap().contains("fallback rates unavailable"));
        }
    }

    #[tokio::test]
    async fn test_broken_storage_still_answers() {
        let clock = Arc::new(ManualClock::parse("2026-10-19T08:10:00+05:30").unwrap());
        let service =
            RateService::new(Arc::new(BrokenStore), clock, &AppConfig::default()).unwrap();

        let response = service.fetch_live_metal_rates().await;
        assert!(response.success);
        assert!(response.data.gold_rate > 0.0);
        assert!(!service.clear_cached_rates().await);
    }

    #[tokio::test]
    async fn test_schedule_status() {
        let (service, _) = service_at("2026-10-19T12:00:00+05:30");
        let status = service.schedule_status().await;

        assert_eq!(status.usage.count, 0);
        assert_eq!(status.max_daily_requests, 2);
        assert!(!status.decision.is_allowed());
        assert!(status.cached.is_none());
    }
}
