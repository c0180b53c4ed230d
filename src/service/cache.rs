//! Single-slot cache of the last fetched quote.

use crate::core::config::CacheConfig;
use crate::core::{Clock, Origin, RateQuote};
use crate::store::{CACHE_SLOT, KeyValueStore, StoreError, read_json, write_json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Labels used by international price feeds. Untagged entries carrying one are not served.
const INTERNATIONAL_MARKERS: &[&str] = &[
    "international",
    "exchangerate",
    "exchange rate",
    "metal price api",
    "usd",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub rates: RateQuote,
    /// Epoch millis.
    pub timestamp: i64,
    pub expiry: i64,
}

pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    min_domestic_gold_rate: f64,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::hours(config.ttl_hours),
            min_domestic_gold_rate: config.min_domestic_gold_rate,
        }
    }

    fn looks_foreign(&self, quote: &RateQuote) -> bool {
        if !quote.gold_rate.is_finite() || quote.gold_rate < self.min_domestic_gold_rate {
            return true;
        }
        match quote.origin {
            Some(Origin::International) => true,
            Some(Origin::Domestic) => false,
            None => {
                let label = quote.source.to_lowercase();
                INTERNATIONAL_MARKERS.iter().any(|m| label.contains(m))
            }
        }
    }

    pub async fn try_get_cached_rates(&self) -> Result<Option<RateQuote>, StoreError> {
        let entry = match read_json::<CacheEntry>(self.store.as_ref(), CACHE_SLOT).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Rate cache MISS");
                return Ok(None);
            }
            Err(StoreError::Malformed { source, .. }) => {
                warn!(error = %source, "Discarding unreadable rate cache entry");
                self.store.remove(CACHE_SLOT).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if self.looks_foreign(&entry.rates) {
            debug!(
                source = %entry.rates.source,
                gold_rate = entry.rates.gold_rate,
                "Cached rates look like foreign-market data, clearing"
            );
            self.store.remove(CACHE_SLOT).await?;
            return Ok(None);
        }

        if self.clock.now().timestamp_millis() > entry.expiry {
            debug!("Rate cache entry expired");
            self.store.remove(CACHE_SLOT).await?;
            return Ok(None);
        }

        debug!("Rate cache HIT");
        Ok(Some(entry.rates))
    }

    pub async fn get_cached_rates(&self) -> Option<RateQuote> {
        self.try_get_cached_rates().await.unwrap_or_else(|e| {
            warn!(error = %e, "Rate cache unavailable");
            None
        })
    }

    /// The stored quote regardless of expiry, left in place. Foreign-looking or
    /// unreadable entries yield `None`.
    pub async fn last_cached_rates(&self) -> Option<RateQuote> {
        match read_json::<CacheEntry>(self.store.as_ref(), CACHE_SLOT).await {
            Ok(Some(entry)) if !self.looks_foreign(&entry.rates) => Some(entry.rates),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "No readable previous rates");
                None
            }
        }
    }

    pub async fn try_cache_rates(&self, rates: &RateQuote) -> Result<(), StoreError> {
        let now = self.clock.now();
        let entry = CacheEntry {
            rates: rates.clone(),
            timestamp: now.timestamp_millis(),
            expiry: (now + self.ttl).timestamp_millis(),
        };
        write_json(self.store.as_ref(), CACHE_SLOT, &entry).await?;
        debug!("Rate cache PUT");
        Ok(())
    }

    pub async fn cache_rates(&self, rates: &RateQuote) {
        if let Err(e) = self.try_cache_rates(rates).await {
            warn!(error = %e, "Failed to cache rates");
        }
    }

    pub async fn clear_cached_rates(&self) -> bool {
        match self.store.remove(CACHE_SLOT).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to clear rate cache");
                false
            }
        }
    }
}
