//! Per-day counter of live rate fetches.

use crate::core::Clock;
use crate::store::{KeyValueStore, StoreError, USAGE_SLOT, read_json, write_json};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub count: u32,
    pub last_call: Option<DateTime<FixedOffset>>,
}

impl UsageRecord {
    pub fn fresh(now: DateTime<FixedOffset>) -> Self {
        Self {
            date: day_of(now),
            count: 0,
            last_call: None,
        }
    }
}

pub(crate) fn day_of(at: DateTime<FixedOffset>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Today's record, replacing a stale or unreadable one with a zero record.
    pub async fn try_usage_today(&self) -> Result<UsageRecord, StoreError> {
        let now = self.clock.now();
        let today = day_of(now);

        let stored = match read_json::<UsageRecord>(self.store.as_ref(), USAGE_SLOT).await {
            Ok(stored) => stored,
            Err(StoreError::Malformed { .. }) => {
                warn!("Discarding unreadable usage record");
                None
            }
            Err(e) => return Err(e),
        };

        match stored {
            Some(record) if record.date == today => Ok(record),
            stale => {
                if let Some(old) = stale {
                    debug!("Usage day rolled over from {} to {}", old.date, today);
                }
                let record = UsageRecord::fresh(now);
                write_json(self.store.as_ref(), USAGE_SLOT, &record).await?;
                Ok(record)
            }
        }
    }

    pub async fn try_increment_usage(&self) -> Result<UsageRecord, StoreError> {
        let mut record = self.try_usage_today().await?;
        record.count += 1;
        record.last_call = Some(self.clock.now());
        write_json(self.store.as_ref(), USAGE_SLOT, &record).await?;
        debug!("API usage for {} is now {}", record.date, record.count);
        Ok(record)
    }

    /// Like [`try_usage_today`](Self::try_usage_today), treating storage failures as a reset.
    pub async fn usage_today(&self) -> UsageRecord {
        match self.try_usage_today().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Usage storage unavailable, assuming no calls today");
                UsageRecord::fresh(self.clock.now())
            }
        }
    }

    pub async fn increment_usage(&self) -> UsageRecord {
        match self.try_increment_usage().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to record API usage");
                let now = self.clock.now();
                UsageRecord {
                    count: 1,
                    last_call: Some(now),
                    ..UsageRecord::fresh(now)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;

    fn tracker_at(now: &str) -> (UsageTracker, Arc<ManualClock>, MemoryStore) {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::parse(now).unwrap());
        let tracker = UsageTracker::new(Arc::new(store.clone()), clock.clone());
        (tracker, clock, store)
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _slot: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        async fn set(&self, _slot: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        async fn remove(&self, _slot: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_first_read_creates_zero_record() {
        let (tracker, _, store) = tracker_at("2026-10-19T07:00:00+05:30");

        let record = tracker.usage_today().await;
        assert_eq!(record.date, "2026-10-19");
        assert_eq!(record.count, 0);
        assert!(record.last_call.is_none());
        assert!(store.get(USAGE_SLOT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_increment_counts_sequential_calls() {
        let (tracker, _, _) = tracker_at("2026-10-19T08:10:00+05:30");

        for expected in 1..=3 {
            let record = tracker.increment_usage().await;
            assert_eq!(record.count, expected);
        }
        let record = tracker.usage_today().await;
        assert_eq!(record.count, 3);
        assert_eq!(
            record.last_call.unwrap().to_rfc3339(),
            "2026-10-19T08:10:00+05:30"
        );
    }

    #[tokio::test]
    async fn test_day_rollover_resets_count() {
        let (tracker, clock, _) = tracker_at("2026-10-19T15:30:00+05:30");
        tracker.increment_usage().await;
        tracker.increment_usage().await;

        clock.advance(Duration::days(1));
        let record = tracker.usage_today().await;
        assert_eq!(record.date, "2026-10-20");
        assert_eq!(record.count, 0);
        assert!(record.last_call.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_record_is_replaced() {
        let (tracker, _, store) = tracker_at("2026-10-19T08:00:00+05:30");
        store.set(USAGE_SLOT, "{broken".to_string()).await.unwrap();

        let record = tracker.try_usage_today().await.unwrap();
        assert_eq!(record.count, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_typed_and_swallowed() {
        let clock = Arc::new(ManualClock::parse("2026-10-19T08:00:00+05:30").unwrap());
        let tracker = UsageTracker::new(Arc::new(BrokenStore), clock);

        assert!(matches!(
            tracker.try_usage_today().await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(tracker.usage_today().await.count, 0);
        assert_eq!(tracker.increment_usage().await.count, 1);
    }
}
