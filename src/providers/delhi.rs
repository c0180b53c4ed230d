use super::{BASE_GOLD_RATE, BASE_SILVER_RATE, MarketSession, round_rate};
use crate::core::{RateQuote, RateSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

pub const DELHI_MARKET_LABEL: &str = "Delhi Market Rates (Enhanced)";

/// Largest relative move from the session rate, either way.
const MAX_VARIANCE: f64 = 0.005;

/// Delhi bullion rates derived from a base rate, the market session and a
/// per-hour variance. The same hour always produces the same quote.
pub struct DelhiMarketSource {
    base_gold: f64,
    base_silver: f64,
}

impl Default for DelhiMarketSource {
    fn default() -> Self {
        Self::new(BASE_GOLD_RATE, BASE_SILVER_RATE)
    }
}

impl DelhiMarketSource {
    pub fn new(base_gold: f64, base_silver: f64) -> Self {
        Self {
            base_gold,
            base_silver,
        }
    }

    fn seed(now: DateTime<FixedOffset>) -> u64 {
        let day = now.date_naive().num_days_from_ce() as u64;
        day * 24 + now.hour() as u64
    }
}

#[async_trait]
impl RateSource for DelhiMarketSource {
    fn name(&self) -> &str {
        DELHI_MARKET_LABEL
    }

    #[instrument(name = "DelhiRateFetch", skip(self))]
    async fn fetch(&self, now: DateTime<FixedOffset>) -> Result<RateQuote> {
        let session = MarketSession::at(now.hour());
        let mut rng = StdRng::seed_from_u64(Self::seed(now));
        let gold_variance: f64 = rng.gen_range(-MAX_VARIANCE..=MAX_VARIANCE);
        let silver_variance: f64 = rng.gen_range(-MAX_VARIANCE..=MAX_VARIANCE);

        let gold = round_rate(self.base_gold * session.factor() * (1.0 + gold_variance));
        let silver = round_rate(self.base_silver * session.factor() * (1.0 + silver_variance));
        debug!(%session, gold, silver, "Computed Delhi market rates");

        Ok(RateQuote::domestic(gold, silver, DELHI_MARKET_LABEL, now)
            .with_note(format!("24K gold per gram, {session} session")))
    }
}
