use super::{BASE_GOLD_RATE, BASE_SILVER_RATE, MarketSession, round_rate};
use crate::core::{RateQuote, RateSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Timelike};

pub const SIMULATED_LABEL: &str = "Simulated Market Rates (Fallback)";

/// Session-adjusted base rates, served when a live update is not allowed or failed.
#[derive(Default)]
pub struct SimulatedSource;

#[async_trait]
impl RateSource for SimulatedSource {
    fn name(&self) -> &str {
        SIMULATED_LABEL
    }

    async fn fetch(&self, now: DateTime<FixedOffset>) -> Result<RateQuote> {
        let factor = MarketSession::at(now.hour()).factor();
        Ok(RateQuote::domestic(
            round_rate(BASE_GOLD_RATE * factor),
            round_rate(BASE_SILVER_RATE * factor),
            SIMULATED_LABEL,
            now,
        )
        .with_note("Indicative rates; live update not available right now"))
    }
}
