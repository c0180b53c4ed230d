pub mod delhi;
pub mod live_spot;
pub mod simulated;
pub mod util;

use crate::core::RateQuote;
use chrono::{DateTime, FixedOffset};
use std::fmt::Display;

pub use delhi::DelhiMarketSource;
pub use live_spot::LiveSpotSource;
pub use simulated::SimulatedSource;

/// 24K gold, INR per gram.
pub const BASE_GOLD_RATE: f64 = 11_370.0;
/// Fine silver, INR per gram.
pub const BASE_SILVER_RATE: f64 = 145.0;

pub const EMERGENCY_LABEL: &str = "Emergency Fallback Rates";

/// Served when every source, the fallback included, has failed.
pub fn emergency_quote(now: DateTime<FixedOffset>) -> RateQuote {
    RateQuote::domestic(BASE_GOLD_RATE, BASE_SILVER_RATE, EMERGENCY_LABEL, now)
        .with_note("Rates may be outdated")
}

pub(crate) fn round_rate(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

/// Part of the Delhi bullion trading day an hour falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSession {
    PreOpen,
    Morning,
    Afternoon,
    Evening,
    AfterHours,
}

impl MarketSession {
    pub fn at(hour: u32) -> Self {
        match hour {
            0..=8 => MarketSession::PreOpen,
            9..=11 => MarketSession::Morning,
            12..=15 => MarketSession::Afternoon,
            16..=19 => MarketSession::Evening,
            _ => MarketSession::AfterHours,
        }
    }

    /// Multiplier applied to the base rate during this session.
    pub fn factor(&self) -> f64 {
        match self {
            MarketSession::PreOpen => 0.998,
            MarketSession::Morning => 1.0,
            MarketSession::Afternoon => 1.003,
            MarketSession::Evening => 1.005,
            MarketSession::AfterHours => 1.001,
        }
    }
}

impl Display for MarketSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MarketSession::PreOpen => "pre-open",
                MarketSession::Morning => "morning",
                MarketSession::Afternoon => "afternoon",
                MarketSession::Evening => "evening",
                MarketSession::AfterHours => "after-hours",
            }
        )
    }
}
