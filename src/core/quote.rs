//! Rate quote types shared by sources, the cache and the service.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Where the numbers of a quote were priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Domestic,
    International,
}

/// Gold and silver rates in INR per gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub gold_rate: f64,
    pub silver_rate: f64,
    pub source: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Absent on entries written before quotes were tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl RateQuote {
    pub fn domestic(
        gold_rate: f64,
        silver_rate: f64,
        source: &str,
        at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            gold_rate,
            silver_rate,
            source: source.to_string(),
            timestamp: at.to_rfc3339(),
            note: None,
            origin: Some(Origin::Domestic),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Outcome of a fetch. `data` is always renderable, even when `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateResponse {
    pub success: bool,
    pub data: RateQuote,
    pub error: Option<String>,
}

impl RateResponse {
    pub fn ok(data: RateQuote) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn degraded(data: RateQuote, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, now: DateTime<FixedOffset>) -> Result<RateQuote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_json_shape() {
        let at = DateTime::parse_from_rfc3339("2026-10-19T08:15:00+05:30").unwrap();
        let quote = RateQuote::domestic(11370.0, 145.0, "Delhi Market Rates (Enhanced)", at);
        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(json["goldRate"], 11370.0);
        assert_eq!(json["silverRate"], 145.0);
        assert_eq!(json["timestamp"], "2026-10-19T08:15:00+05:30");
        assert_eq!(json["origin"], "domestic");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_untagged_quote_deserializes() {
        let json = r#"{
            "goldRate": 6200.5,
            "silverRate": 75.0,
            "source": "International Spot (ExchangeRate-API)",
            "timestamp": "2025-01-01T10:00:00Z"
        }"#;
        let quote: RateQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.gold_rate, 6200.5);
        assert!(quote.origin.is_none());
        assert!(quote.note.is_none());
    }
}
