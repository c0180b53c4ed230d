//! Display helpers for rates shown to shoppers.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TrendDirection::Up => "▲",
                TrendDirection::Down => "▼",
                TrendDirection::Stable => "●",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTrend {
    pub direction: TrendDirection,
    pub change: f64,
    pub percentage: f64,
}

impl RateTrend {
    fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            change: 0.0,
            percentage: 0.0,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a rate in rupees with Indian digit grouping, e.g. `₹1,13,700.50`.
pub fn format_indian_rate(rate: f64) -> String {
    if !rate.is_finite() {
        return "₹--".to_string();
    }

    let fixed = format!("{:.2}", rate.abs());
    let (integral, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if integral.len() <= 3 {
        integral.to_string()
    } else {
        let (head, last_three) = integral.split_at(integral.len() - 3);
        let mut pairs: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            pairs.push(&head[start..end]);
            end = start;
        }
        pairs.reverse();
        format!("{},{}", pairs.join(","), last_three)
    };

    let sign = if rate < 0.0 && round2(rate) != 0.0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{fraction}")
}

/// Compares a rate with its previous value.
pub fn get_rate_trend(current: f64, previous: f64) -> RateTrend {
    if !current.is_finite() || !previous.is_finite() || previous <= 0.0 {
        return RateTrend::stable();
    }

    let change = round2(current - previous);
    let percentage = round2((current - previous) / previous * 100.0);
    let direction = if change > 0.0 {
        TrendDirection::Up
    } else if change < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    RateTrend {
        direction,
        change,
        percentage,
    }
}
