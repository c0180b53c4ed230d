//! Core rate abstractions

pub mod clock;
pub mod config;
pub mod convert;
pub mod format;
pub mod log;
pub mod quote;

// Re-export main types for cleaner imports
pub use clock::{Clock, ManualClock, SystemClock};
pub use convert::convert_to_indian_rates;
pub use format::{RateTrend, TrendDirection, format_indian_rate, get_rate_trend};
pub use quote::{Origin, RateQuote, RateResponse, RateSource};
