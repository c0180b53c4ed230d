//! Troy-ounce USD spot prices to Indian retail rates per gram.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

pub const GRAMS_PER_TROY_OUNCE: Decimal = Decimal::from_parts(311035, 0, 0, false, 4);

/// Import duty, GST, dealer margin and the local market premium combined.
pub const INDIAN_MARKET_MARKUP: Decimal = Decimal::from_parts(130, 0, 0, false, 2);

/// Converts a USD price per troy ounce into INR per gram at Indian retail levels.
///
/// Non-finite input yields `NaN`; callers guard before displaying.
pub fn convert_to_indian_rates(price_per_troy_ounce_usd: f64, usd_to_inr_rate: f64) -> f64 {
    let (Some(price), Some(fx)) = (
        Decimal::from_f64(price_per_troy_ounce_usd),
        Decimal::from_f64(usd_to_inr_rate),
    ) else {
        return f64::NAN;
    };
    let Some(per_gram_usd) = price.checked_div(GRAMS_PER_TROY_OUNCE) else {
        return f64::NAN;
    };
    per_gram_usd
        .checked_mul(fx)
        .and_then(|inr| inr.checked_mul(INDIAN_MARKET_MARKUP))
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_f64())
        .unwrap_or(f64::NAN)
}
