use super::util::{RetryPolicy, with_retry};
use crate::core::config::{ExchangeRateProviderConfig, MetalPriceProviderConfig};
use crate::core::{RateQuote, RateSource, convert_to_indian_rates};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const LIVE_SPOT_LABEL: &str = "Live Spot Rates (INR converted from USD)";

#[derive(Debug, Deserialize)]
struct MetalPriceResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    rates: HashMap<String, f64>,
}

/// Spot gold and silver from a metals price API, converted at the live USD/INR rate.
pub struct LiveSpotSource {
    client: reqwest::Client,
    metal: MetalPriceProviderConfig,
    exchange: ExchangeRateProviderConfig,
    retry: RetryPolicy,
}

impl LiveSpotSource {
    pub fn new(
        metal: MetalPriceProviderConfig,
        exchange: ExchangeRateProviderConfig,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("metalrates/1.0")
            .build()?;
        Ok(Self {
            client,
            metal,
            exchange,
            retry,
        })
    }

    /// USD per troy ounce for gold and silver.
    async fn fetch_spot(&self) -> Result<(f64, f64)> {
        let url = format!(
            "{}/v1/latest?api_key={}&base=USD&currencies=XAU,XAG",
            self.metal.base_url, self.metal.api_key
        );
        debug!("Requesting metal spot prices from {}", self.metal.base_url);

        let response = with_retry(
            || async { self.client.get(&url).send().await?.error_for_status() },
            self.retry,
        )
        .await
        .context("Metal price request failed")?;

        let data: MetalPriceResponse = response
            .json()
            .await
            .context("Failed to parse metal price response")?;
        if !data.success {
            return Err(anyhow!("Metal price API reported failure"));
        }

        Ok((
            price_per_ounce(&data.rates, "XAU")?,
            price_per_ounce(&data.rates, "XAG")?,
        ))
    }

    async fn fetch_usd_inr(&self) -> Result<f64> {
        let url = format!("{}/v4/latest/USD", self.exchange.base_url);
        debug!("Requesting USD/INR from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await?.error_for_status() },
            self.retry,
        )
        .await
        .context("Exchange rate request failed")?;

        let data: ExchangeRateResponse = response
            .json()
            .await
            .context("Failed to parse exchange rate response")?;
        data.rates
            .get("INR")
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| anyhow!("No INR rate in exchange rate response"))
    }
}

/// Prefers an explicit `USDXAU` quote, else inverts the ounces-per-dollar `XAU` rate.
fn price_per_ounce(rates: &HashMap<String, f64>, symbol: &str) -> Result<f64> {
    if let Some(price) = rates.get(&format!("USD{symbol}")) {
        return Ok(*price);
    }
    match rates.get(symbol) {
        Some(rate) if *rate > 0.0 => Ok(1.0 / rate),
        Some(_) => Err(anyhow!("Invalid rate (zero) for {}", symbol)),
        None => Err(anyhow!("No rate found for {}", symbol)),
    }
}

#[async_trait]
impl RateSource for LiveSpotSource {
    fn name(&self) -> &str {
        LIVE_SPOT_LABEL
    }

    #[instrument(name = "LiveSpotFetch", skip(self))]
    async fn fetch(&self, now: DateTime<FixedOffset>) -> Result<RateQuote> {
        let ((gold_oz, silver_oz), usd_inr) =
            futures::try_join!(self.fetch_spot(), self.fetch_usd_inr())?;

        let gold = convert_to_indian_rates(gold_oz, usd_inr);
        let silver = convert_to_indian_rates(silver_oz, usd_inr);
        if !(gold.is_finite() && silver.is_finite() && gold > 0.0 && silver > 0.0) {
            return Err(anyhow!(
                "Converted rates are not usable: gold {gold}, silver {silver}"
            ));
        }
        debug!(gold_oz, silver_oz, usd_inr, gold, silver, "Converted spot rates");

        Ok(RateQuote::domestic(gold, silver, LIVE_SPOT_LABEL, now)
            .with_note(format!("USD/INR {usd_inr:.2}")))
    }
}
