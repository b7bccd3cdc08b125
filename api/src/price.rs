use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The quote service could not be reached, timed out or answered with an error status.
    Unavailable,
    /// The quote service answered without a usable price.
    Malformed,
}

/// Spot price of one bitcoin in a fiat currency.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn spot_price(&self, instrument: &str, timeout: Duration) -> Result<f64, PriceError>;
}

/// Latest tick of a spot market served by the coindesk data api.
pub struct CoindeskPriceSource {
    client: reqwest::Client,
    url: String,
    market: String,
}

impl CoindeskPriceSource {
    pub fn new(client: reqwest::Client, url: &str, market: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            market: market.to_string(),
        }
    }

    fn tick_url(&self, instrument: &str) -> Result<Url, PriceError> {
        Url::parse_with_params(
            &self.url,
            &[
                ("market", self.market.as_str()),
                ("instruments", instrument),
                ("apply_mapping", "false"),
            ],
        )
        .map_err(|_| PriceError::Unavailable)
    }
}

#[async_trait]
impl PriceSource for CoindeskPriceSource {
    async fn spot_price(&self, instrument: &str, timeout: Duration) -> Result<f64, PriceError> {
        let url = self.tick_url(instrument)?;
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(_) => return Err(PriceError::Unavailable),
        };

        if !response.status().is_success() {
            return Err(PriceError::Unavailable);
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => return Err(PriceError::Unavailable),
        };

        parse_tick(&body, instrument)
    }
}

/// Extracts `Data.{instrument}.PRICE` from a tick response.
pub fn parse_tick(body: &str, instrument: &str) -> Result<f64, PriceError> {
    let tick: Value = serde_json::from_str(body).map_err(|_| PriceError::Malformed)?;
    tick.get("Data")
        .and_then(|data| data.get(instrument))
        .and_then(|data| data.get("PRICE"))
        .and_then(Value::as_f64)
        .filter(|price| price.is_finite() && *price > 0.0)
        .ok_or(PriceError::Malformed)
}
