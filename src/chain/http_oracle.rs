//! HTTP price oracle client with retry/backoff.

use super::{ChainError, PriceOracle};
use crate::domain::{Decimal, TokenSymbol, UsdPrice};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Price oracle over a JSON HTTP API: `GET {base}/price/{symbol}` returning
/// `{"symbol": "...", "price": <number>}`.
#[derive(Debug, Clone)]
pub struct HttpPriceOracle {
    client: Client,
    base_url: String,
}

impl HttpPriceOracle {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ChainError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(ChainError::Oracle(e.to_string())))?;

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(ChainError::Oracle(format!(
                    "upstream status {}",
                    status
                ))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(ChainError::Oracle(format!(
                    "upstream status {}",
                    status
                ))));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(ChainError::Oracle(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn usd_price(&self, symbol: &TokenSymbol) -> Result<UsdPrice, ChainError> {
        let url = format!("{}/price/{}", self.base_url, symbol);
        debug!(symbol = %symbol, "fetching oracle price");
        let body = self.get_json(&url).await?;

        // Numbers arrive either as JSON numbers or as decimal strings;
        // parse through the string form to avoid float rounding.
        let price = match body.get("price") {
            Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
                .map_err(|e| ChainError::Oracle(format!("bad price number: {}", e)))?,
            Some(serde_json::Value::String(s)) => Decimal::from_str(s)
                .map_err(|e| ChainError::Oracle(format!("bad price string: {}", e)))?,
            _ => {
                return Err(ChainError::Oracle(format!(
                    "missing price field for {}",
                    symbol
                )))
            }
        };

        if price.is_negative() {
            return Err(ChainError::Oracle(format!(
                "negative price for {}",
                symbol
            )));
        }
        Ok(UsdPrice::new(price))
    }
}
