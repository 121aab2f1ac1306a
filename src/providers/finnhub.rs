//! Finnhub `/quote` provider.
//!
//! Finnhub answers unknown symbols with HTTP 200 and an all-zero quote, so a
//! zero current price is treated as "not found".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::AppError, models::Quote};

use super::{collect_per_symbol, endpoint, ensure_success, lenient_f64, to_volume, ProviderKind, QuoteProvider};

pub struct FinnhubProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    #[serde(default, deserialize_with = "lenient_f64")]
    c: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    d: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    dp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    v: Option<f64>,
    error: Option<String>,
}

fn parse_quote(symbol: &str, body: &str) -> Result<Quote, AppError> {
    let raw: FinnhubQuote = serde_json::from_str(body)?;

    if let Some(message) = raw.error {
        return Err(AppError::UpstreamError(format!("finnhub: {}", message)));
    }

    let price = raw
        .c
        .filter(|c| *c > 0.0)
        .ok_or_else(|| AppError::UpstreamError(format!("finnhub has no quote for {}", symbol)))?;

    let mut quote = Quote::from_prices(symbol, price, raw.pc, to_volume(raw.v));
    if let Some(change) = raw.d {
        quote.change = change;
    }
    if let Some(percent_change) = raw.dp {
        quote.percent_change = percent_change;
    }
    Ok(quote)
}

impl FinnhubProvider {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let token = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("FINNHUB_API_KEY must be set".into()))?;
        let url = endpoint(&self.base_url, &["quote"])?;
        debug!(%url, %symbol, "requesting finnhub quote");

        let response = self
            .client
            .get(url)
            .query(&[("symbol", symbol), ("token", token)])
            .send()
            .await?;
        let body = ensure_success(self.kind(), response).await?.text().await?;
        parse_quote(symbol, &body)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Finnhub
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        collect_per_symbol(self.kind(), symbols, |symbol| self.fetch_quote(symbol)).await
    }
}
