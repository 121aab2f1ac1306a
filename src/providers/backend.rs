use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{error::AppError, models::Quote};

use super::{ensure_success, lenient_f64, to_volume, ProviderKind, QuoteProvider};

/// The internal market-data backend, queried with the whole symbol list in one call.
pub struct BackendProvider {
    client: Client,
    url: String,
}

/// The backend has answered in three shapes over time; all are accepted, none is emitted.
/// Entries stay raw so one malformed entry cannot sink the rest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackendPayload {
    Wrapped { data: Vec<Value> },
    Stocks { stocks: Vec<Value> },
    Bare(Vec<Value>),
}

impl BackendPayload {
    fn into_entries(self) -> Vec<Value> {
        match self {
            BackendPayload::Wrapped { data } => data,
            BackendPayload::Stocks { stocks } => stocks,
            BackendPayload::Bare(entries) => entries,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendQuote {
    #[serde(default)]
    symbol: String,
    #[serde(default, alias = "current_price", deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change: Option<f64>,
    #[serde(default, alias = "percent_change", alias = "changePct", deserialize_with = "lenient_f64")]
    percent_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    volume: Option<f64>,
    #[serde(default, alias = "company_name")]
    name: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl BackendQuote {
    fn into_quote(self) -> Option<Quote> {
        if self.error.is_some() || self.symbol.trim().is_empty() {
            return None;
        }
        let price = self.price?;

        Some(Quote {
            symbol: self.symbol.trim().to_uppercase(),
            price,
            change: self.change.unwrap_or(0.0),
            percent_change: self.percent_change.unwrap_or(0.0),
            volume: to_volume(self.volume),
            name: self.name.filter(|n| !n.is_empty() && n != "-"),
            sector: self.sector.filter(|s| !s.is_empty() && s != "N/A" && s != "-"),
        })
    }
}

impl BackendProvider {
    pub fn new(client: Client, base_url: &str, quote_path: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url, quote_path),
        }
    }
}

fn parse_payload(body: &str) -> Result<Vec<Quote>, AppError> {
    let payload: BackendPayload = serde_json::from_str(body)?;
    let quotes: Vec<Quote> = payload
        .into_entries()
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<BackendQuote>(entry).ok())
        .filter_map(BackendQuote::into_quote)
        .collect();

    if quotes.is_empty() {
        return Err(AppError::UpstreamError("backend returned no quotes".into()));
    }
    Ok(quotes)
}

#[async_trait]
impl QuoteProvider for BackendProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Backend
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        let joined = symbols.join(",");
        debug!(url = %self.url, symbols = %joined, "requesting backend quotes");

        let response = self
            .client
            .get(&self.url)
            .query(&[("symbols", joined.as_str())])
            .send()
            .await?;
        let body = ensure_success(self.kind(), response).await?.text().await?;

        parse_payload(&body)
    }
}
