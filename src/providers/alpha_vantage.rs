//! Alpha Vantage `GLOBAL_QUOTE` provider.
//!
//! Note: the free tier allows 5 calls per minute and answers throttled calls
//! with HTTP 200 and a `Note` / `Information` field instead of a quote.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::AppError, models::Quote};

use super::{collect_per_symbol, endpoint, ensure_success, lenient_f64, to_volume, ProviderKind, QuoteProvider};

pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price", default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(rename = "06. volume", default, deserialize_with = "lenient_f64")]
    volume: Option<f64>,
    #[serde(rename = "08. previous close", default, deserialize_with = "lenient_f64")]
    previous_close: Option<f64>,
    #[serde(rename = "09. change", default, deserialize_with = "lenient_f64")]
    change: Option<f64>,
    #[serde(rename = "10. change percent", default, deserialize_with = "lenient_f64")]
    change_percent: Option<f64>,
}

fn parse_global_quote(symbol: &str, body: &str) -> Result<Quote, AppError> {
    let raw: GlobalQuoteResponse = serde_json::from_str(body)?;

    if let Some(message) = raw.error_message.or(raw.note).or(raw.information) {
        return Err(AppError::UpstreamError(format!("alphavantage: {}", message)));
    }

    // An unknown symbol comes back as an empty "Global Quote" object.
    let quote = raw
        .global_quote
        .ok_or_else(|| AppError::ParseError("alphavantage response has no Global Quote".into()))?;
    let price = quote
        .price
        .ok_or_else(|| AppError::UpstreamError(format!("alphavantage has no quote for {}", symbol)))?;

    let mut result = Quote::from_prices(symbol, price, quote.previous_close, to_volume(quote.volume));
    if let Some(change) = quote.change {
        result.change = change;
    }
    if let Some(change_percent) = quote.change_percent {
        result.percent_change = change_percent;
    }
    Ok(result)
}

impl AlphaVantageProvider {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("ALPHA_VANTAGE_API_KEY must be set".into()))?;
        let url = endpoint(&self.base_url, &["query"])?;
        debug!(%url, %symbol, "requesting alphavantage global quote");

        let response = self
            .client
            .get(url)
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol), ("apikey", api_key)])
            .send()
            .await?;
        let body = ensure_success(self.kind(), response).await?.text().await?;
        parse_global_quote(symbol, &body)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AlphaVantage
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        collect_per_symbol(self.kind(), symbols, |symbol| self.fetch_quote(symbol)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_quote() {
        let body = r#"{"Global Quote": {
            "01. symbol": "IBM", "05. price": "187.4200", "06. volume": "3456789",
            "08. previous close": "185.0000", "09. change": "2.4200", "10. change percent": "1.3081%"
        }}"#;
        let quote = parse_global_quote("IBM", body).unwrap();
        assert_eq!(quote.price, 187.42);
        assert_eq!(quote.change, 2.42);
        assert_eq!(quote.percent_change, 1.3081);
        assert_eq!(quote.volume, 3_456_789);
    }

    #[test]
    fn empty_global_quote_is_a_failure() {
        assert!(parse_global_quote("NOPE", r#"{"Global Quote": {}}"#).is_err());
    }

    #[test]
    fn rate_limit_note_is_a_failure() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        assert!(matches!(parse_global_quote("IBM", body), Err(AppError::UpstreamError(_))));
    }
}
