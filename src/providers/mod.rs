//! Upstream market-data providers.
//!
//! Every provider is a thin request/response wrapper around one HTTP API and
//! reshapes that API's JSON into [`Quote`] or [`CandleSeries`] values. None of
//! them retry; falling back to another provider is the resolver's job.

use std::{fmt, future::Future, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::AppError,
    models::{CandleSeries, ChartRange, Fundamentals, Quote},
};

pub mod alpha_vantage;
pub mod backend;
pub mod finnhub;
pub mod twelve_data;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use backend::BackendProvider;
pub use finnhub::FinnhubProvider;
pub use twelve_data::TwelveDataProvider;
pub use yahoo::YahooProvider;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Backend,
    Yahoo,
    TwelveData,
    AlphaVantage,
    Finnhub,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Backend => "backend",
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::TwelveData => "twelvedata",
            ProviderKind::AlphaVantage => "alphavantage",
            ProviderKind::Finnhub => "finnhub",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "backend" | "fastapi" => Ok(ProviderKind::Backend),
            "yahoo" | "yahoofinance" => Ok(ProviderKind::Yahoo),
            "twelvedata" | "twelve" => Ok(ProviderKind::TwelveData),
            "alphavantage" | "alpha" => Ok(ProviderKind::AlphaVantage),
            "finnhub" => Ok(ProviderKind::Finnhub),
            _ => Err(format!("Unknown provider '{}'", s)),
        }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the provider has the credentials it needs to be called at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Fetches quotes for already-normalized symbols. Fails when nothing usable came back.
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError>;

    async fn fetch_history(&self, symbol: &str, range: ChartRange) -> Result<CandleSeries, AppError> {
        let _ = (symbol, range);
        Err(AppError::UpstreamError(format!(
            "{} does not serve historical data",
            self.kind()
        )))
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, AppError> {
        let _ = symbol;
        Err(AppError::UpstreamError(format!(
            "{} does not serve fundamentals",
            self.kind()
        )))
    }
}

/// The concrete providers a running service talks to.
#[derive(Clone)]
pub struct ProviderSet {
    pub backend: Arc<dyn QuoteProvider>,
    pub quote_fallback: Arc<dyn QuoteProvider>,
    pub yahoo: Arc<dyn QuoteProvider>,
    pub twelve_data: Arc<dyn QuoteProvider>,
}

impl ProviderSet {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_client()?;

        let backend: Arc<dyn QuoteProvider> = Arc::new(BackendProvider::new(
            client.clone(),
            &config.backend_url,
            &config.backend_quote_path,
        ));
        let yahoo: Arc<dyn QuoteProvider> = Arc::new(YahooProvider::new(client.clone(), &config.yahoo_base_url));
        let twelve_data: Arc<dyn QuoteProvider> = Arc::new(TwelveDataProvider::new(
            client.clone(),
            &config.twelve_base_url,
            config.twelve_api_key.clone(),
        ));

        let quote_fallback: Arc<dyn QuoteProvider> = match config.quote_fallback {
            ProviderKind::Yahoo => yahoo.clone(),
            ProviderKind::TwelveData => twelve_data.clone(),
            ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(
                client,
                &config.alpha_vantage_base_url,
                config.alpha_vantage_api_key.clone(),
            )),
            ProviderKind::Finnhub => Arc::new(FinnhubProvider::new(
                client,
                &config.finnhub_base_url,
                config.finnhub_api_key.clone(),
            )),
            ProviderKind::Backend => {
                return Err(AppError::ConfigError("The backend cannot be its own fallback".into()));
            }
        };

        Ok(Self {
            backend,
            quote_fallback,
            yahoo,
            twelve_data,
        })
    }
}

pub fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Joins `base` with extra path segments, percent-encoding each segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::ConfigError(format!("Base URL '{}' cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turns a non-2xx status into an [`AppError::UpstreamError`] carrying the body text.
pub(crate) async fn ensure_success(kind: ProviderKind, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(AppError::UpstreamError(format!(
        "{} responded with {}: {}",
        kind, status, snippet
    )))
}

/// Runs `fetch` for each symbol in order and keeps the ones that resolved.
pub(crate) async fn collect_per_symbol<'a, F, Fut>(
    kind: ProviderKind,
    symbols: &'a [String],
    mut fetch: F,
) -> Result<Vec<Quote>, AppError>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<Quote, AppError>>,
{
    let mut quotes = Vec::with_capacity(symbols.len());
    let mut last_error = None;

    for symbol in symbols {
        match fetch(symbol.as_str()).await {
            Ok(quote) => {
                debug!(provider = %kind, %symbol, "quote resolved");
                quotes.push(quote);
            }
            Err(e) => {
                warn!(provider = %kind, %symbol, error = %e, "skipping symbol");
                last_error = Some(e);
            }
        }
    }

    if quotes.is_empty() {
        return Err(match last_error {
            Some(AppError::ConfigError(msg)) => AppError::ConfigError(msg),
            Some(e) => AppError::UpstreamError(format!("{} returned no quotes: {}", kind, e)),
            None => AppError::UpstreamError(format!("{} returned no quotes", kind)),
        });
    }

    Ok(quotes)
}

/// Accepts numbers, numeric strings (optionally with a trailing `%`) and treats anything else as absent.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').replace(',', "").parse::<f64>().ok(),
        _ => None,
    });
    Ok(number.filter(|x| x.is_finite()))
}

pub(crate) fn to_volume(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}
