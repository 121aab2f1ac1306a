use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError,
    models::{Candle, CandleSeries, ChartRange, Quote},
};

use super::{collect_per_symbol, endpoint, ensure_success, lenient_f64, to_volume, ProviderKind, QuoteProvider};

const NSE_SUFFIX: &str = ".NS";

pub struct TwelveDataProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// TwelveData reports most failures as HTTP 200 with `"status": "error"`.
#[derive(Debug, Deserialize)]
struct TwelveQuote {
    status: Option<String>,
    message: Option<String>,
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    percent_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    values: Vec<TimeSeriesValue>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    volume: Option<f64>,
}

/// NSE listings are addressed by bare ticker plus an `exchange` parameter.
fn symbol_params(symbol: &str) -> Vec<(&'static str, String)> {
    match symbol.strip_suffix(NSE_SUFFIX) {
        Some(bare) if !bare.is_empty() => vec![("symbol", bare.to_string()), ("exchange", "NSE".to_string())],
        _ => vec![("symbol", symbol.to_string())],
    }
}

fn check_status(status: Option<&str>, message: Option<&str>) -> Result<(), AppError> {
    if status == Some("error") {
        return Err(AppError::UpstreamError(format!(
            "twelvedata: {}",
            message.unwrap_or("unknown error")
        )));
    }
    Ok(())
}

fn parse_quote(symbol: &str, body: &str) -> Result<Quote, AppError> {
    let raw: TwelveQuote = serde_json::from_str(body)?;
    check_status(raw.status.as_deref(), raw.message.as_deref())?;

    let price = raw
        .close
        .or(raw.price)
        .ok_or_else(|| AppError::ParseError(format!("twelvedata quote for {} has no price", symbol)))?;

    let mut quote = Quote::from_prices(symbol, price, raw.previous_close, to_volume(raw.volume));
    if let Some(change) = raw.change {
        quote.change = change;
    }
    if let Some(percent_change) = raw.percent_change {
        quote.percent_change = percent_change;
    }
    quote.name = raw.name;
    Ok(quote)
}

fn parse_time_series(symbol: &str, body: &str) -> Result<CandleSeries, AppError> {
    let raw: TimeSeriesResponse = serde_json::from_str(body)?;
    check_status(raw.status.as_deref(), raw.message.as_deref())?;

    let mut series = CandleSeries::new(symbol);
    // newest first upstream
    for value in raw.values.into_iter().rev() {
        let Some(close) = value.close else {
            continue;
        };
        series.push(Candle {
            t: value.datetime,
            o: value.open.unwrap_or(close),
            h: value.high.unwrap_or(close),
            l: value.low.unwrap_or(close),
            c: close,
            v: to_volume(value.volume),
        });
    }

    if series.is_empty() {
        return Err(AppError::UpstreamError(format!("No chart data found for {}", symbol)));
    }
    Ok(series)
}

impl TwelveDataProvider {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("TWELVE_API_KEY must be set".into()))
    }

    async fn get(&self, path: &str, mut params: Vec<(&'static str, String)>) -> Result<String, AppError> {
        params.push(("apikey", self.api_key()?.to_string()));
        let url = endpoint(&self.base_url, &[path])?;
        debug!(%url, "requesting twelvedata {}", path);

        let response = self.client.get(url).query(&params).send().await?;
        Ok(ensure_success(self.kind(), response).await?.text().await?)
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let body = self.get("quote", symbol_params(symbol)).await?;
        parse_quote(symbol, &body)
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::TwelveData
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        collect_per_symbol(self.kind(), symbols, |symbol| self.fetch_quote(symbol)).await
    }

    async fn fetch_history(&self, symbol: &str, range: ChartRange) -> Result<CandleSeries, AppError> {
        let mut params = symbol_params(symbol);
        params.push(("interval", range.interval().as_twelve_data().to_string()));
        params.push(("outputsize", range.days().to_string()));

        let body = self.get("time_series", params).await?;
        parse_time_series(symbol, &body)
    }
}
