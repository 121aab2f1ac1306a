//! Yahoo Finance chart endpoint (`/v8/finance/chart/{symbol}`).
//!
//! One request per symbol. The chart `meta` block carries the latest price and
//! previous close, which is all a quote needs; the same endpoint with
//! `period1`/`period2` serves historical bars. Valuation figures come from the
//! separate `/v7/finance/quote` endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError,
    models::{Candle, CandleSeries, ChartRange, Fundamentals, Quote},
};

use super::{collect_per_symbol, endpoint, ensure_success, lenient_f64, to_volume, ProviderKind, QuoteProvider};

pub struct YahooProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponseBody,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseBody {
    #[serde(default)]
    result: Vec<QuoteSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE", default, deserialize_with = "lenient_f64")]
    trailing_pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    eps_trailing_twelve_months: Option<f64>,
}

impl YahooProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_chart(&self, symbol: &str, params: &[(&str, String)]) -> Result<ChartResult, AppError> {
        let url = endpoint(&self.base_url, &["v8", "finance", "chart", symbol])?;
        debug!(%url, "requesting yahoo chart");

        let response = self.client.get(url).query(params).send().await?;
        let body = ensure_success(self.kind(), response).await?.text().await?;
        parse_chart(&body)
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let params = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let chart = self.fetch_chart(symbol, &params).await?;
        quote_from_chart(symbol, &chart)
    }
}

fn parse_chart(body: &str) -> Result<ChartResult, AppError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        return Err(AppError::UpstreamError(format!(
            "yahoo chart error {}: {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }

    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AppError::ParseError("yahoo chart returned no result".into()))
}

fn parse_fundamentals(symbol: &str, body: &str) -> Result<Fundamentals, AppError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)?;
    let summary = envelope
        .quote_response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| AppError::UpstreamError(format!("yahoo has no quote summary for {}", symbol)))?;

    Ok(Fundamentals {
        market_cap: summary.market_cap,
        pe_ratio: summary.trailing_pe,
        eps: summary.eps_trailing_twelve_months,
    })
}

fn quote_from_chart(symbol: &str, chart: &ChartResult) -> Result<Quote, AppError> {
    let meta = &chart.meta;
    let price = meta
        .regular_market_price
        .ok_or_else(|| AppError::ParseError(format!("yahoo chart for {} has no price", symbol)))?;

    let volume = meta.regular_market_volume.or_else(|| {
        chart
            .indicators
            .as_ref()
            .and_then(|ind| ind.quote.first())
            .and_then(|q| q.volume.iter().rev().find_map(|v| *v))
    });

    let mut quote = Quote::from_prices(
        symbol,
        price,
        meta.chart_previous_close.or(meta.previous_close),
        to_volume(volume),
    );
    quote.name = meta.long_name.clone().or_else(|| meta.short_name.clone());
    Ok(quote)
}

fn at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

fn series_from_chart(symbol: &str, chart: &ChartResult) -> Result<CandleSeries, AppError> {
    let label_symbol = chart.meta.symbol.as_deref().unwrap_or(symbol);
    let mut series = CandleSeries::new(label_symbol);

    if let Some(bars) = chart.indicators.as_ref().and_then(|ind| ind.quote.first()) {
        for (i, ts) in chart.timestamp.iter().enumerate() {
            let (Some(close), Some(time)) = (at(&bars.close, i), DateTime::<Utc>::from_timestamp(*ts, 0)) else {
                continue;
            };
            series.push(Candle {
                t: time.to_rfc3339(),
                o: at(&bars.open, i).unwrap_or(close),
                h: at(&bars.high, i).unwrap_or(close),
                l: at(&bars.low, i).unwrap_or(close),
                c: close,
                v: to_volume(at(&bars.volume, i)),
            });
        }
    }

    if series.is_empty() {
        return Err(AppError::UpstreamError(format!("yahoo returned no chart data for {}", symbol)));
    }
    Ok(series)
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yahoo
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AppError> {
        collect_per_symbol(self.kind(), symbols, |symbol| self.fetch_quote(symbol)).await
    }

    async fn fetch_history(&self, symbol: &str, range: ChartRange) -> Result<CandleSeries, AppError> {
        let now = Utc::now();
        let start = now - Duration::days(range.days());
        let params = [
            ("period1", start.timestamp().to_string()),
            ("period2", now.timestamp().to_string()),
            ("interval", range.interval().as_yahoo().to_string()),
        ];

        let chart = self.fetch_chart(symbol, &params).await?;
        series_from_chart(symbol, &chart)
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, AppError> {
        let url = endpoint(&self.base_url, &["v7", "finance", "quote"])?;
        debug!(%url, %symbol, "requesting yahoo quote summary");

        let response = self.client.get(url).query(&[("symbols", symbol)]).send().await?;
        let body = ensure_success(self.kind(), response).await?.text().await?;
        parse_fundamentals(symbol, &body)
    }
}
