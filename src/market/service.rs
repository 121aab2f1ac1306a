use futures::future::join_all;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::AppError,
    market::{
        model::ProviderMode,
        resolver::{resolve_with_fallback, Resolution},
    },
    models::{CandleSeries, ChartRange, Quote, ScreenerRow},
    providers::{ProviderSet, QuoteProvider},
    utils::{normalize_symbol, normalize_symbols},
};

#[derive(Clone)]
pub struct MarketService {
    providers: ProviderSet,
}

impl MarketService {
    pub fn new(providers: ProviderSet) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(ProviderSet::from_config(config)?))
    }

    /// Live quotes for a comma-separated symbol list, backend first.
    pub async fn get_live_quotes(
        &self,
        raw_symbols: &str,
        mode: ProviderMode,
    ) -> Result<Resolution<Vec<Quote>>, AppError> {
        let symbols = normalize_symbols(raw_symbols)?;
        info!(symbols = %symbols.join(","), ?mode, "resolving live quotes");

        let secondary = match mode {
            ProviderMode::Dual => Some(self.providers.quote_fallback.as_ref()),
            ProviderMode::Backend => None,
        };

        resolve_with_fallback(self.providers.backend.as_ref(), secondary, |provider| {
            provider.fetch_quotes(&symbols)
        })
        .await
    }

    /// One quote, from TwelveData when a key is configured and Yahoo otherwise.
    pub async fn get_stock_quote(&self, raw_symbol: &str) -> Result<Resolution<Quote>, AppError> {
        let symbols = vec![normalize_symbol(raw_symbol)?];
        let (primary, secondary) = self.keyed_then_yahoo();

        let resolution = resolve_with_fallback(primary, secondary, |provider| provider.fetch_quotes(&symbols)).await?;
        let quote = resolution
            .value
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UpstreamError(format!("No quote found for {}", symbols[0])))?;

        Ok(Resolution {
            provider: resolution.provider,
            value: quote,
        })
    }

    /// Close-price history, Yahoo first with TwelveData as fallback when configured.
    pub async fn get_history(
        &self,
        raw_symbol: &str,
        range: ChartRange,
    ) -> Result<Resolution<CandleSeries>, AppError> {
        let symbol = normalize_symbol(raw_symbol)?;
        info!(%symbol, %range, "resolving chart history");

        let twelve_data = self.providers.twelve_data.as_ref();
        let secondary = twelve_data.is_configured().then_some(twelve_data);

        resolve_with_fallback(self.providers.yahoo.as_ref(), secondary, |provider| {
            provider.fetch_history(&symbol, range)
        })
        .await
    }

    /// Yahoo quotes ranked by [`ScreenerRow`] score, best first. Symbols that fail are left out.
    pub async fn screen(&self, raw_symbols: &str, top: usize) -> Result<Vec<ScreenerRow>, AppError> {
        let symbols = normalize_symbols(raw_symbols)?;
        info!(symbols = %symbols.join(","), top, "screening symbols");

        let yahoo = self.providers.yahoo.as_ref();
        let quotes = match yahoo.fetch_quotes(&symbols).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(error = %e, "no screener symbol resolved");
                return Ok(Vec::new());
            }
        };

        let fundamentals = join_all(quotes.iter().map(|quote| yahoo.fetch_fundamentals(&quote.symbol))).await;
        let mut rows: Vec<ScreenerRow> = quotes
            .into_iter()
            .zip(fundamentals)
            .map(|(quote, fundamentals)| ScreenerRow::new(quote, fundamentals.unwrap_or_default()))
            .collect();

        rows.sort_by(|a, b| b.score.total_cmp(&a.score));
        rows.truncate(top);
        Ok(rows)
    }

    fn keyed_then_yahoo(&self) -> (&dyn QuoteProvider, Option<&dyn QuoteProvider>) {
        let twelve_data = self.providers.twelve_data.as_ref();
        let yahoo = self.providers.yahoo.as_ref();
        if twelve_data.is_configured() {
            (twelve_data, Some(yahoo))
        } else {
            (yahoo, None)
        }
    }
}
