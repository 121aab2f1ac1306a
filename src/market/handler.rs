use axum::{
  extract::{rejection::QueryRejection, Query, State},
  Json,
};
use tracing::debug;
use validator::Validate;

use crate::{
  error::AppError,
  market::{
      model::{
          ChartResponse, HistoricalChartQuery, LiveStockQuery, LiveStockResponse, ProviderMode, ScreenerQuery,
          ScreenerResponse, StockQuery, StockResponse, DEFAULT_SCREENER_TOP,
      },
      service::MarketService,
  },
  models::ChartRange,
};

pub async fn get_live_stock_data(
  State(service): State<MarketService>,
  query: Result<Query<LiveStockQuery>, QueryRejection>,
) -> Result<Json<LiveStockResponse>, AppError> {
  let Query(query) = query?;
  query.validate()?;

  let mode = query
      .provider
      .as_deref()
      .map(str::parse::<ProviderMode>)
      .transpose()?
      .unwrap_or_default();
  let symbols = query.symbols.unwrap_or_default();

  let resolution = service
      .get_live_quotes(&symbols, mode)
      .await
      .map_err(|e| log_failure("live-stock-data", e))?;

  Ok(Json(LiveStockResponse {
      data: resolution.value,
      provider: resolution.provider,
  }))
}

pub async fn get_stock(
  State(service): State<MarketService>,
  query: Result<Query<StockQuery>, QueryRejection>,
) -> Result<Json<StockResponse>, AppError> {
  let Query(query) = query?;
  query.validate()?;
  let symbol = query.symbol.unwrap_or_default();

  let resolution = service
      .get_stock_quote(&symbol)
      .await
      .map_err(|e| log_failure("stock", e))?;

  Ok(Json(StockResponse {
      data: resolution.value,
      provider: resolution.provider,
  }))
}

pub async fn get_historical_chart(
  State(service): State<MarketService>,
  query: Result<Query<HistoricalChartQuery>, QueryRejection>,
) -> Result<Json<ChartResponse>, AppError> {
  let Query(query) = query?;
  query.validate()?;

  let range = match query.range.as_deref() {
      Some(raw) if !raw.trim().is_empty() => raw.parse::<ChartRange>().map_err(AppError::ValidationError)?,
      _ => ChartRange::default(),
  };
  let symbol = query.symbol.unwrap_or_default();

  let resolution = service
      .get_history(&symbol, range)
      .await
      .map_err(|e| log_failure("historical-chart", e))?;

  Ok(Json(ChartResponse {
      series: resolution.value,
      range: range.label().to_string(),
      provider: resolution.provider,
  }))
}

pub async fn get_screener(
  State(service): State<MarketService>,
  query: Result<Query<ScreenerQuery>, QueryRejection>,
) -> Result<Json<ScreenerResponse>, AppError> {
  let Query(query) = query?;
  query.validate()?;

  let symbols = query.symbols.unwrap_or_default();
  let top = query.top.unwrap_or(DEFAULT_SCREENER_TOP) as usize;

  let results = service
      .screen(&symbols, top)
      .await
      .map_err(|e| log_failure("screener", e))?;

  Ok(Json(ScreenerResponse {
      count: results.len(),
      results,
  }))
}

fn log_failure(route: &str, err: AppError) -> AppError {
  if !matches!(err, AppError::ValidationError(_)) {
      debug!(route, error = %err, "request failed");
  }
  err
}
