use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::{CandleSeries, Quote, ScreenerRow},
    providers::ProviderKind,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LiveStockQuery {
    #[validate(required(message = "Missing 'symbols' parameter"))]
    pub symbols: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockQuery {
    #[validate(
        required(message = "symbol query param is required"),
        length(min = 1, message = "symbol query param is required")
    )]
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoricalChartQuery {
    #[validate(
        required(message = "symbol query param is required"),
        length(min = 1, message = "symbol query param is required")
    )]
    pub symbol: Option<String>,
    pub range: Option<String>,
}

pub const DEFAULT_SCREENER_TOP: u32 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct ScreenerQuery {
    #[validate(required(message = "Missing 'symbols' parameter"))]
    pub symbols: Option<String>,
    #[validate(range(min = 1, max = 100, message = "top must be between 1 and 100"))]
    pub top: Option<u32>,
}

/// Which providers a live quote request may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderMode {
    /// Backend first, then the configured fallback provider.
    #[default]
    Dual,
    /// Backend only.
    Backend,
}

impl FromStr for ProviderMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "dual" => Ok(ProviderMode::Dual),
            "backend" => Ok(ProviderMode::Backend),
            other => Err(AppError::ValidationError(format!(
                "Unknown provider '{}', expected 'backend' or 'dual'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LiveStockResponse {
    pub data: Vec<Quote>,
    pub provider: ProviderKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockResponse {
    pub data: Quote,
    pub provider: ProviderKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartResponse {
    #[serde(flatten)]
    pub series: CandleSeries,
    pub range: String,
    pub provider: ProviderKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenerResponse {
    pub count: usize,
    pub results: Vec<ScreenerRow>,
}
