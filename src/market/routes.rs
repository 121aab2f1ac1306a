use axum::{routing::get, Router};

use crate::market::{handler, service::MarketService};

pub fn market_routes(service: MarketService) -> Router {
  Router::new()
      .route("/live-stock-data", get(handler::get_live_stock_data))
      .route("/stock", get(handler::get_stock))
      .route("/historical-chart", get(handler::get_historical_chart))
      .route("/screener", get(handler::get_screener))
      .with_state(service)
}
