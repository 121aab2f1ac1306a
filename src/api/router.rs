use axum::{
  routing::get,
  http::StatusCode,
  Json, Router,
};
use serde_json::json;
use tower_http::{
  compression::CompressionLayer,
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{
  config::Config,
  error::AppError,
  market::{routes::market_routes, service::MarketService},
};

pub fn create_router(config: &Config) -> Result<Router, AppError> {
  // Setup providers and services
  let market_service = MarketService::from_config(config)?;

  Ok(build_router(market_service))
}

pub fn build_router(market_service: MarketService) -> Router {
  // Setup CORS
  let cors = CorsLayer::new()
      .allow_origin(Any)
      .allow_methods(Any)
      .allow_headers(Any);

  Router::new()
      .route("/health", get(health_check))
      .nest("/api", market_routes(market_service))
      .layer(TraceLayer::new_for_http())
      .layer(CompressionLayer::new())
      .layer(cors)
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
  (
      StatusCode::OK,
      Json(json!({
          "status": "success",
          "message": "Server is running"
      })),
  )
}
