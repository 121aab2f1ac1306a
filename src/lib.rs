pub mod api;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod providers;
pub mod utils;

// Re-export common modules
pub use api::router;
pub use config::Config;
pub use error::AppError;
pub use market::MarketService;
pub use models::Quote;
