pub mod handler;
pub mod model;
pub mod resolver;
pub mod routes;
pub mod service;

pub use resolver::Resolution;
pub use service::MarketService;
