pub mod symbols;

pub use symbols::{normalize_symbol, normalize_symbols};
