use std::env;

use crate::{error::AppError, providers::ProviderKind};

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_BACKEND_QUOTE_PATH: &str = "/api/live-stock-data";
const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TWELVE_BASE_URL: &str = "https://api.twelvedata.com";
const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub app_env: AppEnv,
    pub backend_url: String,
    pub backend_quote_path: String,
    pub quote_fallback: ProviderKind,
    pub yahoo_base_url: String,
    pub twelve_base_url: String,
    pub twelve_api_key: Option<String>,
    pub alpha_vantage_base_url: String,
    pub alpha_vantage_api_key: Option<String>,
    pub finnhub_base_url: String,
    pub finnhub_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first_of = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        // Server config
        let port = get("PORT")
            .unwrap_or_else(|| "5000".into())
            .parse::<u16>()
            .map_err(|_| AppError::ConfigError("Invalid PORT".into()))?;

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let app_env_str = get("APP_ENV").unwrap_or_else(|| "development".into());
        let app_env = match app_env_str.to_lowercase().as_str() {
            "production" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        };

        // Primary backend
        let backend_url = first_of(&["BACKEND_URL", "NEXT_PUBLIC_FASTAPI_URL", "NEXT_PUBLIC_API_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
        let backend_quote_path = get("BACKEND_QUOTE_PATH")
            .unwrap_or_else(|| DEFAULT_BACKEND_QUOTE_PATH.into());

        // Market data providers
        let quote_fallback = match get("QUOTE_FALLBACK_PROVIDER") {
            Some(name) => name
                .parse::<ProviderKind>()
                .ok()
                .filter(|kind| *kind != ProviderKind::Backend)
                .ok_or_else(|| AppError::ConfigError(format!("Invalid QUOTE_FALLBACK_PROVIDER: {}", name)))?,
            None => ProviderKind::Yahoo,
        };

        let twelve_api_key = first_of(&["TWELVE_API_KEY", "TWELVE_DATA_API_KEY"]);
        let alpha_vantage_api_key = first_of(&["ALPHA_VANTAGE_API_KEY", "ALPHA_KEY"]);
        let finnhub_api_key = get("FINNHUB_API_KEY");

        match quote_fallback {
            ProviderKind::TwelveData if twelve_api_key.is_none() => {
                return Err(AppError::ConfigError(
                    "TWELVE_API_KEY must be set when TwelveData is the quote fallback".into(),
                ));
            }
            ProviderKind::AlphaVantage if alpha_vantage_api_key.is_none() => {
                return Err(AppError::ConfigError(
                    "ALPHA_VANTAGE_API_KEY must be set when Alpha Vantage is the quote fallback".into(),
                ));
            }
            ProviderKind::Finnhub if finnhub_api_key.is_none() => {
                return Err(AppError::ConfigError(
                    "FINNHUB_API_KEY must be set when Finnhub is the quote fallback".into(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            port,
            host,
            app_env,
            backend_url: trim_base_url(&backend_url),
            backend_quote_path: normalize_path(&backend_quote_path),
            quote_fallback,
            yahoo_base_url: trim_base_url(&get("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.into())),
            twelve_base_url: trim_base_url(&get("TWELVE_BASE_URL").unwrap_or_else(|| DEFAULT_TWELVE_BASE_URL.into())),
            twelve_api_key,
            alpha_vantage_base_url: trim_base_url(
                &get("ALPHA_VANTAGE_BASE_URL").unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_BASE_URL.into()),
            ),
            alpha_vantage_api_key,
            finnhub_base_url: trim_base_url(&get("FINNHUB_BASE_URL").unwrap_or_else(|| DEFAULT_FINNHUB_BASE_URL.into())),
            finnhub_api_key,
        })
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
