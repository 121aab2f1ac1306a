#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_info_api::{router::create_router, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Yahoo answers 404 for this symbol whatever the configured behavior.
pub const UNKNOWN_SYMBOL: &str = "NOSUCH";

/// Gets positive EPS and a moderate PE from the fake quote summary; every other symbol does not.
pub const VALUE_PICK: &str = "TCS.NS";

/// What a fake upstream does when called.
#[derive(Clone, Copy, PartialEq)]
pub enum Behavior {
    Ok,
    ServerError,
    Garbage,
}

#[derive(Clone)]
pub struct Upstream {
    pub calls: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    backend: Behavior,
    yahoo: Behavior,
    twelve: Behavior,
}

impl Upstream {
    pub fn new(backend: Behavior, yahoo: Behavior, twelve: Behavior) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            backend,
            yahoo,
            twelve,
        }
    }

    fn record(&self, route: &str, params: &HashMap<String, String>) {
        self.calls.lock().unwrap().push((route.to_string(), params.clone()));
    }

    pub fn calls_to(&self, route: &str) -> Vec<HashMap<String, String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

async fn fake_backend(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("backend", &params);
    match up.backend {
        Behavior::ServerError => (StatusCode::SERVICE_UNAVAILABLE, "backend down").into_response(),
        Behavior::Garbage => "<html>not json</html>".into_response(),
        Behavior::Ok => {
            let data: Vec<Value> = params
                .get("symbols")
                .map(|s| s.split(',').collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter()
                .map(|symbol| {
                    json!({
                        "symbol": symbol,
                        "price": 101.25,
                        "change": 1.25,
                        "percentChange": 1.25,
                        "volume": 42000,
                        "sector": "Technology"
                    })
                })
                .collect();
            Json(json!({ "data": data })).into_response()
        }
    }
}

async fn fake_yahoo_chart(
    State(up): State<Upstream>,
    Path(symbol): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    params.insert("symbol".into(), symbol.clone());
    up.record("yahoo", &params);
    let behavior = if symbol == UNKNOWN_SYMBOL { Behavior::ServerError } else { up.yahoo };
    match behavior {
        Behavior::ServerError => (
            StatusCode::NOT_FOUND,
            Json(json!({"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}})),
        )
            .into_response(),
        Behavior::Garbage => "{".into_response(),
        Behavior::Ok => Json(json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": symbol,
                        "regularMarketPrice": 55.0,
                        "chartPreviousClose": 50.0,
                        "regularMarketVolume": 7000,
                        "shortName": format!("{} Corp", symbol)
                    },
                    "timestamp": [1704153600, 1704240000, 1704326400],
                    "indicators": {"quote": [{
                        "open": [49.0, null, 51.5],
                        "high": [50.5, null, 56.0],
                        "low": [48.75, null, 51.0],
                        "close": [50.0, null, 55.0],
                        "volume": [1000, 2000, 7000]
                    }]}
                }],
                "error": null
            }
        }))
        .into_response(),
    }
}

async fn fake_yahoo_summary(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("yahoo_summary", &params);
    let symbol = params.get("symbols").cloned().unwrap_or_default();
    let (pe, eps) = if symbol == VALUE_PICK { (20.0, 5.0) } else { (60.0, -1.0) };
    Json(json!({
        "quoteResponse": {
            "result": [{"symbol": symbol, "marketCap": 1.0e12, "trailingPE": pe, "epsTrailingTwelveMonths": eps}],
            "error": null
        }
    }))
    .into_response()
}

async fn fake_finnhub_quote(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("finnhub", &params);
    Json(json!({"c": 120.5, "d": 0.5, "dp": 0.4167, "h": 121.0, "l": 119.0, "o": 120.0, "pc": 120.0, "t": 1704153600}))
        .into_response()
}

async fn fake_twelve_quote(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("twelve_quote", &params);
    match up.twelve {
        Behavior::ServerError => Json(json!({"code": 429, "message": "rate limited", "status": "error"})).into_response(),
        Behavior::Garbage => "nope".into_response(),
        Behavior::Ok => Json(json!({
            "symbol": params.get("symbol").cloned().unwrap_or_default(),
            "name": "Reliance Industries",
            "close": "2950.50",
            "previous_close": "2900.00",
            "change": "50.50",
            "percent_change": "1.74",
            "volume": "5123456"
        }))
        .into_response(),
    }
}

async fn fake_twelve_series(State(up): State<Upstream>, Query(params): Query<HashMap<String, String>>) -> Response {
    up.record("twelve_series", &params);
    match up.twelve {
        Behavior::Ok => Json(json!({
            "meta": {"symbol": params.get("symbol").cloned().unwrap_or_default()},
            "values": [
                {"datetime": "2024-01-03", "close": "186.00"},
                {"datetime": "2024-01-02", "close": "185.00"}
            ],
            "status": "ok"
        }))
        .into_response(),
        _ => Json(json!({"code": 400, "message": "bad symbol", "status": "error"})).into_response(),
    }
}

/// Serves every upstream on one local port and returns its base URL.
pub async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/api/live-stock-data", get(fake_backend))
        .route("/v8/finance/chart/:symbol", get(fake_yahoo_chart))
        .route("/v7/finance/quote", get(fake_yahoo_summary))
        .route("/finnhub/quote", get(fake_finnhub_quote))
        .route("/quote", get(fake_twelve_quote))
        .route("/time_series", get(fake_twelve_series))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL on which nothing is listening.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn config(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Config with every provider pointed at `base`.
pub fn config_for(base: &str, twelve_key: Option<&str>) -> Config {
    let finnhub = format!("{}/finnhub", base);
    let mut pairs = vec![
        ("APP_ENV", "test"),
        ("BACKEND_URL", base),
        ("YAHOO_BASE_URL", base),
        ("TWELVE_BASE_URL", base),
        ("ALPHA_VANTAGE_BASE_URL", base),
        ("FINNHUB_BASE_URL", finnhub.as_str()),
    ];
    if let Some(key) = twelve_key {
        pairs.push(("TWELVE_API_KEY", key));
    }
    config(&pairs)
}

pub async fn get_json(config: &Config, uri: &str) -> (StatusCode, Value) {
    let app = create_router(config).unwrap();
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
