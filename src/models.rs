use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A single ticker's price snapshot, already reshaped from whichever provider served it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
    pub volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl Quote {
    /// Derives change figures from the last price and the previous close.
    pub fn from_prices(symbol: &str, price: f64, previous_close: Option<f64>, volume: u64) -> Self {
        let (change, percent_change) = match previous_close {
            Some(prev) if prev > 0.0 => {
                let change = price - prev;
                (round2(change), round2(change / prev * 100.0))
            }
            _ => (0.0, 0.0),
        };

        Self {
            symbol: symbol.to_string(),
            price: round2(price),
            change,
            percent_change,
            volume,
            name: None,
            sector: None,
        }
    }
}

/// Valuation hints used to rank screener rows. Any of them may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerRow {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    pub score: f64,
}

impl ScreenerRow {
    /// Score is the day's percent change, plus 1 for positive EPS and 0.5 for a PE in 5..=25.
    pub fn new(quote: Quote, fundamentals: Fundamentals) -> Self {
        let mut score = quote.percent_change;
        if fundamentals.eps.is_some_and(|eps| eps > 0.0) {
            score += 1.0;
        }
        if fundamentals.pe_ratio.is_some_and(|pe| (5.0..=25.0).contains(&pe)) {
            score += 0.5;
        }

        Self {
            quote,
            market_cap: fundamentals.market_cap,
            pe_ratio: fundamentals.pe_ratio,
            eps: fundamentals.eps,
            score: round2(score),
        }
    }
}

/// One bar, in the compact keys chart clients already read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub t: String,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: u64,
}

impl Candle {
    /// A bar where only the close is known.
    pub fn flat(t: String, close: f64) -> Self {
        Self {
            t,
            o: close,
            h: close,
            l: close,
            c: close,
            v: 0,
        }
    }
}

/// Bars for one symbol, oldest first. `labels`, `prices` and `ohlc` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub labels: Vec<String>,
    pub prices: Vec<f64>,
    pub ohlc: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            labels: Vec::new(),
            prices: Vec::new(),
            ohlc: Vec::new(),
        }
    }

    pub fn push(&mut self, candle: Candle) {
        self.labels.push(candle.t.clone());
        self.prices.push(round2(candle.c));
        self.ohlc.push(candle);
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Bar width requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartInterval {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneDay,
    OneWeek,
}

impl ChartInterval {
    /// Yahoo chart notation.
    pub fn as_yahoo(&self) -> &'static str {
        match self {
            ChartInterval::FiveMinutes => "5m",
            ChartInterval::FifteenMinutes => "15m",
            ChartInterval::ThirtyMinutes => "30m",
            ChartInterval::OneDay => "1d",
            ChartInterval::OneWeek => "1wk",
        }
    }

    /// TwelveData time_series notation.
    pub fn as_twelve_data(&self) -> &'static str {
        match self {
            ChartInterval::FiveMinutes => "5min",
            ChartInterval::FifteenMinutes => "15min",
            ChartInterval::ThirtyMinutes => "30min",
            ChartInterval::OneDay => "1day",
            ChartInterval::OneWeek => "1week",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRange {
    OneDay,
    ThreeDays,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FourYears,
    FiveYears,
}

impl ChartRange {
    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1D",
            ChartRange::ThreeDays => "3D",
            ChartRange::FiveDays => "5D",
            ChartRange::OneMonth => "1M",
            ChartRange::ThreeMonths => "3M",
            ChartRange::SixMonths => "6M",
            ChartRange::OneYear => "1Y",
            ChartRange::TwoYears => "2Y",
            ChartRange::ThreeYears => "3Y",
            ChartRange::FourYears => "4Y",
            ChartRange::FiveYears => "5Y",
        }
    }

    pub fn interval(&self) -> ChartInterval {
        match self {
            ChartRange::OneDay => ChartInterval::FiveMinutes,
            ChartRange::ThreeDays => ChartInterval::FifteenMinutes,
            ChartRange::FiveDays => ChartInterval::ThirtyMinutes,
            ChartRange::OneMonth
            | ChartRange::ThreeMonths
            | ChartRange::SixMonths
            | ChartRange::OneYear => ChartInterval::OneDay,
            ChartRange::TwoYears
            | ChartRange::ThreeYears
            | ChartRange::FourYears
            | ChartRange::FiveYears => ChartInterval::OneWeek,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            ChartRange::OneDay => 1,
            ChartRange::ThreeDays => 3,
            ChartRange::FiveDays => 5,
            ChartRange::OneMonth => 30,
            ChartRange::ThreeMonths => 90,
            ChartRange::SixMonths => 180,
            ChartRange::OneYear => 365,
            ChartRange::TwoYears => 730,
            ChartRange::ThreeYears => 1095,
            ChartRange::FourYears => 1460,
            ChartRange::FiveYears => 1825,
        }
    }
}

impl Default for ChartRange {
    fn default() -> Self {
        ChartRange::OneMonth
    }
}

impl FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(ChartRange::OneDay),
            "3D" => Ok(ChartRange::ThreeDays),
            "5D" => Ok(ChartRange::FiveDays),
            "1M" => Ok(ChartRange::OneMonth),
            "3M" => Ok(ChartRange::ThreeMonths),
            "6M" => Ok(ChartRange::SixMonths),
            "1Y" => Ok(ChartRange::OneYear),
            "2Y" => Ok(ChartRange::TwoYears),
            "3Y" => Ok(ChartRange::ThreeYears),
            "4Y" => Ok(ChartRange::FourYears),
            "5Y" => Ok(ChartRange::FiveYears),
            other => Err(format!("Invalid range '{}'", other)),
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
