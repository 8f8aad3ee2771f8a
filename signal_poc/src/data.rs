//! Daily close download, business-day alignment and the on-disk cache.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use eqsignal::core::io::{PriceSeries, align_business_days, read_price_file, write_price_file};
use log::{debug, warn};
use serde::Deserialize;

use crate::error::{Result, SignalError};

/// Source of raw daily closes
pub trait PriceProvider {
    /// Observations for `symbol` from `start` (inclusive) to `end` (exclusive),
    /// in any order. An empty vector means the provider has no data.
    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>>;
}

/// Yahoo Finance chart API client (auto-adjusted daily closes)
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://query1.finance.yahoo.com/v8/finance/chart")
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; eqsignal/0.1)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceProvider for YahooProvider {
    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let period1 = unix_midnight(start);
        let period2 = unix_midnight(end);
        let url = format!("{}/{}", self.base_url, symbol);
        debug!("GET {} period1={} period2={}", url, period1, period2);

        let body = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()?
            .text()?;

        parse_chart(&body)
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Extract (date, close) pairs from a chart API body.
///
/// Adjusted closes are preferred; bars with neither value are skipped. A
/// "Not Found" error or an empty result yields no observations.
pub fn parse_chart(body: &str) -> Result<Vec<(NaiveDate, f64)>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Ok(Vec::new());
        }
        return Err(SignalError::Provider(format!("[{}] {}", err.code, err.description)));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let adjusted = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut observations = Vec::with_capacity(data.timestamp.len());
    let mut skipped = 0usize;

    for (i, &ts) in data.timestamp.iter().enumerate() {
        let value = adjusted
            .get(i)
            .copied()
            .flatten()
            .or_else(|| closes.get(i).copied().flatten())
            .filter(|v| v.is_finite() && *v > 0.0);

        let date = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0).map(|dt| dt.date_naive());

        match (date, value) {
            (Some(date), Some(value)) => observations.push((date, value)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("skipped {} bars without a usable close", skipped);
    }

    Ok(observations)
}

/// Cache file for `symbol` inside `data_dir`
pub fn cache_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", symbol.replace('^', "_")))
}

/// Fetch, align to business days and cache a daily close series.
pub fn load_prices(
    provider: &dyn PriceProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    data_dir: &Path,
) -> Result<PriceSeries> {
    let raw = provider.daily_closes(symbol, start, end)?;
    if raw.is_empty() {
        return Err(SignalError::DataUnavailable {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }

    let series = align_business_days(&raw)?;

    let path = cache_path(data_dir, symbol);
    write_price_file(&path, &series)?;
    debug!("cached {} rows to {}", series.len(), path.display());

    Ok(series)
}

/// Read a previously cached series, restricted to `[start, end)`.
pub fn load_cached(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    data_dir: &Path,
) -> Result<PriceSeries> {
    let path = cache_path(data_dir, symbol);
    debug!("reading cached prices from {}", path.display());
    let cached = read_price_file(&path)?;

    let (dates, closes): (Vec<_>, Vec<_>) = cached
        .iter()
        .filter(|&(date, _)| date >= start && date < end)
        .unzip();

    if dates.is_empty() {
        return Err(SignalError::DataUnavailable {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }

    Ok(PriceSeries::new(dates, closes)?)
}
