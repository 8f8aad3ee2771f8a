use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Deserialize;

use crate::error::SignalError;
use crate::walk_forward::WalkForwardSettings;

/// Configuration for one research run
#[derive(Debug, Clone, Deserialize, Parser)]
#[command(name = "eqsignal")]
#[command(about = "Equity signal research: technical features, walk-forward logistic regression, report")]
#[serde(default)]
pub struct Config {
    /// Ticker symbol
    #[arg(long, default_value = "AAPL")]
    pub symbol: String,

    /// First date to download (YYYY-MM-DD)
    #[arg(long, default_value = "2015-01-01")]
    pub start: String,

    /// Download end date, exclusive (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub end: Option<String>,

    /// Number of walk-forward splits
    #[arg(long, default_value_t = 5)]
    pub splits: usize,

    /// Training rows dropped before each test block
    #[arg(long, default_value_t = 0)]
    pub purge_gap: usize,

    /// Directory for the cached price CSV
    #[arg(long, default_value = "data/raw")]
    pub data_dir: String,

    /// Directory for metrics, figures and the PDF report
    #[arg(long, default_value = "reports")]
    pub reports_dir: String,

    /// Read prices from the cache instead of the network
    #[arg(long)]
    pub offline: bool,

    /// Skip figures and the PDF report
    #[arg(long)]
    pub no_report: bool,

    /// Inverse L2 regularization strength
    #[arg(long, default_value_t = 1.0)]
    pub c: f64,

    /// Maximum Newton iterations per fold
    #[arg(long, default_value_t = 500)]
    pub max_iter: usize,

    /// Load all settings from a TOML file instead
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config::parse_from(["eqsignal"])
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }

        if self.splits < 2 {
            anyhow::bail!("splits must be at least 2, got {}", self.splits);
        }

        if !(self.c > 0.0 && self.c.is_finite()) {
            anyhow::bail!("c must be positive, got {}", self.c);
        }

        if self.max_iter == 0 {
            anyhow::bail!("max_iter must be greater than 0");
        }

        let start = self.start_date()?;
        let end = self.end_date()?;
        if end < start {
            anyhow::bail!("end date {} is before start date {}", end, start);
        }

        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn start_date(&self) -> crate::Result<NaiveDate> {
        parse_iso(&self.start)
    }

    /// End date, today when unset
    pub fn end_date(&self) -> crate::Result<NaiveDate> {
        match &self.end {
            Some(end) => parse_iso(end),
            None => Ok(Local::now().date_naive()),
        }
    }

    pub fn walk_forward_settings(&self) -> WalkForwardSettings {
        WalkForwardSettings {
            n_splits: self.splits,
            purge_gap: self.purge_gap,
            c: self.c,
            max_iter: self.max_iter,
        }
    }
}

fn parse_iso(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| SignalError::Config(format!("invalid date '{}': {}", s, e)))
}
