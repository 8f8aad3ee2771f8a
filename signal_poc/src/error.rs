use chrono::NaiveDate;
use eqsignal::core::io::MarketDataError;
use eqsignal::models::ModelError;
use thiserror::Error;

/// Errors that abort a research run
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("no price data returned for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("insufficient history: {rows} prices, at least {required} needed for one labelled row")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("invalid feature table: {0}")]
    InvalidTable(String),

    #[error("number of splits must be at least 2, got {0}")]
    InvalidSplits(usize),

    #[error("too few rows ({rows}) for {splits} splits")]
    TooFewRows { rows: usize, splits: usize },

    #[error("fold {fold}: training labels are all class {class}")]
    DegenerateLabel { fold: usize, class: u8 },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("no rows were scored out of sample")]
    NoScoredRows,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, SignalError>;
