use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

use super::write::write_file;

/// Errors raised while building, reading or writing a price series
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("no valid price data found")]
    Empty,

    #[error("length mismatch: {dates} dates but {closes} closes")]
    LengthMismatch { dates: usize, closes: usize },

    #[error("dates must be strictly increasing (index {index}, date {date})")]
    NotIncreasing { index: usize, date: NaiveDate },

    #[error("non-positive or non-finite close {value} at index {index}")]
    InvalidPrice { index: usize, value: f64 },
}

/// Daily close prices on a strictly increasing date index
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series, rejecting unordered dates and non-positive closes.
    pub fn new(dates: Vec<NaiveDate>, closes: Vec<f64>) -> Result<Self, MarketDataError> {
        if dates.len() != closes.len() {
            return Err(MarketDataError::LengthMismatch {
                dates: dates.len(),
                closes: closes.len(),
            });
        }

        for (index, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(MarketDataError::NotIncreasing {
                    index: index + 1,
                    date: pair[1],
                });
            }
        }

        if let Some((index, &value)) = closes
            .iter()
            .enumerate()
            .find(|&(_, &c)| !c.is_finite() || c <= 0.0)
        {
            return Err(MarketDataError::InvalidPrice { index, value });
        }

        Ok(Self { dates, closes })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// Get the number of bars
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.closes.iter().copied())
    }
}

/// Parse a date in `YYYY-MM-DD` or compact `YYYYMMDD` form
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

fn has_numeric_field(line: &str) -> bool {
    line.split([' ', '\t', ','])
        .map(str::trim)
        .any(|s| !s.is_empty() && s.parse::<f64>().is_ok())
}

/// Read a price file with one `date close` pair per line.
///
/// Fields may be separated by commas, tabs or spaces. Dates are ISO
/// (`2020-01-02`) or compact (`20200102`). The first non-blank line is
/// skipped as a header only when none of its fields is numeric; blank lines
/// are ignored.
pub fn read_price_file<P: AsRef<Path>>(filename: P) -> Result<PriceSeries, MarketDataError> {
    let file = File::open(filename.as_ref())?;
    let reader = BufReader::new(file);

    let mut dates = Vec::new();
    let mut closes = Vec::new();
    let mut seen_content = false;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line
            .split([' ', '\t', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let date_str = fields.next().unwrap_or_default();
        let date = match parse_date(date_str) {
            Some(d) => d,
            None if !seen_content && !has_numeric_field(&line) => {
                seen_content = true;
                continue;
            }
            None => {
                return Err(MarketDataError::Parse {
                    line: line_num + 1,
                    message: format!("invalid date '{}'", date_str),
                });
            }
        };
        seen_content = true;

        let price_str = fields.next().ok_or_else(|| MarketDataError::Parse {
            line: line_num + 1,
            message: "no price found".to_string(),
        })?;

        let price = price_str
            .parse::<f64>()
            .map_err(|_| MarketDataError::Parse {
                line: line_num + 1,
                message: format!("invalid price '{}'", price_str),
            })?;

        if !price.is_finite() || price <= 0.0 {
            return Err(MarketDataError::Parse {
                line: line_num + 1,
                message: format!("non-positive price {}", price),
            });
        }

        if let Some(&prev) = dates.last() {
            if date <= prev {
                return Err(MarketDataError::Parse {
                    line: line_num + 1,
                    message: format!("date {} does not follow {}", date, prev),
                });
            }
        }

        dates.push(date);
        closes.push(price);
    }

    if closes.is_empty() {
        return Err(MarketDataError::Empty);
    }

    PriceSeries::new(dates, closes)
}

/// Write a series as `date,close` CSV with a header line, replacing any
/// existing file and creating parent directories.
pub fn write_price_file<P: AsRef<Path>>(
    path: P,
    series: &PriceSeries,
) -> Result<(), MarketDataError> {
    let mut contents = String::with_capacity(series.len() * 24 + 16);
    contents.push_str("date,close\n");
    for (date, close) in series.iter() {
        contents.push_str(&format!("{},{}\n", date.format("%Y-%m-%d"), close));
    }

    write_file(path, contents)?;
    Ok(())
}
