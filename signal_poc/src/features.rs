//! Technical features and the forward-return label.

use chrono::NaiveDate;
use eqsignal::core::io::PriceSeries;
use indicators::{forward_pct_change, moving_average, pct_change, rolling_rsi, rolling_std};
use ndarray::Array2;

use crate::error::{Result, SignalError};

pub const MOM_SHORT: usize = 5;
pub const MOM_LONG: usize = 20;
pub const VOL_WINDOW: usize = 10;
pub const MA_FAST: usize = 10;
pub const MA_SLOW: usize = 50;
pub const RSI_PERIOD: usize = 14;
/// Label horizon in business days
pub const HORIZON: usize = 5;

/// Column order of [`FeatureTable::matrix`]
pub const FEATURE_NAMES: [&str; 7] = [
    "mom_5", "mom_20", "vol_10", "ma_10", "ma_50", "ma_cross", "rsi_14",
];

/// Fewest prices that can produce one labelled row
pub const MIN_PRICES: usize = MA_SLOW + HORIZON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub mom_5: f64,
    pub mom_20: f64,
    pub vol_10: f64,
    pub ma_10: f64,
    pub ma_50: f64,
    /// 1.0 when the fast average is above the slow one
    pub ma_cross: f64,
    pub rsi_14: f64,
}

impl FeatureRow {
    /// Values in [`FEATURE_NAMES`] order
    pub fn values(&self) -> [f64; 7] {
        [
            self.mom_5,
            self.mom_20,
            self.vol_10,
            self.ma_10,
            self.ma_50,
            self.ma_cross,
            self.rsi_14,
        ]
    }
}

/// Per-row context carried alongside the features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMeta {
    pub date: NaiveDate,
    pub close: f64,
    pub ret_1d: f64,
    pub fwd_5d_ret: f64,
}

/// Features, labels and metadata on one shared date index
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    labels: Vec<bool>,
    meta: Vec<RowMeta>,
}

impl FeatureTable {
    /// Assemble a table from aligned parts.
    ///
    /// Fails when the parts differ in length or the dates are not strictly
    /// increasing.
    pub fn from_parts(rows: Vec<FeatureRow>, labels: Vec<bool>, meta: Vec<RowMeta>) -> Result<Self> {
        if rows.len() != labels.len() || rows.len() != meta.len() {
            return Err(SignalError::InvalidTable(format!(
                "feature table parts differ in length: {} rows, {} labels, {} meta",
                rows.len(),
                labels.len(),
                meta.len()
            )));
        }
        if meta.windows(2).any(|w| w[1].date <= w[0].date) {
            return Err(SignalError::InvalidTable(
                "feature table dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { rows, labels, meta })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn meta(&self) -> &[RowMeta] {
        &self.meta
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.meta.iter().map(|m| m.date)
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Dense `(rows, features)` matrix for model fitting
    pub fn matrix(&self) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((self.rows.len(), FEATURE_NAMES.len()));
        for (mut out, row) in x.rows_mut().into_iter().zip(&self.rows) {
            for (cell, value) in out.iter_mut().zip(row.values()) {
                *cell = value;
            }
        }
        x
    }
}

/// Derive features and labels from a close series.
///
/// Rows lacking any feature (warm-up) or the label (last [`HORIZON`] days)
/// are dropped.
pub fn build_features(prices: &PriceSeries) -> Result<FeatureTable> {
    let close = prices.closes();
    let n = close.len();

    let ret_1d = pct_change(close, 1);
    let mom_5 = pct_change(close, MOM_SHORT);
    let mom_20 = pct_change(close, MOM_LONG);
    let ma_10 = moving_average(close, MA_FAST);
    let ma_50 = moving_average(close, MA_SLOW);
    let vol_10 = rolling_std(&ret_1d, VOL_WINDOW);
    let rsi_14 = rolling_rsi(close, RSI_PERIOD);
    let fwd = forward_pct_change(close, HORIZON);

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut meta = Vec::new();

    for (i, &date) in prices.dates().iter().enumerate() {
        let row = FeatureRow {
            mom_5: mom_5[i],
            mom_20: mom_20[i],
            vol_10: vol_10[i],
            ma_10: ma_10[i],
            ma_50: ma_50[i],
            ma_cross: if ma_10[i] > ma_50[i] { 1.0 } else { 0.0 },
            rsi_14: rsi_14[i],
        };

        let defined = row.values().iter().all(|v| v.is_finite())
            && ret_1d[i].is_finite()
            && fwd[i].is_finite();
        if !defined {
            continue;
        }

        rows.push(row);
        labels.push(fwd[i] > 0.0);
        meta.push(RowMeta {
            date,
            close: close[i],
            ret_1d: ret_1d[i],
            fwd_5d_ret: fwd[i],
        });
    }

    if rows.is_empty() {
        return Err(SignalError::InsufficientHistory {
            rows: n,
            required: MIN_PRICES,
        });
    }

    Ok(FeatureTable { rows, labels, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Days, Weekday};

    fn business_days(n: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(n);
        let mut day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        while dates.len() < n {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(day);
            }
            day = day.checked_add_days(Days::new(1)).unwrap();
        }
        dates
    }

    fn series(closes: Vec<f64>) -> PriceSeries {
        PriceSeries::new(business_days(closes.len()), closes).unwrap()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + 0.05 * i as f64)
            .collect()
    }

    #[test]
    fn test_row_count_and_alignment() {
        let prices = series(wave(120));
        let table = build_features(&prices).unwrap();

        assert_eq!(table.len(), 120 - MIN_PRICES + 1);
        assert_eq!(table.labels().len(), table.len());
        assert_eq!(table.meta().len(), table.len());
        assert_eq!(table.meta()[0].date, prices.dates()[MA_SLOW - 1]);
        assert_eq!(table.meta().last().unwrap().date, prices.dates()[120 - HORIZON - 1]);
    }

    #[test]
    fn test_label_uses_future_close() {
        let closes = wave(80);
        let table = build_features(&series(closes.clone())).unwrap();

        for (k, m) in table.meta().iter().enumerate() {
            let i = MA_SLOW - 1 + k;
            let expected = closes[i + HORIZON] / closes[i] - 1.0;
            assert!((m.fwd_5d_ret - expected).abs() < 1e-12);
            assert_eq!(table.labels()[k], expected > 0.0);
            assert_eq!(m.close, closes[i]);
        }
    }

    #[test]
    fn test_feature_values() {
        let closes = wave(70);
        let table = build_features(&series(closes.clone())).unwrap();
        let row = table.rows()[0];
        let i = MA_SLOW - 1;

        let ma_10: f64 = closes[i + 1 - MA_FAST..=i].iter().sum::<f64>() / MA_FAST as f64;
        let ma_50: f64 = closes[..=i].iter().sum::<f64>() / MA_SLOW as f64;
        assert!((row.ma_10 - ma_10).abs() < 1e-9);
        assert!((row.ma_50 - ma_50).abs() < 1e-9);
        assert_eq!(row.ma_cross, if ma_10 > ma_50 { 1.0 } else { 0.0 });
        assert!((row.mom_5 - (closes[i] / closes[i - 5] - 1.0)).abs() < 1e-12);
        assert!((row.mom_20 - (closes[i] / closes[i - 20] - 1.0)).abs() < 1e-12);
        assert!((0.0..=100.0).contains(&row.rsi_14));
        assert!(row.vol_10 > 0.0);
    }

    #[test]
    fn test_constant_series() {
        let table = build_features(&series(vec![50.0; 100])).unwrap();

        assert_eq!(table.len(), 100 - MIN_PRICES + 1);
        for row in table.rows() {
            assert_eq!(row.mom_5, 0.0);
            assert_eq!(row.mom_20, 0.0);
            assert_eq!(row.vol_10, 0.0);
            assert_eq!(row.ma_cross, 0.0);
            assert_eq!(row.rsi_14, indicators::RSI_FLAT);
        }
        assert!(table.labels().iter().all(|&l| !l));
        assert!(table.meta().iter().all(|m| m.ret_1d == 0.0 && m.fwd_5d_ret == 0.0));
    }

    #[test]
    fn test_insufficient_history() {
        let err = build_features(&series(wave(MIN_PRICES - 1))).unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientHistory { rows: 54, required: 55 }
        ));

        assert_eq!(build_features(&series(wave(MIN_PRICES))).unwrap().len(), 1);
    }

    #[test]
    fn test_deterministic() {
        let prices = series(wave(150));
        assert_eq!(build_features(&prices).unwrap(), build_features(&prices).unwrap());
    }

    #[test]
    fn test_matrix_column_order() {
        let table = build_features(&series(wave(60))).unwrap();
        let x = table.matrix();
        assert_eq!(x.dim(), (table.len(), FEATURE_NAMES.len()));
        assert_eq!(x[[0, 0]], table.rows()[0].mom_5);
        assert_eq!(x[[0, 6]], table.rows()[0].rsi_14);
        assert_eq!(table.feature_names()[5], "ma_cross");
    }
}
