//! Out-of-sample classification metrics and a rough long-only PnL sketch.

use std::path::{Path, PathBuf};

use eqsignal::core::io::OutputDir;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::features::{FeatureTable, RowMeta};
use crate::walk_forward::OosPredictions;

pub const METRICS_FILE: &str = "metrics.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub n_oos: usize,
    pub accuracy: f64,
    /// 0.0 when class 1 is never predicted
    pub precision_pos: f64,
    /// 0.0 when class 1 never occurs
    pub recall_pos: f64,
    /// `None` unless both classes occur among scored labels
    pub roc_auc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlSketch {
    /// Compounded forward returns of long rows, treated as sequential and
    /// non-overlapping
    pub strat_cum_return: f64,
    pub hit_rate_when_long: Option<f64>,
    pub spearman_ic_signal_vs_fwd: Option<f64>,
    pub n_long: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub classification: ClassificationMetrics,
    pub pnl_sketch: PnlSketch,
}

fn check_lengths(expected: usize, predictions: &OosPredictions) -> Result<()> {
    if predictions.len() != expected {
        return Err(SignalError::InvalidTable(format!(
            "{} predictions for {} rows",
            predictions.len(),
            expected
        )));
    }
    Ok(())
}

/// Accuracy, precision, recall and ROC AUC over the scored rows
pub fn classification_report(labels: &[bool], predictions: &OosPredictions) -> Result<ClassificationMetrics> {
    check_lengths(labels.len(), predictions)?;

    let mut y = Vec::new();
    let mut scores = Vec::new();
    let (mut tp, mut fp, mut fn_, mut correct) = (0usize, 0usize, 0usize, 0usize);

    for (row, class, proba) in predictions.scored() {
        let label = labels[row];
        match (class, label) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
        if class == label {
            correct += 1;
        }
        y.push(label);
        scores.push(proba);
    }

    let n = y.len();
    if n == 0 {
        return Err(SignalError::NoScoredRows);
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    Ok(ClassificationMetrics {
        n_oos: n,
        accuracy: correct as f64 / n as f64,
        precision_pos: ratio(tp, tp + fp),
        recall_pos: ratio(tp, tp + fn_),
        roc_auc: stats::roc_auc(&scores, &y),
    })
}

/// Hold-when-long payoff sketch over the scored rows
pub fn signal_pnl(meta: &[RowMeta], predictions: &OosPredictions) -> Result<PnlSketch> {
    check_lengths(meta.len(), predictions)?;

    let mut realized = Vec::new();
    let mut signal = Vec::new();
    for (row, class, _) in predictions.scored() {
        realized.push(meta[row].fwd_5d_ret);
        signal.push(class);
    }

    if realized.is_empty() {
        return Err(SignalError::NoScoredRows);
    }

    let growth: f64 = realized
        .iter()
        .zip(&signal)
        .map(|(&r, &long)| if long { 1.0 + r } else { 1.0 })
        .product();

    let long_returns: Vec<f64> = realized
        .iter()
        .zip(&signal)
        .filter(|&(_, &long)| long)
        .map(|(&r, _)| r)
        .collect();
    let n_long = long_returns.len();
    let hit_rate_when_long = (n_long > 0)
        .then(|| long_returns.iter().filter(|&&r| r > 0.0).count() as f64 / n_long as f64);

    let signal_values: Vec<f64> = signal.iter().map(|&s| if s { 1.0 } else { 0.0 }).collect();

    Ok(PnlSketch {
        strat_cum_return: growth - 1.0,
        hit_rate_when_long,
        spearman_ic_signal_vs_fwd: stats::spearman(&realized, &signal_values),
        n_long,
    })
}

/// Compute both metric groups for a table and its predictions
pub fn evaluate(table: &FeatureTable, predictions: &OosPredictions) -> Result<MetricsBundle> {
    Ok(MetricsBundle {
        classification: classification_report(table.labels(), predictions)?,
        pnl_sketch: signal_pnl(table.meta(), predictions)?,
    })
}

/// Write `metrics.json` (pretty printed) into `dir`
pub fn write_metrics(dir: &OutputDir, metrics: &MetricsBundle) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(metrics)?;
    Ok(dir.write(METRICS_FILE, json)?)
}

pub fn read_metrics<P: AsRef<Path>>(path: P) -> Result<MetricsBundle> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
