//! Expanding-window cross-validation producing out-of-sample predictions.

use std::ops::Range;

use eqsignal::models::Pipeline;
use log::debug;
use ndarray::s;

use crate::error::{Result, SignalError};
use crate::features::FeatureTable;

/// One train/test assignment; `index` counts from 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Expanding-window splits over `n_rows` chronologically ordered rows.
///
/// Rows are cut into `n_splits + 1` blocks of `n_rows / (n_splits + 1)`
/// rows, the first block absorbing the remainder. Fold `i` tests on block
/// `i + 1` and trains on everything before it, minus the last `purge_gap`
/// rows.
pub fn expanding_window_folds(n_rows: usize, n_splits: usize, purge_gap: usize) -> Result<Vec<Fold>> {
    if n_splits < 2 {
        return Err(SignalError::InvalidSplits(n_splits));
    }

    let Some(n_blocks) = n_splits.checked_add(1) else {
        return Err(SignalError::TooFewRows {
            rows: n_rows,
            splits: n_splits,
        });
    };
    let test_size = n_rows / n_blocks;
    if test_size == 0 {
        return Err(SignalError::TooFewRows {
            rows: n_rows,
            splits: n_splits,
        });
    }

    let first_test = n_rows - n_splits * test_size;
    let mut folds = Vec::with_capacity(n_splits);

    for i in 0..n_splits {
        let test_start = first_test + i * test_size;
        let train_end = test_start.saturating_sub(purge_gap);
        if train_end == 0 {
            return Err(SignalError::TooFewRows {
                rows: n_rows,
                splits: n_splits,
            });
        }

        folds.push(Fold {
            index: i + 1,
            train: 0..train_end,
            test: test_start..test_start + test_size,
        });
    }

    Ok(folds)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkForwardSettings {
    pub n_splits: usize,
    pub purge_gap: usize,
    /// Inverse L2 regularization strength
    pub c: f64,
    pub max_iter: usize,
}

impl Default for WalkForwardSettings {
    fn default() -> Self {
        Self {
            n_splits: 5,
            purge_gap: 0,
            c: 1.0,
            max_iter: 500,
        }
    }
}

/// Out-of-sample class and probability per table row, `None` where no
/// fold tested the row
#[derive(Debug, Clone, PartialEq)]
pub struct OosPredictions {
    classes: Vec<Option<bool>>,
    probabilities: Vec<Option<f64>>,
}

impl OosPredictions {
    pub fn empty(n_rows: usize) -> Self {
        Self {
            classes: vec![None; n_rows],
            probabilities: vec![None; n_rows],
        }
    }

    /// Build from per-row probabilities; class 1 strictly above 0.5
    pub fn from_probabilities(probabilities: Vec<Option<f64>>) -> Self {
        let classes = probabilities.iter().map(|p| p.map(|p| p > 0.5)).collect();
        Self {
            classes,
            probabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[Option<bool>] {
        &self.classes
    }

    pub fn probabilities(&self) -> &[Option<f64>] {
        &self.probabilities
    }

    pub fn n_scored(&self) -> usize {
        self.classes.iter().filter(|c| c.is_some()).count()
    }

    /// `(row, class, probability)` for every scored row
    pub fn scored(&self) -> impl Iterator<Item = (usize, bool, f64)> + '_ {
        self.classes
            .iter()
            .zip(&self.probabilities)
            .enumerate()
            .filter_map(|(i, (c, p))| Some((i, (*c)?, (*p)?)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldReport {
    pub fold: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
    pub accuracy: f64,
    pub n_iter: usize,
}

#[derive(Debug, Clone)]
pub struct WalkForwardResult {
    pub predictions: OosPredictions,
    pub folds: Vec<FoldReport>,
}

/// Fit a scaler + logistic regression per fold and collect test predictions.
pub fn walk_forward_predict(table: &FeatureTable, settings: &WalkForwardSettings) -> Result<WalkForwardResult> {
    let folds = expanding_window_folds(table.len(), settings.n_splits, settings.purge_gap)?;
    let x = table.matrix();
    let labels = table.labels();

    let mut predictions = OosPredictions::empty(table.len());
    let mut reports = Vec::with_capacity(folds.len());

    for fold in folds {
        let train_labels = &labels[fold.train.clone()];
        let n_pos = train_labels.iter().filter(|&&l| l).count();
        if n_pos == 0 || n_pos == train_labels.len() {
            return Err(SignalError::DegenerateLabel {
                fold: fold.index,
                class: u8::from(n_pos > 0),
            });
        }

        let x_train = x.slice(s![fold.train.clone(), ..]).to_owned();
        let x_test = x.slice(s![fold.test.clone(), ..]).to_owned();

        let mut model = Pipeline::new(settings.c, settings.max_iter);
        model.fit(&x_train, train_labels)?;
        let proba = model.predict_proba(&x_test)?;

        let mut correct = 0usize;
        for (row, &p) in fold.test.clone().zip(proba.iter()) {
            let class = p > 0.5;
            predictions.classes[row] = Some(class);
            predictions.probabilities[row] = Some(p);
            if class == labels[row] {
                correct += 1;
            }
        }

        let report = FoldReport {
            fold: fold.index,
            train: fold.train,
            test: fold.test,
            accuracy: correct as f64 / proba.len() as f64,
            n_iter: model.classifier().n_iter(),
        };
        debug!(
            "fold {}: train {:?}, test {:?}, accuracy {:.3}, {} Newton iterations",
            report.fold, report.train, report.test, report.accuracy, report.n_iter
        );
        reports.push(report);
    }

    Ok(WalkForwardResult {
        predictions,
        folds: reports,
    })
}
