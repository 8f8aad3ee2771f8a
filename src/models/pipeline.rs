use ndarray::{Array1, Array2};

use super::{LogisticRegression, ModelError, StandardScaler};

/// Standardization followed by logistic regression.
///
/// Both stages are fitted on the training rows only; prediction reuses the
/// training statistics.
#[derive(Debug, Clone)]
pub struct Pipeline {
    scaler: StandardScaler,
    classifier: LogisticRegression,
}

impl Pipeline {
    pub fn new(c: f64, max_iter: usize) -> Self {
        Self {
            scaler: StandardScaler::new(),
            classifier: LogisticRegression::new(c, max_iter),
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        let scaled = self.scaler.fit_transform(x)?;
        self.classifier.fit(&scaled, y)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let scaled = self.scaler.transform(x)?;
        self.classifier.predict_proba(&scaled)
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(1.0, 500)
    }
}
