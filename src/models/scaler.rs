use ndarray::{Array1, Array2, Axis};

use super::ModelError;

/// Per-column standardization to zero mean and unit (population) variance.
///
/// Columns with zero variance are centered but not rescaled.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn column means and scales from `x`
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<(), ModelError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyInput);
        }

        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyInput)?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(ModelError::NotFitted),
        };
        if x.ncols() != mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: mean.len(),
                got: x.ncols(),
            });
        }

        Ok((x - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }
}
