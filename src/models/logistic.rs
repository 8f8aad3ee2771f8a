//! L2-regularized logistic regression with balanced class weights.
//!
//! The objective is
//!
//! ```text
//!     0.5 * ||w||^2 + C * sum_i s_i * logloss_i
//! ```
//!
//! where the intercept is not penalized and `s_i = n / (2 * n_class(i))`
//! gives each class the same total weight. It is minimized with damped
//! Newton steps, so the fit is deterministic for a given input.

use log::warn;
use ndarray::{Array1, Array2, Axis};

use super::ModelError;

const GRAD_TOL: f64 = 1e-8;
const MAX_HALVINGS: usize = 40;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    c: f64,
    max_iter: usize,
    coefficients: Option<Array1<f64>>,
    intercept: Option<f64>,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0, 500)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

/// log(1 + exp(z)) without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize) -> Self {
        Self {
            c,
            max_iter,
            coefficients: None,
            intercept: None,
            n_iter: 0,
        }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> Option<f64> {
        self.intercept
    }

    /// Newton iterations used by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &[bool]) -> Result<(), ModelError> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(ModelError::InvalidParameter(format!("C must be positive, got {}", self.c)));
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidParameter("max_iter must be at least 1".into()));
        }
        let n = x.nrows();
        if n == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyInput);
        }
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }

        let n_pos = y.iter().filter(|&&v| v).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(ModelError::SingleClass);
        }

        // Design matrix with a leading column of ones for the intercept
        let p = x.ncols() + 1;
        let mut design = Array2::<f64>::ones((n, p));
        design.slice_mut(ndarray::s![.., 1..]).assign(x);

        let target: Array1<f64> = y.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect();
        let w_pos = n as f64 / (2.0 * n_pos as f64);
        let w_neg = n as f64 / (2.0 * n_neg as f64);
        let sample_weight: Array1<f64> = y
            .iter()
            .map(|&v| if v { w_pos } else { w_neg })
            .collect();

        let c = self.c;
        let objective = |beta: &Array1<f64>| -> f64 {
            let z = design.dot(beta);
            let data: f64 = z
                .iter()
                .zip(target.iter())
                .zip(sample_weight.iter())
                .map(|((&zi, &yi), &si)| si * (softplus(zi) - yi * zi))
                .sum();
            let penalty: f64 = beta.iter().skip(1).map(|b| b * b).sum();
            0.5 * penalty + c * data
        };

        let mut beta = Array1::<f64>::zeros(p);
        let mut current = objective(&beta);
        let mut converged = false;
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            self.n_iter = iter + 1;

            let z = design.dot(&beta);
            let prob = z.mapv(sigmoid);

            let residual = (&prob - &target) * &sample_weight * c;
            let mut gradient = design.t().dot(&residual);
            for j in 1..p {
                gradient[j] += beta[j];
            }

            let max_grad = gradient.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if max_grad < GRAD_TOL {
                converged = true;
                break;
            }

            let curvature = &prob * &prob.mapv(|v| 1.0 - v) * &sample_weight * c;
            let weighted = &design * &curvature.view().insert_axis(Axis(1));
            let mut hessian = design.t().dot(&weighted);
            for j in 1..p {
                hessian[[j, j]] += 1.0;
            }

            let step = solve(hessian, gradient).ok_or(ModelError::Singular(iter))?;

            let mut scale = 1.0;
            let mut improved = false;
            for _ in 0..MAX_HALVINGS {
                let candidate = &beta - &(&step * scale);
                let value = objective(&candidate);
                if value <= current {
                    beta = candidate;
                    improved = current - value > 0.0;
                    current = value;
                    break;
                }
                scale *= 0.5;
            }

            if !improved {
                // No decrease available at machine precision
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "logistic regression did not converge in {} iterations",
                self.max_iter
            );
        }

        self.intercept = Some(beta[0]);
        self.coefficients = Some(beta.slice(ndarray::s![1..]).to_owned());
        Ok(())
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let (coef, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(b)) => (c, b),
            _ => return Err(ModelError::NotFitted),
        };
        if x.ncols() != coef.len() {
            return Err(ModelError::DimensionMismatch {
                expected: coef.len(),
                got: x.ncols(),
            });
        }

        Ok((x.dot(coef) + intercept).mapv(sigmoid))
    }

    /// Class predictions; class 1 only when the probability exceeds 0.5
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<bool>, ModelError> {
        Ok(self.predict_proba(x)?.iter().map(|&p| p > 0.5).collect())
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if !(a[[pivot, col]].abs() > 1e-300) {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
