use stats::sample_std;

/// Rolling sample standard deviation (n - 1 denominator) over `lookback` values.
///
/// A window containing NaN yields NaN, so a return series that starts with a
/// NaN warm-up value stays undefined until the window has moved past it.
pub fn rolling_std(data: &[f64], lookback: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if lookback < 2 || lookback > data.len() {
        return out;
    }

    for t in lookback - 1..data.len() {
        let window = &data[t + 1 - lookback..=t];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[t] = sample_std(window).unwrap_or(f64::NAN);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_std() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let out = rolling_std(&data, 3);

        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - 1.0).abs() < 1e-12);
        assert!((out[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_warm_up_nan_is_skipped() {
        let data = vec![f64::NAN, 0.01, 0.02, 0.03];
        let out = rolling_std(&data, 3);

        assert!(out[2].is_nan());
        assert!(out[3].is_finite());
    }

    #[test]
    fn test_flat_returns_are_zero() {
        let data = vec![0.0; 15];
        let out = rolling_std(&data, 10);
        assert_eq!(out[9], 0.0);
        assert_eq!(out[14], 0.0);
    }
}
