/// Percentage change over `periods` steps: `x[t] / x[t - periods] - 1`.
///
/// The first `periods` values are NaN, as are positions whose base value is
/// NaN.
pub fn pct_change(data: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if periods == 0 {
        return out;
    }

    for t in periods..data.len() {
        out[t] = data[t] / data[t - periods] - 1.0;
    }

    out
}

/// Percentage change from `t` to `t + periods`, aligned at `t`.
///
/// Equivalent to `pct_change` shifted back by `periods`; the last `periods`
/// values are NaN.
pub fn forward_pct_change(data: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if periods == 0 {
        return out;
    }

    for t in 0..data.len().saturating_sub(periods) {
        out[t] = data[t + periods] / data[t] - 1.0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change() {
        let data = vec![100.0, 110.0, 99.0, 99.0];
        let ret = pct_change(&data, 1);

        assert!(ret[0].is_nan());
        assert!((ret[1] - 0.1).abs() < 1e-12);
        assert!((ret[2] - (-0.1)).abs() < 1e-12);
        assert_eq!(ret[3], 0.0);
    }

    #[test]
    fn test_forward_is_shifted_backward() {
        let data: Vec<f64> = (1..=12).map(|i| 100.0 + (i * i) as f64).collect();
        let back = pct_change(&data, 5);
        let fwd = forward_pct_change(&data, 5);

        for t in 0..data.len() - 5 {
            assert_eq!(fwd[t], back[t + 5]);
        }
        for t in data.len() - 5..data.len() {
            assert!(fwd[t].is_nan());
        }
    }

    #[test]
    fn test_short_series() {
        let data = vec![1.0, 2.0];
        assert!(pct_change(&data, 5).iter().all(|v| v.is_nan()));
        assert!(forward_pct_change(&data, 5).iter().all(|v| v.is_nan()));
        assert!(pct_change(&data, 0).iter().all(|v| v.is_nan()));
    }
}
