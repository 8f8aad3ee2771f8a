// ============================================================================
// Mean
// ============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(x: &[f64]) -> Option<f64> {
    if x.is_empty() {
        return None;
    }
    Some(x.iter().sum::<f64>() / x.len() as f64)
}

// ============================================================================
// Sample standard deviation (n - 1 denominator)
// ============================================================================

/// Two-pass sample standard deviation. Needs at least two values.
///
/// A window of identical values returns exactly `0.0`.
pub fn sample_std(x: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 {
        return None;
    }

    let m = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|xi| (xi - m) * (xi - m)).sum();

    Some((ss / (n - 1) as f64).sqrt())
}

// ============================================================================
// Population standard deviation (n denominator)
// ============================================================================

pub fn population_std(x: &[f64]) -> Option<f64> {
    let m = mean(x)?;
    let ss: f64 = x.iter().map(|xi| (xi - m) * (xi - m)).sum();
    Some((ss / x.len() as f64).sqrt())
}
