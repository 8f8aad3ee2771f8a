/// Calculates the Simple Moving Average (SMA) for a given data slice and number of lags.
///
/// # Arguments
///
/// * `data` - A slice of f64 values.
/// * `lags` - The window size for the moving average.
///
/// # Returns
///
/// A Vec<f64> containing the SMA values. The first `lags - 1` values are NaN.
pub fn moving_average(data: &[f64], lags: usize) -> Vec<f64> {
    if lags == 0 || lags > data.len() {
        return vec![f64::NAN; data.len()];
    }

    let mut sma = vec![f64::NAN; data.len()];

    for t in lags - 1..data.len() {
        let window = &data[t + 1 - lags..=t];
        sma[t] = window.iter().sum::<f64>() / lags as f64;
    }

    sma
}
