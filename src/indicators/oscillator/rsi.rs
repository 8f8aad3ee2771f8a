/// RSI reported for a window with no price movement at all.
pub const RSI_FLAT: f64 = 50.0;

/// Compute RSI (Relative Strength Index) from simple rolling means
///
/// For each position `t` the last `period` price changes are split into gains
/// and losses, each averaged over the window:
/// - RS = Average Gain / Average Loss
/// - RSI = 100 - (100 / (1 + RS))
///
/// The ratio is undefined when the average loss is zero:
/// - gains but no losses → 100
/// - no gains and no losses → `RSI_FLAT` (50)
///
/// # Arguments
/// * `prices` - Close prices (not log-transformed)
/// * `period` - RSI lookback period (typically 14)
///
/// # Returns
/// Vector of RSI values in [0, 100]; the first `period` values are NaN.
pub fn rolling_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut rsi_values = vec![f64::NAN; prices.len()];

    if period == 0 || prices.len() <= period {
        return rsi_values;
    }

    for (t, rsi_val) in rsi_values.iter_mut().enumerate().skip(period) {
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for j in t + 1 - period..=t {
            let change = prices[j] - prices[j - 1];
            if change > 0.0 {
                avg_gain += change;
            } else {
                avg_loss -= change; // Store as positive value
            }
        }

        avg_gain /= period as f64;
        avg_loss /= period as f64;

        *rsi_val = if avg_loss == 0.0 && avg_gain == 0.0 {
            RSI_FLAT
        } else if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        };
    }

    rsi_values
}
