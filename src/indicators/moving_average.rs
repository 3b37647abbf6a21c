// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   ma_t = mean(close_{t-N+1} .. close_t)    for t >= N - 1
//
// The first N - 1 entries are missing. N = 1 reproduces the close series.
// Each window is summed directly rather than with a running sum, so long
// series do not accumulate floating-point drift.

/// Trailing arithmetic mean of `closes` over `period` values.
///
/// Returns a column of the same length as `closes`; `period == 0` yields an
/// all-missing column. A window containing a non-finite close is missing.
pub fn calculate_moving_average(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut result = vec![None; closes.len().min(period - 1)];
    for window in closes.windows(period) {
        let mean = window.iter().sum::<f64>() / period as f64;
        result.push(mean.is_finite().then_some(mean));
    }
    result
}
