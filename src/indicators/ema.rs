// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// The series is seeded with the first value itself (not an SMA), so it is
// defined at every index from the first valid input onwards. The same
// recursion with a different alpha drives MACD (on the MACD line) and RSI
// (alpha = 1 / period on gains and losses).
// =============================================================================

use super::finite_inputs;

/// Smoothing factor for an EMA of the given `span`.
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Recursive exponential smoothing over an optional-valued series.
///
/// Output has the same length as `values`:
/// - entries before the first `Some` are `None`,
/// - the first `Some` seeds the average unchanged,
/// - a `None` after seeding repeats the previous smoothed value.
///
/// Returns an all-`None` column when `alpha` is not in `(0, 1]`.
pub fn ewm(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return vec![None; values.len()];
    }

    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for value in values {
        let next = match (prev, value) {
            (None, Some(v)) => Some(*v),
            (Some(p), Some(v)) => Some(alpha * v + (1.0 - alpha) * p),
            (p, None) => p,
        };
        // A non-finite intermediate would poison every later value; treat it
        // as a reset so the next valid input re-seeds.
        prev = next.filter(|x| x.is_finite());
        result.push(prev);
    }

    result
}

/// Compute the EMA column for `closes` with the given `span`.
///
/// # Edge cases
/// - empty input => empty vec
/// - `span == 0` => all missing
/// - non-finite closes are treated as missing inputs
pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; closes.len()];
    }
    ewm(&finite_inputs(closes), span_alpha(span))
}
