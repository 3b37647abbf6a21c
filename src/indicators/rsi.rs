// =============================================================================
// Relative Strength Index (RSI): exponential smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1. Price changes, delta_t = close_t - close_{t-1} (missing at t = 0).
// Step 2. Split into gains (max(delta, 0)) and losses (max(-delta, 0)).
// Step 3. Smooth both with the recursive EMA rule using alpha = 1 / period
//          (centre of mass period - 1), seeded from the first delta.
// Step 4. RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero average loss (including a perfectly flat market) is reported as 100.
// =============================================================================

use super::ema::ewm;

/// Compute the RSI column for `closes` with smoothing `period`.
///
/// The output is aligned with `closes`; index 0 is always missing because
/// there is no prior close to diff against.
///
/// # Edge cases
/// - empty input => empty vec
/// - `period == 0` => all missing
/// - `avg_loss == 0` => 100.0
/// - non-finite closes produce missing deltas; smoothing carries over them.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    if closes.is_empty() {
        return Vec::new();
    }

    // --- Price deltas --------------------------------------------------------
    let mut deltas: Vec<Option<f64>> = Vec::with_capacity(closes.len());
    deltas.push(None);
    deltas.extend(closes.windows(2).map(|w| {
        let d = w[1] - w[0];
        d.is_finite().then_some(d)
    }));

    let gains: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    // --- Smoothing -----------------------------------------------------------
    let alpha = 1.0 / period as f64;
    let avg_gain = ewm(&gains, alpha);
    let avg_loss = ewm(&losses, alpha);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| rsi_from_averages((*g)?, (*l)?))
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then(|| rsi.clamp(0.0, 100.0))
}
