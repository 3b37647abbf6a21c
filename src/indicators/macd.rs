// =============================================================================
// MACD (Moving Average Convergence Divergence): histogram
// =============================================================================
//
//   macd_line = EMA_fast(close) - EMA_slow(close)
//   signal    = EMA_signal(macd_line)
//   histogram = macd_line - signal
//
// Every EMA is seeded independently from its own first input, so the
// histogram is 0 at the first index and defined everywhere after.
// =============================================================================

use super::ema::{calculate_ema, ewm, span_alpha};

/// The three MACD series, each aligned with the input closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdResult {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Compute MACD line, signal line and histogram.
///
/// Any zero span yields all-missing series.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdResult {
    if fast == 0 || slow == 0 || signal == 0 {
        let blank = vec![None; closes.len()];
        return MacdResult {
            line: blank.clone(),
            signal: blank.clone(),
            histogram: blank,
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ewm(&line, span_alpha(signal));

    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdResult {
        line,
        signal: signal_line,
        histogram,
    }
}

/// The value reported in the `MACD` column.
pub fn calculate_macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    calculate_macd(closes, fast, slow, signal).histogram
}
