// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free transforms over a closing-price sequence. Every
// function returns a column of the same length as its input, using `None`
// where the indicator is not computable (insufficient history, zero
// denominators, non-finite inputs). An empty input always yields an empty
// column; nothing in here returns an error.

pub mod daily_return;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod volatility;

pub use engine::compute;

/// Lift raw closes into optional inputs, treating non-finite values as
/// missing.
pub(crate) fn finite_inputs(closes: &[f64]) -> Vec<Option<f64>> {
    closes.iter().map(|&c| c.is_finite().then_some(c)).collect()
}
