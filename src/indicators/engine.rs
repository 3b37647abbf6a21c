// =============================================================================
// Indicator Engine: dispatch from IndicatorKind to the pure transforms
// =============================================================================

use tracing::debug;

use super::daily_return::calculate_daily_return;
use super::ema::calculate_ema;
use super::macd::calculate_macd_histogram;
use super::moving_average::calculate_moving_average;
use super::rsi::calculate_rsi;
use super::volatility::calculate_volatility;
use crate::types::{DerivedColumn, IndicatorKind, IndicatorRequest};

/// Compute a single indicator column for `closes`.
pub fn compute_one(closes: &[f64], kind: IndicatorKind) -> DerivedColumn {
    let values = match kind {
        IndicatorKind::DailyReturn => calculate_daily_return(closes),
        IndicatorKind::MovingAverage { period } => calculate_moving_average(closes, period),
        IndicatorKind::Volatility { period } => {
            calculate_volatility(&calculate_daily_return(closes), period)
        }
        IndicatorKind::Ema { span } => calculate_ema(closes, span),
        IndicatorKind::Macd { fast, slow, signal } => {
            calculate_macd_histogram(closes, fast, slow, signal)
        }
        IndicatorKind::Rsi { period } => calculate_rsi(closes, period),
    };
    DerivedColumn::new(kind.column_name(), values)
}

/// Compute every requested column, in request order.
///
/// Daily Return is computed once and shared when both it and Volatility are
/// selected.
pub fn compute(closes: &[f64], request: &IndicatorRequest) -> Vec<DerivedColumn> {
    let mut returns: Option<Vec<Option<f64>>> = None;
    let mut columns = Vec::with_capacity(request.kinds().len());

    for &kind in request.kinds() {
        let column = match kind {
            IndicatorKind::DailyReturn => {
                let r = returns.get_or_insert_with(|| calculate_daily_return(closes));
                DerivedColumn::new(kind.column_name(), r.clone())
            }
            IndicatorKind::Volatility { period } => {
                let r = returns.get_or_insert_with(|| calculate_daily_return(closes));
                DerivedColumn::new(kind.column_name(), calculate_volatility(r, period))
            }
            other => compute_one(closes, other),
        };
        debug!(
            indicator = %kind,
            len = column.len(),
            leading_missing = column.leading_missing(),
            "indicator computed"
        );
        columns.push(column);
    }

    columns
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn all_defaults() -> IndicatorRequest {
        IndicatorRequest::new(IndicatorKind::ALL).unwrap()
    }

    fn sample_closes() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13, 43.50, 44.00,
        ]
    }

    #[test]
    fn empty_series_gives_empty_columns() {
        let cols = compute(&[], &all_defaults());
        assert_eq!(cols.len(), 6);
        for col in cols {
            assert!(col.is_empty(), "{} should be empty", col.name);
        }
    }

    #[test]
    fn columns_are_aligned_and_named_in_request_order() {
        let closes = sample_closes();
        let cols = compute(&closes, &all_defaults());
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Daily Return", "Moving Average", "Volatility", "EMA", "MACD", "RSI"]
        );
        for col in &cols {
            assert_eq!(col.len(), closes.len(), "{} misaligned", col.name);
        }
    }

    #[test]
    fn leading_missing_per_indicator() {
        let closes = sample_closes();
        let cols = compute(&closes, &all_defaults());
        let leading: Vec<_> = cols.iter().map(DerivedColumn::leading_missing).collect();
        // Daily Return 1, MA(5) 4, Volatility(5) 5, EMA 0, MACD 0, RSI 1
        assert_eq!(leading, vec![1, 4, 5, 0, 0, 1]);
    }

    #[test]
    fn shared_returns_match_standalone_volatility() {
        let closes = sample_closes();
        let req = IndicatorRequest::new([
            IndicatorKind::DailyReturn,
            IndicatorKind::Volatility { period: 3 },
        ])
        .unwrap();
        let cols = compute(&closes, &req);
        let standalone = compute_one(&closes, IndicatorKind::Volatility { period: 3 });
        assert_eq!(cols[1], standalone);
    }

    #[test]
    fn end_to_end_moving_average() {
        let req = IndicatorRequest::new([IndicatorKind::MovingAverage { period: 3 }]).unwrap();
        let cols = compute(&[10.0, 11.0, 12.0, 11.0, 10.0], &req);
        let ma = &cols[0].values;
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        assert!((ma[2].unwrap() - 11.0).abs() < 1e-12);
        assert!((ma[3].unwrap() - 11.333_333_333).abs() < 1e-6);
        assert!((ma[4].unwrap() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn rsi_on_rising_series_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let col = compute_one(&closes, IndicatorKind::Rsi { period: 14 });
        assert!(col.values.iter().skip(1).all(|v| *v == Some(100.0)));
    }

    #[test]
    fn all_missing_input_gives_all_missing_columns() {
        let closes = [f64::NAN; 4];
        for col in compute(&closes, &all_defaults()) {
            assert_eq!(col.len(), 4);
            assert!(col.values.iter().all(Option::is_none), "{}", col.name);
        }
    }

    #[test]
    fn engine_does_not_touch_input() {
        let closes = sample_closes();
        let copy = closes.clone();
        let _ = compute(&closes, &all_defaults());
        assert_eq!(closes, copy);
    }
}
