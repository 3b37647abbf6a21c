// =============================================================================
// Daily Return
// =============================================================================
//
//   r_0 = missing
//   r_t = close_t / close_{t-1} - 1
//
// A zero (or non-finite) previous close yields a missing value instead of an
// infinity, so the column never carries inf/NaN into Volatility or the table.

/// Simple one-period return for each close.
pub fn calculate_daily_return(closes: &[f64]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return result;
    }

    result.push(None);
    for w in closes.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        if prev == 0.0 || !prev.is_finite() || !cur.is_finite() {
            result.push(None);
            continue;
        }
        let r = cur / prev - 1.0;
        result.push(r.is_finite().then_some(r));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_return_empty() {
        assert!(calculate_daily_return(&[]).is_empty());
    }

    #[test]
    fn daily_return_single_close() {
        assert_eq!(calculate_daily_return(&[10.0]), vec![None]);
    }

    #[test]
    fn daily_return_known_values() {
        let r = calculate_daily_return(&[100.0, 102.0, 101.0, 105.0]);
        assert_eq!(r.len(), 4);
        assert!(r[0].is_none());
        assert!((r[1].unwrap() - 0.02).abs() < 1e-12);
        assert!((r[2].unwrap() - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
        assert!((r[2].unwrap() + 0.0098).abs() < 1e-4);
        assert!((r[3].unwrap() - 0.0396).abs() < 1e-4);
    }

    #[test]
    fn zero_previous_close_is_missing() {
        let r = calculate_daily_return(&[0.0, 5.0, 10.0]);
        assert_eq!(r[1], None);
        assert!((r[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nan_close_is_missing_on_both_sides() {
        let r = calculate_daily_return(&[1.0, f64::NAN, 2.0]);
        assert_eq!(r, vec![None, None, None]);
    }
}
