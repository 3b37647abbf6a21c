// =============================================================================
// Rolling Volatility
// =============================================================================
//
// Sample standard deviation of the Daily Return column over a trailing window:
//
//   mean  = sum(r) / N
//   var   = sum((r - mean)^2) / (N - 1)      (N > 1)
//   sigma = sqrt(var)                        (0 when N == 1)
//
// A window is only evaluated when every return inside it is present, so the
// first N entries are always missing (r_0 has no prior close) and a missing
// return inside the series blanks the N windows that contain it.
// =============================================================================

/// Rolling sample standard deviation of `returns` over `period` values.
pub fn calculate_volatility(returns: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; returns.len()];
    }

    let mut result = vec![None; returns.len().min(period - 1)];
    for window in returns.windows(period) {
        result.push(sample_std(window));
    }
    result
}

fn sample_std(window: &[Option<f64>]) -> Option<f64> {
    let values: Vec<f64> = window.iter().copied().collect::<Option<Vec<_>>>()?;
    let n = values.len();
    if n == 1 {
        return Some(0.0);
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sigma = variance.sqrt();
    sigma.is_finite().then_some(sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::daily_return::calculate_daily_return;

    #[test]
    fn volatility_empty() {
        assert!(calculate_volatility(&[], 5).is_empty());
    }

    #[test]
    fn volatility_missing_until_window_full() {
        let returns = calculate_daily_return(&[10.0, 11.0, 12.0, 11.0, 10.0, 10.5]);
        let vol = calculate_volatility(&returns, 3);
        assert_eq!(vol.len(), 6);
        // r_0 missing => windows ending at 0..=2 are incomplete.
        assert!(vol[..3].iter().all(Option::is_none));
        assert!(vol[3..].iter().all(Option::is_some));
    }

    #[test]
    fn volatility_matches_sample_std() {
        let returns = vec![None, Some(0.01), Some(-0.02), Some(0.03), Some(0.0)];
        let vol = calculate_volatility(&returns, 4);
        let window = [0.01, -0.02, 0.03, 0.0];
        let mean = window.iter().sum::<f64>() / 4.0;
        let var = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(vol[..4].iter().all(Option::is_none));
        assert!((vol[4].unwrap() - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn volatility_period_one_is_zero_where_return_exists() {
        let returns = vec![None, Some(0.05), None, Some(-0.01)];
        let vol = calculate_volatility(&returns, 1);
        assert_eq!(vol, vec![None, Some(0.0), None, Some(0.0)]);
    }

    #[test]
    fn gap_in_returns_blanks_covering_windows() {
        let returns = vec![None, Some(0.1), Some(0.2), None, Some(0.1), Some(0.3), Some(0.2)];
        let vol = calculate_volatility(&returns, 2);
        assert!(vol[2].is_some());
        assert!(vol[3].is_none());
        assert!(vol[4].is_none());
        assert!(vol[5].is_some());
    }

    #[test]
    fn constant_returns_have_zero_volatility() {
        let returns = vec![None, Some(0.01), Some(0.01), Some(0.01)];
        let vol = calculate_volatility(&returns, 3);
        assert!(vol[3].unwrap().abs() < 1e-15);
    }
}
