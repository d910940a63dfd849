//! Moving average calculation implementations
//!
//! Contains the moving averages used by the forecasting models:
//! - Exponentially decaying weighted average of a trailing window
//! - Centered moving average (2 x m for even periods) for trend extraction

use crate::{MathError, Result};

/// Exponentially decaying weights for a window, oldest first
///
/// Weights follow `exp(t)` for `t` evenly spaced on `[-1, 0]`, so the newest
/// observation weighs `e` times the oldest. They are normalised to sum to one.
pub fn decay_weights(window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    if window == 1 {
        return Ok(vec![1.0]);
    }

    let step = 1.0 / (window - 1) as f64;
    let raw: Vec<f64> = (0..window).map(|i| (-1.0 + i as f64 * step).exp()).collect();
    let total: f64 = raw.iter().sum();

    Ok(raw.into_iter().map(|w| w / total).collect())
}

/// Weighted average of `values` using `weights` of the same length
pub fn weighted_average(values: &[f64], weights: &[f64]) -> Result<f64> {
    if values.len() != weights.len() || values.is_empty() {
        return Err(MathError::InvalidInput(format!(
            "Values ({}) and weights ({}) must have the same non-zero length",
            values.len(),
            weights.len()
        )));
    }

    let weight_sum: f64 = weights.iter().sum();
    if weight_sum.abs() < crate::EPSILON {
        return Err(MathError::CalculationError(
            "Weights sum to zero".to_string(),
        ));
    }

    let total: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Ok(total / weight_sum)
}

/// Decay-weighted average of the trailing `window` values
pub fn trailing_weighted_average(values: &[f64], window: usize) -> Result<f64> {
    if values.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for the trailing window, have {}",
            window,
            values.len()
        )));
    }

    let weights = decay_weights(window)?;
    weighted_average(&values[values.len() - window..], &weights)
}

/// Centered moving average over `period` observations
///
/// Entries too close to either end to have a full window are `None`. For an
/// even period the classical 2 x m average is used: the two outermost points
/// get half weight so the window stays centered on the observation.
pub fn centered_moving_average(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }

    let half = period / 2;
    let n = values.len();
    if n < 2 * half + 1 {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} values for a centered average of period {}, have {}",
            2 * half + 1,
            period,
            n
        )));
    }

    let mut result = vec![None; n];
    for i in half..n - half {
        let window = &values[i - half..=i + half];
        let average = if period % 2 == 1 {
            window.iter().sum::<f64>() / period as f64
        } else {
            let inner: f64 = window[1..window.len() - 1].iter().sum();
            let outer = 0.5 * (window[0] + window[window.len() - 1]);
            (inner + outer) / period as f64
        };
        result[i] = Some(average);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_weights() {
        let weights = decay_weights(5).unwrap();
        assert_eq!(weights.len(), 5);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        // Newest weighs e times the oldest
        assert!((weights[4] / weights[0] - std::f64::consts::E).abs() < 1e-9);
        assert!(weights.windows(2).all(|w| w[1] > w[0]));
        assert!(decay_weights(0).is_err());
        assert_eq!(decay_weights(1).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_trailing_weighted_average() {
        let values = [10.0, 10.0, 10.0, 20.0, 20.0, 20.0];
        let avg = trailing_weighted_average(&values, 6).unwrap();
        // Recent values dominate
        assert!(avg > 15.0 && avg < 20.0);

        let flat = trailing_weighted_average(&[42.0; 7], 7).unwrap();
        assert!((flat - 42.0).abs() < 1e-9);

        assert!(trailing_weighted_average(&values, 7).is_err());
    }

    #[test]
    fn test_centered_moving_average_odd() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let cma = centered_moving_average(&values, 3).unwrap();
        assert_eq!(cma[0], None);
        assert!((cma[1].unwrap() - 2.0).abs() < 1e-12);
        assert!((cma[3].unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(cma[4], None);
    }

    #[test]
    fn test_centered_moving_average_even() {
        // A period-4 pattern averages out to its mean
        let values = [1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0];
        let cma = centered_moving_average(&values, 4).unwrap();
        assert_eq!(cma[1], None);
        for value in cma.iter().flatten() {
            assert!((value - 2.0).abs() < 1e-12);
        }
        assert_eq!(cma.iter().flatten().count(), 4);
    }
}
