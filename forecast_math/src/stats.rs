//! Descriptive statistics and distribution quantiles

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Arithmetic mean of a slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
///
/// A single observation has no spread, so it yields zero rather than an error.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    let avg = mean(values)?;
    if values.len() < 2 {
        return Ok(0.0);
    }

    let variance = values.iter().map(|&x| (x - avg).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.max(0.0).sqrt())
}

/// Two-sided standard normal critical value for a confidence level
///
/// `z_score(0.95)` is roughly 1.96.
pub fn z_score(confidence_level: f64) -> Result<f64> {
    validate_confidence(confidence_level)?;

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Normal distribution: {}", e)))?;

    Ok(normal.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0))
}

/// Two-sided Student's t critical value for a confidence level
pub fn t_score(confidence_level: f64, degrees_of_freedom: usize) -> Result<f64> {
    validate_confidence(confidence_level)?;
    if degrees_of_freedom == 0 {
        return Err(MathError::InvalidInput(
            "Student's t needs at least one degree of freedom".to_string(),
        ));
    }

    let t = StudentsT::new(0.0, 1.0, degrees_of_freedom as f64)
        .map_err(|e| MathError::CalculationError(format!("Student's t distribution: {}", e)))?;

    Ok(t.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0))
}

fn validate_confidence(confidence_level: f64) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1 (exclusive), got {}",
            confidence_level
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&data).unwrap() - 5.0).abs() < 1e-12);
        // Sample variance is 32 / 7
        assert!((sample_std_dev(&data).unwrap() - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std_dev(&[3.0]).unwrap(), 0.0);
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_quantiles() {
        assert!((z_score(0.95).unwrap() - 1.959964).abs() < 1e-4);
        assert!((z_score(0.90).unwrap() - 1.644854).abs() < 1e-4);
        // t approaches z as the degrees of freedom grow
        assert!(t_score(0.95, 5).unwrap() > z_score(0.95).unwrap());
        assert!((t_score(0.95, 10_000).unwrap() - 1.96).abs() < 1e-2);
        assert!(z_score(1.0).is_err());
        assert!(t_score(0.95, 0).is_err());
    }
}
