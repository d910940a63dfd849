//! Least-squares polynomial regression for trend forecasting
//!
//! The regressor is standardised before building the normal equations, which
//! keeps the quadratic case well conditioned for day indices in the hundreds.

use crate::{MathError, Result};

/// Relative pivot size below which a matrix is treated as singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// A fitted polynomial `y = c0 + c1 * z + c2 * z^2 + ...` where `z` is the
/// standardised regressor `(x - x_mean) / x_scale`
#[derive(Debug, Clone)]
pub struct PolynomialFit {
    degree: usize,
    coefficients: Vec<f64>,
    x_mean: f64,
    x_scale: f64,
    /// Inverse of the normal matrix, used for prediction standard errors
    normal_inverse: Vec<Vec<f64>>,
    sse: f64,
    ss_total: f64,
    observations: usize,
}

impl PolynomialFit {
    /// Fit a polynomial of the given degree by ordinary least squares
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x ({}) and y ({}) must have the same length",
                x.len(),
                y.len()
            )));
        }

        let params = degree + 1;
        if x.len() <= params {
            return Err(MathError::InsufficientData(format!(
                "Degree {} regression needs more than {} points, have {}",
                degree,
                params,
                x.len()
            )));
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let spread = (x.iter().map(|v| (v - x_mean).powi(2)).sum::<f64>() / n).sqrt();
        if degree > 0 && spread < crate::EPSILON {
            return Err(MathError::CalculationError(
                "Cannot fit a trend: x values are too similar".to_string(),
            ));
        }
        let x_scale = if spread < crate::EPSILON { 1.0 } else { spread };

        // Normal equations: (Z'Z) c = Z'y
        let mut normal = vec![vec![0.0; params]; params];
        let mut rhs = vec![0.0; params];
        for (&xi, &yi) in x.iter().zip(y) {
            let row = powers((xi - x_mean) / x_scale, degree);
            for r in 0..params {
                rhs[r] += row[r] * yi;
                for c in 0..params {
                    normal[r][c] += row[r] * row[c];
                }
            }
        }

        let normal_inverse = invert_matrix(&normal)?;
        let coefficients: Vec<f64> = normal_inverse
            .iter()
            .map(|row| row.iter().zip(&rhs).map(|(a, b)| a * b).sum())
            .collect();

        if coefficients.iter().any(|c: &f64| !c.is_finite()) {
            return Err(MathError::CalculationError(
                "Regression produced non-finite coefficients".to_string(),
            ));
        }

        let mut fit = Self {
            degree,
            coefficients,
            x_mean,
            x_scale,
            normal_inverse,
            sse: 0.0,
            ss_total: 0.0,
            observations: x.len(),
        };

        let y_mean = y.iter().sum::<f64>() / n;
        fit.sse = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (yi - fit.predict(xi)).powi(2))
            .sum();
        fit.ss_total = y.iter().map(|v| (v - y_mean).powi(2)).sum();

        Ok(fit)
    }

    /// Fit against the day index `0..y.len()`
    pub fn fit_indexed(y: &[f64], degree: usize) -> Result<Self> {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        Self::fit(&x, y, degree)
    }

    /// Evaluate the fitted polynomial at `x`
    pub fn predict(&self, x: f64) -> f64 {
        powers(self.standardise(x), self.degree)
            .iter()
            .zip(&self.coefficients)
            .map(|(p, c)| p * c)
            .sum()
    }

    /// Standard error of a new observation at `x`
    ///
    /// `s * sqrt(1 + z' (Z'Z)^-1 z)`, which grows as `x` moves away from the
    /// fitted range.
    pub fn prediction_std_error(&self, x: f64) -> f64 {
        let row = powers(self.standardise(x), self.degree);
        let mut leverage = 0.0;
        for (r, row_r) in row.iter().enumerate() {
            for (c, row_c) in row.iter().enumerate() {
                leverage += row_r * self.normal_inverse[r][c] * row_c;
            }
        }

        self.residual_std() * (1.0 + leverage.max(0.0)).sqrt()
    }

    /// Residual standard error `sqrt(SSE / (n - p))`
    pub fn residual_std(&self) -> f64 {
        (self.sse / self.degrees_of_freedom() as f64).max(0.0).sqrt()
    }

    /// Residual variance adjusted for the number of fitted parameters
    pub fn adjusted_residual_variance(&self) -> f64 {
        self.sse / self.degrees_of_freedom() as f64
    }

    /// Residual degrees of freedom `n - p`
    pub fn degrees_of_freedom(&self) -> usize {
        self.observations - (self.degree + 1)
    }

    /// Coefficient of determination, `None` when the response is constant
    pub fn r_squared(&self) -> Option<f64> {
        if self.ss_total.abs() < crate::EPSILON {
            return None;
        }
        Some(1.0 - self.sse / self.ss_total)
    }

    /// Sum of squared residuals
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Polynomial degree
    pub fn degree(&self) -> usize {
        self.degree
    }

    fn standardise(&self, x: f64) -> f64 {
        (x - self.x_mean) / self.x_scale
    }
}

fn powers(z: f64, degree: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(degree + 1);
    let mut value = 1.0;
    for _ in 0..=degree {
        row.push(value);
        value *= z;
    }
    row
}

/// Invert a square matrix with Gauss-Jordan elimination and partial pivoting
pub fn invert_matrix(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let size = matrix.len();
    if size == 0 || matrix.iter().any(|row| row.len() != size) {
        return Err(MathError::InvalidInput(
            "Matrix must be square and non-empty".to_string(),
        ));
    }

    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale < crate::EPSILON {
        return Err(MathError::CalculationError(
            "Matrix is all zeros".to_string(),
        ));
    }

    let mut work: Vec<Vec<f64>> = matrix.to_vec();
    let mut inverse: Vec<Vec<f64>> = (0..size)
        .map(|r| (0..size).map(|c| if r == c { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..size {
        let pivot_row = (col..size)
            .max_by(|&a, &b| work[a][col].abs().total_cmp(&work[b][col].abs()))
            .unwrap_or(col);

        if work[pivot_row][col].abs() < SINGULAR_TOLERANCE * scale {
            return Err(MathError::CalculationError(
                "Matrix is singular or ill-conditioned".to_string(),
            ));
        }

        work.swap(col, pivot_row);
        inverse.swap(col, pivot_row);

        let pivot = work[col][col];
        for c in 0..size {
            work[col][c] /= pivot;
            inverse[col][c] /= pivot;
        }

        let pivot_work = work[col].clone();
        let pivot_inverse = inverse[col].clone();
        for r in 0..size {
            if r == col {
                continue;
            }
            let factor = work[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..size {
                work[r][c] -= factor * pivot_work[c];
                inverse[r][c] -= factor * pivot_inverse[c];
            }
        }
    }

    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_regression() {
        // Perfect linear relationship
        let y = [10.0, 20.0, 30.0, 40.0];
        let fit = PolynomialFit::fit_indexed(&y, 1).unwrap();

        assert!((fit.predict(4.0) - 50.0).abs() < 1e-9);
        assert!(fit.sse() < 1e-12);
        assert!(fit.r_squared().unwrap() > 0.999);
        assert_eq!(fit.degrees_of_freedom(), 2);
    }

    #[test]
    fn test_quadratic_regression() {
        let y: Vec<f64> = (0..12).map(|i| 3.0 + 0.5 * (i * i) as f64).collect();
        let fit = PolynomialFit::fit_indexed(&y, 2).unwrap();

        assert!((fit.predict(12.0) - (3.0 + 0.5 * 144.0)).abs() < 1e-6);
        assert!(fit.residual_std() < 1e-6);
    }

    #[test]
    fn test_constant_response() {
        let fit = PolynomialFit::fit_indexed(&[7.0; 9], 0).unwrap();
        assert!((fit.predict(100.0) - 7.0).abs() < 1e-12);
        assert_eq!(fit.r_squared(), None);
        assert_eq!(fit.prediction_std_error(50.0), 0.0);
    }

    #[test]
    fn test_prediction_error_widens_with_distance() {
        let y = [10.0, 12.0, 9.0, 14.0, 13.0, 15.0, 12.0, 17.0];
        let fit = PolynomialFit::fit_indexed(&y, 1).unwrap();

        let near = fit.prediction_std_error(8.0);
        let far = fit.prediction_std_error(20.0);
        assert!(near > 0.0);
        assert!(far > near);
    }

    #[test]
    fn test_insufficient_points() {
        assert!(PolynomialFit::fit_indexed(&[1.0, 2.0, 3.0], 2).is_err());
        assert!(PolynomialFit::fit(&[1.0, 2.0], &[1.0], 1).is_err());
    }

    #[test]
    fn test_singular_matrix() {
        let singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(invert_matrix(&singular).is_err());

        let inverse = invert_matrix(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
        assert!((inverse[0][0] - 0.6).abs() < 1e-12);
        assert!((inverse[0][1] + 0.7).abs() < 1e-12);
        assert!((inverse[1][0] + 0.2).abs() < 1e-12);
        assert!((inverse[1][1] - 0.4).abs() < 1e-12);
    }
}
