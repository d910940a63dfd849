//! # Forecast Math
//!
//! Numeric building blocks for daily time series forecasting.
//! This crate knows nothing about dates or cost; it works on plain `f64`
//! slices and provides:
//!
//! - Descriptive statistics and normal / Student's t quantiles
//! - Weighted and centered moving averages
//! - Least-squares polynomial regression with prediction standard errors
//! - Additive Holt-Winters (triple exponential smoothing) recursion

use thiserror::Error;

pub mod moving_averages;
pub mod regression;
pub mod smoothing;
pub mod stats;

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Absolute tolerance used when deciding that a quantity is numerically zero
pub const EPSILON: f64 = 1e-10;
