//! Forecast configuration
//!
//! Defaults match the daily cost analysis: a two week horizon, weekly
//! seasonality and 95% intervals. Values can be overridden from the
//! environment or from a JSON document.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Options consumed by the forecasting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future days to forecast
    pub forecast_horizon_days: usize,
    /// Length of the repeating cycle, in days
    pub seasonal_period_days: usize,
    /// Nominal coverage of the forecast intervals
    pub confidence_level: f64,
    /// Days held out per walk-forward fold
    pub backtest_window_days: usize,
    /// Folds a model needs before its metrics are fully trusted
    pub min_backtest_folds: usize,
    /// Most recent folds kept per model
    pub max_backtest_folds: usize,
    /// Services (by total cost) forecast individually
    pub top_services: usize,
    /// Evaluate models and services on the rayon pool
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_horizon_days: 14,
            seasonal_period_days: 7,
            confidence_level: 0.95,
            backtest_window_days: 7,
            min_backtest_folds: 2,
            max_backtest_folds: 14,
            top_services: 6,
            parallel: true,
        }
    }
}

impl ForecastConfig {
    /// Defaults overridden by `FORECAST_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        read_env("FORECAST_HORIZON", &mut config.forecast_horizon_days)?;
        read_env("FORECAST_SEASONAL_PERIOD", &mut config.seasonal_period_days)?;
        read_env("FORECAST_CONFIDENCE_LEVEL", &mut config.confidence_level)?;
        read_env("FORECAST_BACKTEST_WINDOW", &mut config.backtest_window_days)?;
        read_env("FORECAST_MIN_BACKTEST_FOLDS", &mut config.min_backtest_folds)?;
        read_env("FORECAST_MAX_BACKTEST_FOLDS", &mut config.max_backtest_folds)?;
        read_env("FORECAST_TOP_SERVICES", &mut config.top_services)?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every option is usable
    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast_horizon_days must be positive".to_string(),
            ));
        }
        if self.seasonal_period_days < 2 {
            return Err(ForecastError::InvalidParameter(
                "seasonal_period_days must be at least 2".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if self.backtest_window_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "backtest_window_days must be positive".to_string(),
            ));
        }
        if self.min_backtest_folds == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_backtest_folds must be positive".to_string(),
            ));
        }
        if self.max_backtest_folds < self.min_backtest_folds {
            return Err(ForecastError::InvalidParameter(format!(
                "max_backtest_folds ({}) must not be below min_backtest_folds ({})",
                self.max_backtest_folds, self.min_backtest_folds
            )));
        }
        Ok(())
    }

    /// Set the forecast horizon
    pub fn with_horizon(mut self, days: usize) -> Self {
        self.forecast_horizon_days = days;
        self
    }

    /// Set the seasonal period
    pub fn with_seasonal_period(mut self, days: usize) -> Self {
        self.seasonal_period_days = days;
        self
    }

    /// Set the interval confidence level
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the backtest window
    pub fn with_backtest_window(mut self, days: usize) -> Self {
        self.backtest_window_days = days;
        self
    }

    /// Set the number of services forecast individually
    pub fn with_top_services(mut self, count: usize) -> Self {
        self.top_services = count;
        self
    }

    /// Enable or disable the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

fn read_env<T: FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(raw) = env::var(key) {
        *target = raw.trim().parse().map_err(|_| {
            ForecastError::InvalidParameter(format!("{} has an invalid value: {:?}", key, raw))
        })?;
    }
    Ok(())
}
