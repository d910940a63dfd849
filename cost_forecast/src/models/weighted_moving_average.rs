//! Weighted moving average model for daily cost forecasting

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use forecast_math::moving_averages::trailing_weighted_average;
use forecast_math::stats::{sample_std_dev, z_score};

/// Weighted Moving Average model
///
/// Forecasts a flat continuation at the decay-weighted average of the most
/// recent window (up to two seasonal periods), newest days weighted highest.
#[derive(Debug, Clone)]
pub struct WeightedMovingAverageModel {
    /// Seasonal period, also the minimum history
    period: usize,
    /// Largest trailing window considered
    max_window: usize,
}

/// Trained Weighted Moving Average model
#[derive(Debug, Clone)]
pub struct TrainedWeightedMovingAverage {
    /// Window actually used
    window: usize,
    /// Weighted average of the trailing window
    level: f64,
    /// Standard deviation of the trailing window
    window_std: f64,
}

impl WeightedMovingAverageModel {
    /// Create a new Weighted Moving Average model
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be positive".to_string(),
            ));
        }

        Ok(Self {
            period,
            max_window: 2 * period,
        })
    }
}

impl ForecastModel for WeightedMovingAverageModel {
    type Trained = TrainedWeightedMovingAverage;

    fn train(&self, values: &[f64]) -> Result<Self::Trained> {
        self.check_history(values)?;

        let window = self.max_window.min(values.len());
        let trailing = &values[values.len() - window..];

        Ok(TrainedWeightedMovingAverage {
            window,
            level: trailing_weighted_average(values, window)?,
            window_std: sample_std_dev(trailing)?,
        })
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn kind(&self) -> ModelKind {
        ModelKind::WeightedMovingAverage
    }
}

impl TrainedWeightedMovingAverage {
    /// Window actually used
    pub fn window(&self) -> usize {
        self.window
    }

    /// Forecast level
    pub fn level(&self) -> f64 {
        self.level
    }
}

impl TrainedForecastModel for TrainedWeightedMovingAverage {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        let values = vec![self.level; horizon];

        // Spread of the trailing window, accumulating with distance
        let std_errors: Vec<f64> = (1..=horizon)
            .map(|h| self.window_std * (h as f64).sqrt())
            .collect();

        ForecastResult::from_std_errors(values, &std_errors, z_score(confidence_level)?)
    }
}
