//! Classical additive seasonal decomposition with linear trend extrapolation

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use forecast_math::moving_averages::centered_moving_average;
use forecast_math::regression::PolynomialFit;
use forecast_math::stats::{sample_std_dev, z_score};

/// Seasonal decomposition model
///
/// Splits the history into a centered moving average trend, a seasonal
/// offset per position in the cycle (day of week for a 7-day period) and a
/// residual. Forecasts extend the trend linearly and add back the offset.
#[derive(Debug, Clone)]
pub struct SeasonalDecompositionModel {
    period: usize,
}

/// Trained seasonal decomposition
#[derive(Debug, Clone)]
pub struct TrainedSeasonalDecomposition {
    period: usize,
    observations: usize,
    trend: PolynomialFit,
    seasonals: Vec<f64>,
    residual_std: f64,
}

impl SeasonalDecompositionModel {
    /// Create a decomposition for the given seasonal period
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }
        Ok(Self { period })
    }
}

impl ForecastModel for SeasonalDecompositionModel {
    type Trained = TrainedSeasonalDecomposition;

    fn train(&self, values: &[f64]) -> Result<Self::Trained> {
        self.check_history(values)?;
        let m = self.period;

        let trend = centered_moving_average(values, m)?;
        let defined: Vec<(usize, f64)> = trend
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, t)))
            .collect();

        // Average detrended value per position in the cycle
        let mut sums = vec![0.0; m];
        let mut counts = vec![0usize; m];
        for &(i, t) in &defined {
            sums[i % m] += values[i] - t;
            counts[i % m] += 1;
        }
        if counts.iter().any(|&c| c == 0) {
            return Err(ForecastError::ModelFailure(
                "Not every seasonal position has a detrended observation".to_string(),
            ));
        }
        let mut seasonals: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| s / c as f64)
            .collect();
        let offset = seasonals.iter().sum::<f64>() / m as f64;
        for seasonal in seasonals.iter_mut() {
            *seasonal -= offset;
        }

        let x: Vec<f64> = defined.iter().map(|&(i, _)| i as f64).collect();
        let y: Vec<f64> = defined.iter().map(|&(_, t)| t).collect();
        let trend_fit = PolynomialFit::fit(&x, &y, 1)?;

        let residuals: Vec<f64> = defined
            .iter()
            .map(|&(i, t)| values[i] - t - seasonals[i % m])
            .collect();

        Ok(TrainedSeasonalDecomposition {
            period: m,
            observations: values.len(),
            trend: trend_fit,
            seasonals,
            residual_std: sample_std_dev(&residuals)?,
        })
    }

    fn min_history(&self) -> usize {
        3 * self.period
    }

    fn kind(&self) -> ModelKind {
        ModelKind::SeasonalDecomposition
    }
}

impl TrainedSeasonalDecomposition {
    /// Seasonal offset per position in the cycle, summing to zero
    pub fn seasonals(&self) -> &[f64] {
        &self.seasonals
    }

    /// Standard deviation of the residual component
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

impl TrainedForecastModel for TrainedSeasonalDecomposition {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        let values: Vec<f64> = (0..horizon)
            .map(|h| {
                let index = self.observations + h;
                self.trend.predict(index as f64) + self.seasonals[index % self.period]
            })
            .collect();

        let std_errors: Vec<f64> = (1..=horizon)
            .map(|h| self.residual_std * (h as f64).sqrt())
            .collect();

        ForecastResult::from_std_errors(values, &std_errors, z_score(confidence_level)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(days: usize) -> Vec<f64> {
        (0..days)
            .map(|i| if i % 7 < 5 { 100.0 } else { 50.0 })
            .collect()
    }

    #[test]
    fn test_recovers_weekly_offsets() {
        let trained = SeasonalDecompositionModel::new(7)
            .unwrap()
            .train(&weekly(28))
            .unwrap();

        let seasonals = trained.seasonals();
        assert!((seasonals[0] - (100.0 - 600.0 / 7.0)).abs() < 1e-9);
        assert!((seasonals[6] - (50.0 - 600.0 / 7.0)).abs() < 1e-9);
        assert!(seasonals.iter().sum::<f64>().abs() < 1e-9);
        assert!(trained.residual_std() < 1e-9);
    }

    #[test]
    fn test_forecast_continues_pattern() {
        let trained = SeasonalDecompositionModel::new(7)
            .unwrap()
            .train(&weekly(21))
            .unwrap();
        let forecast = trained.forecast(7, 0.95).unwrap();

        // Day 21 is position 0 of the cycle
        for (h, value) in forecast.values().iter().enumerate() {
            let expected = if h % 7 < 5 { 100.0 } else { 50.0 };
            assert!((value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_requires_three_periods() {
        let model = SeasonalDecompositionModel::new(7).unwrap();
        assert!(matches!(
            model.train(&weekly(20)),
            Err(ForecastError::InsufficientData { required: 21, actual: 20 })
        ));
    }
}
