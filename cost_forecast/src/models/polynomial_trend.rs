//! Polynomial trend model for daily cost forecasting

use crate::error::{ForecastError, Result};
use crate::models::{
    ForecastModel, ForecastResult, ModelKind, TrainedForecastModel, MIN_HISTORY_DAYS,
};
use forecast_math::regression::PolynomialFit;
use forecast_math::stats::t_score;

/// Minimum days before a quadratic term is considered
pub const MIN_DAYS_FOR_QUADRATIC: usize = 10;

/// Relative drop in adjusted residual variance a higher degree must achieve
const DEGREE_IMPROVEMENT: f64 = 0.05;

/// Polynomial regression of cost against day index
///
/// Degrees `0..=max_degree` compete; a higher degree is kept only when it
/// lowers the residual variance, adjusted for its extra parameter, by at
/// least 5%. A constant history therefore stays at degree 0.
#[derive(Debug, Clone)]
pub struct PolynomialTrendModel {
    max_degree: usize,
}

/// Trained polynomial trend
#[derive(Debug, Clone)]
pub struct TrainedPolynomialTrend {
    fit: PolynomialFit,
    observations: usize,
}

impl PolynomialTrendModel {
    /// Create a model with degree capped at `max_degree` (at most 2)
    pub fn new(max_degree: usize) -> Result<Self> {
        if max_degree > 2 {
            return Err(ForecastError::InvalidParameter(
                "Polynomial degree is capped at 2".to_string(),
            ));
        }
        Ok(Self { max_degree })
    }

    /// Highest degree allowed for `n` observations
    fn degree_cap(&self, n: usize) -> usize {
        if n >= MIN_DAYS_FOR_QUADRATIC {
            self.max_degree
        } else {
            self.max_degree.min(1)
        }
    }
}

impl Default for PolynomialTrendModel {
    fn default() -> Self {
        Self { max_degree: 2 }
    }
}

impl ForecastModel for PolynomialTrendModel {
    type Trained = TrainedPolynomialTrend;

    fn train(&self, values: &[f64]) -> Result<Self::Trained> {
        self.check_history(values)?;

        // Variance differences below this are rounding noise
        let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let noise_floor = 1e-12 * (1.0 + scale * scale);

        let mut best: Option<PolynomialFit> = None;
        for degree in 0..=self.degree_cap(values.len()) {
            let candidate = match PolynomialFit::fit_indexed(values, degree) {
                Ok(fit) => fit,
                Err(err) => {
                    log::debug!("Degree {} trend skipped: {}", degree, err);
                    continue;
                }
            };

            best = match best {
                Some(current) => {
                    let current_var = current.adjusted_residual_variance();
                    let gain = current_var - candidate.adjusted_residual_variance();
                    if gain > current_var * DEGREE_IMPROVEMENT + noise_floor {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
                None => Some(candidate),
            };
        }

        let fit = best.ok_or_else(|| {
            ForecastError::ModelFailure("No polynomial degree could be fitted".to_string())
        })?;

        Ok(TrainedPolynomialTrend {
            fit,
            observations: values.len(),
        })
    }

    fn min_history(&self) -> usize {
        MIN_HISTORY_DAYS
    }

    fn kind(&self) -> ModelKind {
        ModelKind::PolynomialTrend
    }
}

impl TrainedPolynomialTrend {
    /// Selected degree
    pub fn degree(&self) -> usize {
        self.fit.degree()
    }

    /// Goodness of fit, `None` for a constant history
    pub fn r_squared(&self) -> Option<f64> {
        self.fit.r_squared()
    }
}

impl TrainedForecastModel for TrainedPolynomialTrend {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        let critical = t_score(confidence_level, self.fit.degrees_of_freedom())?;

        let future_x: Vec<f64> = (0..horizon)
            .map(|h| (self.observations + h) as f64)
            .collect();
        let values: Vec<f64> = future_x.iter().map(|&x| self.fit.predict(x)).collect();
        let std_errors: Vec<f64> = future_x
            .iter()
            .map(|&x| self.fit.prediction_std_error(x))
            .collect();

        ForecastResult::from_std_errors(values, &std_errors, critical)
    }
}
