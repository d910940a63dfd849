//! Additive Holt-Winters model with grid-searched smoothing parameters

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use forecast_math::smoothing::HoltWinters;
use forecast_math::stats::z_score;

const ALPHA_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const BETA_GRID: [f64; 5] = [0.01, 0.05, 0.1, 0.2, 0.3];
const GAMMA_GRID: [f64; 5] = [0.05, 0.1, 0.2, 0.3, 0.5];

/// Parameters used when the history is too short to tune them
const DEFAULT_PARAMETERS: (f64, f64, f64) = (0.3, 0.1, 0.1);

/// Holt-Winters triple exponential smoothing
///
/// Needs two full seasons. From three seasons on, alpha, beta and gamma are
/// chosen by minimising the in-sample one-step-ahead squared error.
#[derive(Debug, Clone)]
pub struct HoltWintersModel {
    period: usize,
}

/// Trained Holt-Winters model
#[derive(Debug, Clone)]
pub struct TrainedHoltWinters {
    smoother: HoltWinters,
}

impl HoltWintersModel {
    /// Create a model for the given seasonal period
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 2".to_string(),
            ));
        }
        Ok(Self { period })
    }

    fn tune(&self, values: &[f64]) -> Result<HoltWinters> {
        let mut best: Option<HoltWinters> = None;

        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                for &gamma in &GAMMA_GRID {
                    let candidate = match HoltWinters::fit(alpha, beta, gamma, self.period, values)
                    {
                        Ok(fit) if fit.sse().is_finite() => fit,
                        _ => continue,
                    };
                    if best.as_ref().map_or(true, |b| candidate.sse() < b.sse()) {
                        best = Some(candidate);
                    }
                }
            }
        }

        best.ok_or_else(|| {
            ForecastError::ModelFailure("No Holt-Winters parameters converged".to_string())
        })
    }
}

impl ForecastModel for HoltWintersModel {
    type Trained = TrainedHoltWinters;

    fn train(&self, values: &[f64]) -> Result<Self::Trained> {
        self.check_history(values)?;

        let smoother = if values.len() >= 3 * self.period {
            self.tune(values)?
        } else {
            let (alpha, beta, gamma) = DEFAULT_PARAMETERS;
            HoltWinters::fit(alpha, beta, gamma, self.period, values)?
        };

        let (alpha, beta, gamma) = smoother.parameters();
        log::debug!(
            "Holt-Winters fitted alpha={} beta={} gamma={} sse={:.4}",
            alpha,
            beta,
            gamma,
            smoother.sse()
        );

        Ok(TrainedHoltWinters { smoother })
    }

    fn min_history(&self) -> usize {
        2 * self.period
    }

    fn kind(&self) -> ModelKind {
        ModelKind::HoltWinters
    }
}

impl TrainedHoltWinters {
    /// Smoothing parameters `(alpha, beta, gamma)` in use
    pub fn parameters(&self) -> (f64, f64, f64) {
        self.smoother.parameters()
    }

    /// In-sample one-step-ahead RMSE
    pub fn residual_std(&self) -> f64 {
        self.smoother.residual_std()
    }
}

impl TrainedForecastModel for TrainedHoltWinters {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<ForecastResult> {
        let sigma = self.smoother.residual_std();

        let mut values = Vec::with_capacity(horizon);
        let mut std_errors = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            values.push(self.smoother.forecast(h)?);
            std_errors.push(sigma * self.smoother.variance_multiplier(h).sqrt());
        }

        ForecastResult::from_std_errors(values, &std_errors, z_score(confidence_level)?)
    }
}
