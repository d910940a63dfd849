//! Forecasting models for daily cost series
//!
//! Every model follows the same contract: train on a slice of history, then
//! forecast a fixed number of days with an interval around each point. The
//! closed set of models is [`ModelKind`]; [`run_model`] turns a model run into
//! a [`ModelResult`] that is either feasible or carries the reason it is not.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::series::DailySeries;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

pub mod holt_winters;
pub mod polynomial_trend;
pub mod seasonal_decomposition;
pub mod weighted_moving_average;

use holt_winters::HoltWintersModel;
use polynomial_trend::PolynomialTrendModel;
use seasonal_decomposition::SeasonalDecompositionModel;
use weighted_moving_average::WeightedMovingAverageModel;

/// Minimum history for the polynomial trend, and the overall forecasting floor
pub const MIN_HISTORY_DAYS: usize = 7;

/// Forecast result containing predicted values and raw intervals
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Interval bounds per forecasted value
    intervals: Vec<(f64, f64)>,
}

impl ForecastResult {
    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ModelFailure(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        if values.len() != intervals.len() {
            return Err(ForecastError::ModelFailure(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let finite = values.iter().all(|v| v.is_finite())
            && intervals.iter().all(|(l, u)| l.is_finite() && u.is_finite());
        if !finite {
            return Err(ForecastError::ModelFailure(
                "Forecast contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            values,
            horizons,
            intervals,
        })
    }

    /// Build intervals as `value ± critical * std_error`
    pub fn from_std_errors(
        values: Vec<f64>,
        std_errors: &[f64],
        critical_value: f64,
    ) -> Result<Self> {
        let horizons = values.len();
        let intervals = values
            .iter()
            .zip(std_errors)
            .map(|(v, se)| {
                let margin = critical_value * se.max(0.0);
                (v - margin, v + margin)
            })
            .collect();

        Self::new_with_intervals(values, horizons, intervals)
    }

    /// Clamp at zero since cost cannot be negative, keeping lower <= value <= upper
    pub fn clamp_non_negative(mut self) -> Self {
        for (value, (lower, upper)) in self.values.iter_mut().zip(self.intervals.iter_mut()) {
            *upper = upper.max(*value).max(0.0);
            *lower = lower.min(*value).max(0.0);
            *value = value.max(0.0);
        }
        self
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the interval bounds
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods with intervals at `confidence_level`
    fn forecast(&self, horizons: usize, confidence_level: f64) -> Result<ForecastResult>;
}

/// Forecast model that can be trained on a daily history
pub trait ForecastModel: Debug {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the history
    fn train(&self, values: &[f64]) -> Result<Self::Trained>;

    /// Fewest days of history the model accepts
    fn min_history(&self) -> usize;

    /// Which model this is
    fn kind(&self) -> ModelKind;

    /// Fail with `InsufficientData` when `values` is shorter than `min_history`
    fn check_history(&self, values: &[f64]) -> Result<()> {
        if values.len() < self.min_history() {
            return Err(ForecastError::InsufficientData {
                required: self.min_history(),
                actual: values.len(),
            });
        }
        Ok(())
    }
}

/// The competing forecasting models
///
/// Declaration order is parsimony order, simplest first; it is the final
/// tie-break when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    WeightedMovingAverage,
    PolynomialTrend,
    SeasonalDecomposition,
    HoltWinters,
}

impl ModelKind {
    /// Every model, in parsimony order
    pub const ALL: [ModelKind; 4] = [
        ModelKind::WeightedMovingAverage,
        ModelKind::PolynomialTrend,
        ModelKind::SeasonalDecomposition,
        ModelKind::HoltWinters,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::WeightedMovingAverage => "Weighted Moving Average",
            ModelKind::PolynomialTrend => "Polynomial Trend",
            ModelKind::SeasonalDecomposition => "Seasonal Decomposition",
            ModelKind::HoltWinters => "Holt-Winters",
        }
    }

    /// Fewest days of history the model accepts for a seasonal period
    pub fn min_history(&self, seasonal_period: usize) -> usize {
        match self {
            ModelKind::WeightedMovingAverage => seasonal_period,
            ModelKind::PolynomialTrend => MIN_HISTORY_DAYS,
            ModelKind::SeasonalDecomposition => 3 * seasonal_period,
            ModelKind::HoltWinters => 2 * seasonal_period,
        }
    }

    /// Train on `values` and forecast `horizon` days, intervals clamped at zero
    pub fn forecast_values(
        &self,
        values: &[f64],
        horizon: usize,
        config: &ForecastConfig,
    ) -> Result<ForecastResult> {
        let period = config.seasonal_period_days;
        let confidence = config.confidence_level;

        let result = match self {
            ModelKind::WeightedMovingAverage => {
                run_trained(&WeightedMovingAverageModel::new(period)?, values, horizon, confidence)
            }
            ModelKind::PolynomialTrend => {
                run_trained(&PolynomialTrendModel::default(), values, horizon, confidence)
            }
            ModelKind::SeasonalDecomposition => {
                run_trained(&SeasonalDecompositionModel::new(period)?, values, horizon, confidence)
            }
            ModelKind::HoltWinters => {
                run_trained(&HoltWintersModel::new(period)?, values, horizon, confidence)
            }
        }?;

        if result.horizons() != horizon {
            return Err(ForecastError::ModelFailure(format!(
                "{} produced {} of {} forecast days",
                self.name(),
                result.horizons(),
                horizon
            )));
        }

        Ok(result.clamp_non_negative())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn run_trained<M: ForecastModel>(
    model: &M,
    values: &[f64],
    horizon: usize,
    confidence_level: f64,
) -> Result<ForecastResult> {
    model.check_history(values)?;
    model.train(values)?.forecast(horizon, confidence_level)
}

/// A dated point forecast with its interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Why a model declined to forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfeasibleReason {
    /// History shorter than the model's minimum
    InsufficientHistory { required: usize, actual: usize },
    /// Fitting or forecasting failed numerically
    NumericalFailure { message: String },
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibleReason::InsufficientHistory { required, actual } => {
                write!(f, "needs {} days of history, has {}", required, actual)
            }
            InfeasibleReason::NumericalFailure { message } => {
                write!(f, "numerical failure: {}", message)
            }
        }
    }
}

impl From<ForecastError> for InfeasibleReason {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InsufficientData { required, actual } => {
                InfeasibleReason::InsufficientHistory { required, actual }
            }
            other => InfeasibleReason::NumericalFailure {
                message: other.to_string(),
            },
        }
    }
}

/// Outcome of one model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Feasible { points: Vec<ForecastPoint> },
    Infeasible { reason: InfeasibleReason },
}

/// A model's full-horizon forecast attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: ModelKind,
    pub outcome: ModelOutcome,
}

impl ModelResult {
    /// Whether the model produced the full horizon
    pub fn is_feasible(&self) -> bool {
        matches!(self.outcome, ModelOutcome::Feasible { .. })
    }

    /// Forecast points when feasible
    pub fn points(&self) -> Option<&[ForecastPoint]> {
        match &self.outcome {
            ModelOutcome::Feasible { points } => Some(points),
            ModelOutcome::Infeasible { .. } => None,
        }
    }

    /// Reason when infeasible
    pub fn infeasible_reason(&self) -> Option<&InfeasibleReason> {
        match &self.outcome {
            ModelOutcome::Feasible { .. } => None,
            ModelOutcome::Infeasible { reason } => Some(reason),
        }
    }
}

/// Run one model over the whole series for the configured horizon
///
/// Never fails: short history and numerical problems come back as an
/// infeasible result.
pub fn run_model(model: ModelKind, series: &DailySeries, config: &ForecastConfig) -> ModelResult {
    let horizon = config.forecast_horizon_days;

    let outcome = match model.forecast_values(series.values(), horizon, config) {
        Ok(result) => {
            let points = series
                .future_dates(horizon)
                .into_iter()
                .zip(result.values().iter().zip(result.intervals()))
                .map(|(date, (&value, &(lower, upper)))| ForecastPoint {
                    date,
                    value,
                    lower,
                    upper,
                })
                .collect();
            log::debug!("{} forecast {} days", model, horizon);
            ModelOutcome::Feasible { points }
        }
        Err(err) => {
            let reason = InfeasibleReason::from(err);
            match &reason {
                InfeasibleReason::NumericalFailure { .. } => {
                    log::warn!("{} failed: {}", model, reason)
                }
                InfeasibleReason::InsufficientHistory { .. } => {
                    log::debug!("{} infeasible: {}", model, reason)
                }
            }
            ModelOutcome::Infeasible { reason }
        }
    };

    ModelResult { model, outcome }
}

/// Run every model over the series, in [`ModelKind::ALL`] order
pub fn run_all_models(series: &DailySeries, config: &ForecastConfig) -> Vec<ModelResult> {
    let run = |&model: &ModelKind| run_model(model, series, config);
    if config.parallel {
        ModelKind::ALL.par_iter().map(run).collect()
    } else {
        ModelKind::ALL.iter().map(run).collect()
    }
}
