//! Metrics for evaluating forecast accuracy on held-out days

use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predictions within this distance of zero count as zero
const ZERO_TOLERANCE: f64 = 1e-9;

/// Metrics of a single walk-forward fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    /// Number of training days before the held-out window
    pub cutoff: usize,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Fraction of day-over-day moves with the correct sign
    pub directional_accuracy: f64,
    /// Fraction of actuals inside the interval
    pub ci_coverage: f64,
    /// Held-out days compared
    pub days: usize,
}

/// One fold's predictions alongside what actually happened
#[derive(Debug, Clone, Copy)]
pub struct FoldObservation<'a> {
    pub cutoff: usize,
    /// Last actual before the held-out window, anchoring the first move
    pub last_actual: f64,
    pub actual: &'a [f64],
    pub predicted: &'a [f64],
    pub intervals: &'a [(f64, f64)],
}

/// Running sums pooled over days, used for a fold and for a whole backtest
#[derive(Debug, Clone, Default)]
struct ErrorTally {
    days: usize,
    abs_error: f64,
    sq_error: f64,
    pct_error: f64,
    pct_days: usize,
    direction_hits: usize,
    direction_days: usize,
    covered: usize,
}

impl ErrorTally {
    fn add(&mut self, obs: &FoldObservation<'_>) {
        let mut previous_actual = obs.last_actual;
        let mut previous_predicted = obs.last_actual;

        for ((&actual, &predicted), &(lower, upper)) in
            obs.actual.iter().zip(obs.predicted).zip(obs.intervals)
        {
            let error = actual - predicted;
            self.days += 1;
            self.abs_error += error.abs();
            self.sq_error += error * error;

            // Zero actuals only count when the prediction is also zero
            if actual.abs() > ZERO_TOLERANCE {
                self.pct_error += (error / actual).abs();
                self.pct_days += 1;
            } else if predicted.abs() <= ZERO_TOLERANCE {
                self.pct_days += 1;
            }

            let actual_move = direction(actual - previous_actual);
            let predicted_move = direction(predicted - previous_predicted);
            if actual_move == predicted_move {
                self.direction_hits += 1;
            }
            self.direction_days += 1;
            previous_actual = actual;
            previous_predicted = predicted;

            let slack = 1e-9 * actual.abs().max(1.0);
            if actual >= lower - slack && actual <= upper + slack {
                self.covered += 1;
            }
        }
    }

    fn mape(&self) -> f64 {
        if self.pct_days == 0 {
            return f64::INFINITY;
        }
        self.pct_error / self.pct_days as f64 * 100.0
    }

    fn rmse(&self) -> f64 {
        (self.sq_error / self.days as f64).sqrt()
    }

    fn mae(&self) -> f64 {
        self.abs_error / self.days as f64
    }

    fn directional_accuracy(&self) -> f64 {
        self.direction_hits as f64 / self.direction_days as f64
    }

    fn coverage(&self) -> f64 {
        self.covered as f64 / self.days as f64
    }
}

fn direction(delta: f64) -> i8 {
    if delta > ZERO_TOLERANCE {
        1
    } else if delta < -ZERO_TOLERANCE {
        -1
    } else {
        0
    }
}

fn check_lengths(obs: &FoldObservation<'_>) -> Result<()> {
    if obs.actual.is_empty()
        || obs.actual.len() != obs.predicted.len()
        || obs.actual.len() != obs.intervals.len()
    {
        return Err(ForecastError::DataError(format!(
            "Fold at cutoff {} has mismatched lengths: {} actual, {} predicted, {} intervals",
            obs.cutoff,
            obs.actual.len(),
            obs.predicted.len(),
            obs.intervals.len()
        )));
    }
    Ok(())
}

/// Score one fold
pub fn evaluate_fold(obs: &FoldObservation<'_>) -> Result<FoldMetrics> {
    check_lengths(obs)?;

    let mut tally = ErrorTally::default();
    tally.add(obs);

    Ok(FoldMetrics {
        cutoff: obs.cutoff,
        mape: tally.mape(),
        rmse: tally.rmse(),
        mae: tally.mae(),
        directional_accuracy: tally.directional_accuracy(),
        ci_coverage: tally.coverage(),
        days: tally.days,
    })
}

/// Backtest accuracy of one model, pooled across every fold's predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracy {
    pub model: ModelKind,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Fraction of day-over-day moves with the correct sign
    pub directional_accuracy: f64,
    /// Fraction of actuals inside the interval
    pub ci_coverage: f64,
    pub fold_count: usize,
    pub folds: Vec<FoldMetrics>,
}

impl ModelAccuracy {
    /// Pool the observations of every fold into one accuracy entry
    ///
    /// Returns `None` when there are no folds.
    pub fn from_folds(
        model: ModelKind,
        observations: &[FoldObservation<'_>],
    ) -> Result<Option<Self>> {
        if observations.is_empty() {
            return Ok(None);
        }

        let mut pooled = ErrorTally::default();
        let mut folds = Vec::with_capacity(observations.len());
        for obs in observations {
            folds.push(evaluate_fold(obs)?);
            pooled.add(obs);
        }

        Ok(Some(Self {
            model,
            mape: pooled.mape(),
            rmse: pooled.rmse(),
            mae: pooled.mae(),
            directional_accuracy: pooled.directional_accuracy(),
            ci_coverage: pooled.coverage(),
            fold_count: folds.len(),
            folds,
        }))
    }

    /// Distance between empirical and nominal coverage
    pub fn coverage_gap(&self, confidence_level: f64) -> f64 {
        (self.ci_coverage - confidence_level).abs()
    }
}

impl fmt::Display for ModelAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} folds):", self.model, self.fold_count)?;
        writeln!(f, "  MAPE:      {:.4}%", self.mape)?;
        writeln!(f, "  RMSE:      {:.4}", self.rmse)?;
        writeln!(f, "  MAE:       {:.4}", self.mae)?;
        writeln!(f, "  Direction: {:.2}%", self.directional_accuracy * 100.0)?;
        writeln!(f, "  Coverage:  {:.2}%", self.ci_coverage * 100.0)?;
        Ok(())
    }
}
