//! Walk-forward backtesting of the forecasting models
//!
//! Each fold trains on the days before a cutoff and forecasts the next
//! window, which is then compared with what actually happened. Folds only
//! ever see a prefix of the series, so nothing after the cutoff leaks into
//! training.

use crate::config::ForecastConfig;
use crate::metrics::{FoldObservation, ModelAccuracy};
use crate::models::{ForecastResult, ModelKind, MIN_HISTORY_DAYS};
use crate::series::DailySeries;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Held-out days per fold for a series of `len` days
///
/// Shrinks the configured window so short series still leave enough
/// training data for the least demanding model: one seasonal period, or the
/// minimum history when the period is longer than that.
pub fn effective_window(len: usize, config: &ForecastConfig) -> usize {
    let training = config.seasonal_period_days.min(MIN_HISTORY_DAYS);
    config
        .backtest_window_days
        .min(len.saturating_sub(training))
}

/// Fold cutoffs (training lengths) for a model, oldest first
///
/// Cutoffs run one day apart from the model's minimum history to the last
/// point that leaves a full window to validate against; only the most
/// recent `max_backtest_folds` are kept.
pub fn fold_cutoffs(model: ModelKind, len: usize, config: &ForecastConfig) -> Vec<usize> {
    let window = effective_window(len, config);
    if window == 0 {
        return Vec::new();
    }

    let first = model.min_history(config.seasonal_period_days);
    let last = len - window;
    if first > last {
        return Vec::new();
    }

    let count = (last - first + 1).min(config.max_backtest_folds);
    (last + 1 - count..=last).collect()
}

/// Backtest one model over the series
///
/// Folds on which the model fails are skipped. Returns `None` when no fold
/// succeeded.
pub fn evaluate_model(
    model: ModelKind,
    series: &DailySeries,
    config: &ForecastConfig,
) -> Option<ModelAccuracy> {
    let values = series.values();
    let window = effective_window(values.len(), config);

    let runs: Vec<(usize, ForecastResult)> = fold_cutoffs(model, values.len(), config)
        .into_iter()
        .filter_map(|cutoff| {
            match model.forecast_values(&values[..cutoff], window, config) {
                Ok(result) => Some((cutoff, result)),
                Err(err) => {
                    log::debug!("{} fold at {} skipped: {}", model, cutoff, err);
                    None
                }
            }
        })
        .collect();

    let observations: Vec<FoldObservation<'_>> = runs
        .iter()
        .map(|&(cutoff, ref result)| FoldObservation {
            cutoff,
            last_actual: values[cutoff - 1],
            actual: &values[cutoff..cutoff + window],
            predicted: result.values(),
            intervals: result.intervals(),
        })
        .collect();

    match ModelAccuracy::from_folds(model, &observations) {
        Ok(accuracy) => {
            if let Some(accuracy) = &accuracy {
                log::debug!(
                    "{} backtested over {} folds: MAPE {:.3}%",
                    model,
                    accuracy.fold_count,
                    accuracy.mape
                );
            }
            accuracy
        }
        Err(err) => {
            log::warn!("{} backtest could not be scored: {}", model, err);
            None
        }
    }
}

/// Backtest accuracy per model; models without folds are absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub entries: BTreeMap<ModelKind, ModelAccuracy>,
}

impl AccuracyReport {
    /// Accuracy entry for a model
    pub fn get(&self, model: ModelKind) -> Option<&ModelAccuracy> {
        self.entries.get(&model)
    }

    /// Number of models with at least one fold
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in model order
    pub fn iter(&self) -> impl Iterator<Item = &ModelAccuracy> {
        self.entries.values()
    }
}

/// Runs walk-forward validation for every model
#[derive(Debug, Clone)]
pub struct Backtester {
    config: ForecastConfig,
}

impl Backtester {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Backtest the given models over the series
    pub fn evaluate(&self, series: &DailySeries, models: &[ModelKind]) -> AccuracyReport {
        let run = |&model: &ModelKind| evaluate_model(model, series, &self.config);

        let results: Vec<Option<ModelAccuracy>> = if self.config.parallel {
            models.par_iter().map(run).collect()
        } else {
            models.iter().map(run).collect()
        };

        AccuracyReport {
            entries: results
                .into_iter()
                .flatten()
                .map(|accuracy| (accuracy.model, accuracy))
                .collect(),
        }
    }

    /// Backtest every model over the series
    pub fn evaluate_all(&self, series: &DailySeries) -> AccuracyReport {
        self.evaluate(series, &ModelKind::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> DailySeries {
        DailySeries::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn test_window_shrinks_on_short_series() {
        let config = ForecastConfig::default();
        assert_eq!(effective_window(30, &config), 7);
        assert_eq!(effective_window(10, &config), 3);
        assert_eq!(effective_window(7, &config), 0);
    }

    #[test]
    fn test_window_with_long_period_leaves_trend_history() {
        let config = ForecastConfig::default().with_seasonal_period(10);
        assert_eq!(effective_window(9, &config), 2);
        assert_eq!(effective_window(30, &config), 7);
        assert_eq!(fold_cutoffs(ModelKind::PolynomialTrend, 9, &config), vec![7]);
        assert!(fold_cutoffs(ModelKind::WeightedMovingAverage, 9, &config).is_empty());

        let short = ForecastConfig::default().with_seasonal_period(3);
        assert_eq!(effective_window(8, &short), 5);
    }

    #[test]
    fn test_fold_cutoffs_respect_model_minimum() {
        let config = ForecastConfig::default();
        assert_eq!(
            fold_cutoffs(ModelKind::HoltWinters, 28, &config),
            (14..=21).collect::<Vec<_>>()
        );
        assert_eq!(fold_cutoffs(ModelKind::SeasonalDecomposition, 28, &config), vec![21]);
        assert!(fold_cutoffs(ModelKind::SeasonalDecomposition, 20, &config).is_empty());
    }

    #[test]
    fn test_fold_cutoffs_keep_most_recent() {
        let config = ForecastConfig::default();
        let cutoffs = fold_cutoffs(ModelKind::WeightedMovingAverage, 100, &config);
        assert_eq!(cutoffs.len(), 14);
        assert_eq!(cutoffs.last(), Some(&93));
        assert_eq!(cutoffs.first(), Some(&80));
    }

    #[test]
    fn test_constant_series_scores_zero_error() {
        let config = ForecastConfig::default().with_parallel(false);
        let report = Backtester::new(config).evaluate_all(&series(vec![100.0; 30]));

        assert_eq!(report.len(), 4);
        for accuracy in report.iter() {
            assert!(accuracy.mape < 1e-9, "{}", accuracy);
            assert_eq!(accuracy.ci_coverage, 1.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i % 7) as f64 * 3.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let data = series(values);

        let sequential = Backtester::new(ForecastConfig::default().with_parallel(false))
            .evaluate_all(&data);
        let parallel = Backtester::new(ForecastConfig::default()).evaluate_all(&data);
        assert_eq!(sequential, parallel);
    }
}
