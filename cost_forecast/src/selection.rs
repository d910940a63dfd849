//! Ranking of backtested models

use crate::backtest::AccuracyReport;
use crate::config::ForecastConfig;
use crate::metrics::ModelAccuracy;
use crate::models::{InfeasibleReason, ModelKind, ModelResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Metrics are compared at this resolution so near-equal values tie
const METRIC_RESOLUTION: f64 = 1e-9;

/// How the selected model was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBasis {
    /// Best backtest ranking
    Backtested,
    /// No model could be backtested; the first feasible model was used
    Fallback,
}

/// A candidate in the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedModel {
    /// 1-based position
    pub rank: usize,
    /// Fewer folds than `min_backtest_folds`
    pub demoted: bool,
    pub accuracy: ModelAccuracy,
}

/// Why a model did not enter the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// No full-horizon forecast
    Infeasible { reason: InfeasibleReason },
    /// Forecast available but nothing to score it on
    NoBacktestFolds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedModel {
    pub model: ModelKind,
    pub reason: ExclusionReason,
}

/// Ranked candidates, best first, and the models left out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub ranked: Vec<RankedModel>,
    pub excluded: Vec<ExcludedModel>,
}

impl ModelSelection {
    /// Top-ranked model
    pub fn winner(&self) -> Option<&RankedModel> {
        self.ranked.first()
    }

    /// Whether a model was excluded
    pub fn is_excluded(&self, model: ModelKind) -> bool {
        self.excluded.iter().any(|e| e.model == model)
    }
}

fn quantise(value: f64) -> f64 {
    (value / METRIC_RESOLUTION).round()
}

fn compare_candidates(
    a: &RankedModel,
    b: &RankedModel,
    confidence_level: f64,
) -> Ordering {
    let (x, y) = (&a.accuracy, &b.accuracy);
    a.demoted
        .cmp(&b.demoted)
        .then_with(|| quantise(x.mape).total_cmp(&quantise(y.mape)))
        .then_with(|| quantise(x.rmse).total_cmp(&quantise(y.rmse)))
        .then_with(|| {
            quantise(x.coverage_gap(confidence_level))
                .total_cmp(&quantise(y.coverage_gap(confidence_level)))
        })
        .then_with(|| x.model.cmp(&y.model))
}

/// Rank the feasible models that have backtest folds
///
/// Order: models with at least `min_backtest_folds` folds ahead of the
/// rest, then lower MAPE, lower RMSE, coverage closer to the confidence
/// level, and finally the simpler model.
pub fn rank_models(
    results: &[ModelResult],
    report: &AccuracyReport,
    config: &ForecastConfig,
) -> ModelSelection {
    let mut selection = ModelSelection::default();

    for result in results {
        if let Some(reason) = result.infeasible_reason() {
            selection.excluded.push(ExcludedModel {
                model: result.model,
                reason: ExclusionReason::Infeasible {
                    reason: reason.clone(),
                },
            });
            continue;
        }

        match report.get(result.model) {
            Some(accuracy) => selection.ranked.push(RankedModel {
                rank: 0,
                demoted: accuracy.fold_count < config.min_backtest_folds,
                accuracy: accuracy.clone(),
            }),
            None => selection.excluded.push(ExcludedModel {
                model: result.model,
                reason: ExclusionReason::NoBacktestFolds,
            }),
        }
    }

    selection
        .ranked
        .sort_by(|a, b| compare_candidates(a, b, config.confidence_level));
    for (i, candidate) in selection.ranked.iter_mut().enumerate() {
        candidate.rank = i + 1;
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelOutcome;
    use std::collections::BTreeMap;

    fn feasible(model: ModelKind) -> ModelResult {
        ModelResult {
            model,
            outcome: ModelOutcome::Feasible { points: Vec::new() },
        }
    }

    fn accuracy(model: ModelKind, mape: f64, rmse: f64, coverage: f64, folds: usize) -> ModelAccuracy {
        ModelAccuracy {
            model,
            mape,
            rmse,
            mae: rmse,
            directional_accuracy: 0.5,
            ci_coverage: coverage,
            fold_count: folds,
            folds: Vec::new(),
        }
    }

    fn report(entries: Vec<ModelAccuracy>) -> AccuracyReport {
        AccuracyReport {
            entries: entries.into_iter().map(|a| (a.model, a)).collect::<BTreeMap<_, _>>(),
        }
    }

    fn order(selection: &ModelSelection) -> Vec<ModelKind> {
        selection.ranked.iter().map(|r| r.accuracy.model).collect()
    }

    #[test]
    fn test_mape_then_rmse_then_coverage() {
        let results: Vec<ModelResult> = ModelKind::ALL.iter().map(|&m| feasible(m)).collect();
        let report = report(vec![
            accuracy(ModelKind::WeightedMovingAverage, 5.0, 3.0, 0.95, 5),
            accuracy(ModelKind::PolynomialTrend, 4.0, 9.0, 0.5, 5),
            accuracy(ModelKind::SeasonalDecomposition, 5.0, 2.0, 0.95, 5),
            accuracy(ModelKind::HoltWinters, 5.0, 2.0, 0.90, 5),
        ]);

        let selection = rank_models(&results, &report, &ForecastConfig::default());
        assert_eq!(
            order(&selection),
            vec![
                ModelKind::PolynomialTrend,
                ModelKind::SeasonalDecomposition,
                ModelKind::HoltWinters,
                ModelKind::WeightedMovingAverage,
            ]
        );
        assert_eq!(selection.ranked[0].rank, 1);
    }

    #[test]
    fn test_too_few_folds_are_demoted() {
        let results = vec![feasible(ModelKind::HoltWinters), feasible(ModelKind::SeasonalDecomposition)];
        let report = report(vec![
            accuracy(ModelKind::HoltWinters, 3.0, 1.0, 1.0, 8),
            accuracy(ModelKind::SeasonalDecomposition, 0.0, 0.0, 1.0, 1),
        ]);

        let selection = rank_models(&results, &report, &ForecastConfig::default());
        assert_eq!(selection.winner().unwrap().accuracy.model, ModelKind::HoltWinters);
        assert!(selection.ranked[1].demoted);
    }

    #[test]
    fn test_exact_ties_prefer_simpler_model() {
        let results: Vec<ModelResult> = ModelKind::ALL.iter().rev().map(|&m| feasible(m)).collect();
        let report = report(
            ModelKind::ALL
                .iter()
                .map(|&m| accuracy(m, 1e-12 * m as usize as f64, 0.0, 1.0, 9))
                .collect(),
        );

        let selection = rank_models(&results, &report, &ForecastConfig::default());
        assert_eq!(order(&selection), ModelKind::ALL.to_vec());
    }

    #[test]
    fn test_exclusions_are_recorded() {
        let results = vec![
            feasible(ModelKind::WeightedMovingAverage),
            ModelResult {
                model: ModelKind::HoltWinters,
                outcome: ModelOutcome::Infeasible {
                    reason: InfeasibleReason::InsufficientHistory {
                        required: 14,
                        actual: 10,
                    },
                },
            },
        ];

        let selection = rank_models(&results, &AccuracyReport::default(), &ForecastConfig::default());
        assert!(selection.ranked.is_empty());
        assert!(selection.is_excluded(ModelKind::HoltWinters));
        assert_eq!(
            selection.excluded[0].reason,
            ExclusionReason::NoBacktestFolds
        );
    }
}
