//! Forecast orchestration
//!
//! [`ForecastEngine`] gates a series on its length, runs every model over
//! the full history, backtests the feasible ones, ranks them and returns the
//! winner's full-horizon forecast. [`ForecastEngine::forecast_costs`] repeats
//! that for the aggregate cost and for each of the most expensive services.

use crate::backtest::Backtester;
use crate::config::ForecastConfig;
use crate::cost_table::CostTable;
use crate::error::Result;
use crate::metrics::ModelAccuracy;
use crate::models::{run_all_models, ForecastPoint, ModelKind, ModelResult, MIN_HISTORY_DAYS};
use crate::selection::{rank_models, ModelSelection, SelectionBasis};
use crate::series::DailySeries;
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The chosen model's forecast for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedForecast {
    pub model: ModelKind,
    pub basis: SelectionBasis,
    /// Backtest accuracy of the chosen model; absent for a fallback
    pub accuracy: Option<ModelAccuracy>,
    /// One point per forecast day, in date order
    pub points: Vec<ForecastPoint>,
    /// Full leaderboard behind the choice
    pub selection: ModelSelection,
}

/// Totals over the forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub days: usize,
    pub total: f64,
    pub lower_total: f64,
    pub upper_total: f64,
    pub mean_daily: f64,
}

impl SelectedForecast {
    /// Sum the points over the horizon
    pub fn summary(&self) -> ForecastSummary {
        let days = self.points.len();
        let total: f64 = self.points.iter().map(|p| p.value).sum();
        ForecastSummary {
            days,
            total,
            lower_total: self.points.iter().map(|p| p.lower).sum(),
            upper_total: self.points.iter().map(|p| p.upper).sum(),
            mean_daily: if days == 0 { 0.0 } else { total / days as f64 },
        }
    }

    /// The point `day` days ahead (1-based)
    pub fn checkpoint(&self, day: usize) -> Option<&ForecastPoint> {
        day.checked_sub(1).and_then(|i| self.points.get(i))
    }

    /// Projected total for the month the history ends in
    ///
    /// `history` must be the series this forecast was made from. Returns
    /// `None` when the history ends on the last day of a month, or when the
    /// forecast does not reach the month end.
    pub fn month_end_projection(&self, history: &DailySeries) -> Option<MonthProjection> {
        let last = history.last_date();
        let month_start = last.with_day(1)?;
        let month_end = last_day_of_month(last)?;
        let remaining_days = (month_end - last).num_days() as usize;
        if remaining_days == 0 {
            return None;
        }

        let first = self.points.first()?;
        if first.date != last.succ_opt()? || self.points.len() < remaining_days {
            return None;
        }

        let month_to_date: f64 = history
            .pairs()
            .into_iter()
            .filter(|(date, _)| *date >= month_start)
            .map(|(_, value)| value)
            .sum();
        let remaining = &self.points[..remaining_days];
        let forecast_remaining: f64 = remaining.iter().map(|p| p.value).sum();
        let lower_remaining: f64 = remaining.iter().map(|p| p.lower).sum();
        let upper_remaining: f64 = remaining.iter().map(|p| p.upper).sum();

        Some(MonthProjection {
            month_start,
            month_end,
            month_to_date,
            remaining_days,
            forecast_remaining,
            projected_total: month_to_date + forecast_remaining,
            projected_lower: month_to_date + lower_remaining,
            projected_upper: month_to_date + upper_remaining,
        })
    }
}

/// Actual spend so far this month plus the forecast for the rest of it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthProjection {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    /// Actual cost from the first of the month through the last history day
    pub month_to_date: f64,
    /// Days after the history up to and including the month end
    pub remaining_days: usize,
    pub forecast_remaining: f64,
    pub projected_total: f64,
    pub projected_lower: f64,
    pub projected_upper: f64,
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

/// Why no forecast could be produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Shorter than the smallest model minimum
    InsufficientHistory { required: usize, actual: usize },
    /// Every model failed
    NoFeasibleModel,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::InsufficientHistory { required, actual } => write!(
                f,
                "at least {} days of history are needed, {} available",
                required, actual
            ),
            UnavailableReason::NoFeasibleModel => f.write_str("no model produced a forecast"),
        }
    }
}

/// Result of forecasting one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Available(SelectedForecast),
    Unavailable { reason: UnavailableReason },
}

impl ForecastOutcome {
    /// The forecast, when one was produced
    pub fn forecast(&self) -> Option<&SelectedForecast> {
        match self {
            ForecastOutcome::Available(forecast) => Some(forecast),
            ForecastOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ForecastOutcome::Available(_))
    }
}

/// Forecast for one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceForecast {
    pub service: String,
    /// Historical cost over the whole table
    pub historical_total: f64,
    pub outcome: ForecastOutcome,
}

/// Aggregate and per-service forecasts for a cost table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostForecastReport {
    pub history_start: NaiveDate,
    pub history_end: NaiveDate,
    pub total: ForecastOutcome,
    /// Most expensive services first
    pub services: Vec<ServiceForecast>,
}

impl CostForecastReport {
    /// Forecast for a service by name
    pub fn service(&self, name: &str) -> Option<&ForecastOutcome> {
        self.services
            .iter()
            .find(|s| s.service == name)
            .map(|s| &s.outcome)
    }
}

/// Selects and runs the best model per series
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: ForecastConfig,
    backtester: Backtester,
}

impl ForecastEngine {
    /// Create an engine, rejecting an invalid configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backtester: Backtester::new(config.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast one series with the best backtested model
    pub fn forecast_series(&self, series: &DailySeries) -> ForecastOutcome {
        if series.len() < MIN_HISTORY_DAYS {
            log::warn!(
                "Forecast unavailable: {} days of history, {} needed",
                series.len(),
                MIN_HISTORY_DAYS
            );
            return ForecastOutcome::Unavailable {
                reason: UnavailableReason::InsufficientHistory {
                    required: MIN_HISTORY_DAYS,
                    actual: series.len(),
                },
            };
        }

        let results = run_all_models(series, &self.config);
        let feasible: Vec<ModelKind> = results
            .iter()
            .filter(|r| r.is_feasible())
            .map(|r| r.model)
            .collect();

        let report = self.backtester.evaluate(series, &feasible);
        let selection = rank_models(&results, &report, &self.config);

        if let Some(winner) = selection.winner() {
            let model = winner.accuracy.model;
            let accuracy = winner.accuracy.clone();
            log::info!(
                "Selected {} (MAPE {:.2}%, {} folds)",
                model,
                accuracy.mape,
                accuracy.fold_count
            );
            return match points_for(&results, model) {
                Some(points) => ForecastOutcome::Available(SelectedForecast {
                    model,
                    basis: SelectionBasis::Backtested,
                    accuracy: Some(accuracy),
                    points,
                    selection,
                }),
                None => ForecastOutcome::Unavailable {
                    reason: UnavailableReason::NoFeasibleModel,
                },
            };
        }

        // Nothing could be scored; take the most parsimonious feasible model
        match results.iter().find_map(|r| r.points().map(|p| (r.model, p.to_vec()))) {
            Some((model, points)) => {
                log::warn!(
                    "No model could be backtested on {} days; falling back to {}",
                    series.len(),
                    model
                );
                ForecastOutcome::Available(SelectedForecast {
                    model,
                    basis: SelectionBasis::Fallback,
                    accuracy: None,
                    points,
                    selection,
                })
            }
            None => {
                log::warn!("No model produced a forecast");
                ForecastOutcome::Unavailable {
                    reason: UnavailableReason::NoFeasibleModel,
                }
            }
        }
    }

    /// Forecast the aggregate cost and the top services
    pub fn forecast_costs(&self, table: &CostTable) -> CostForecastReport {
        let total_series = table.total_series();
        log::info!("Forecasting total cost");
        let total = self.forecast_series(total_series);

        let top = table.top_services(self.config.top_services);
        let run = |(name, historical_total): &(String, f64)| {
            let outcome = match table.service_series(name) {
                Some(series) => {
                    log::info!("Forecasting service {}", name);
                    self.forecast_series(series)
                }
                None => ForecastOutcome::Unavailable {
                    reason: UnavailableReason::NoFeasibleModel,
                },
            };
            ServiceForecast {
                service: name.clone(),
                historical_total: *historical_total,
                outcome,
            }
        };

        let services: Vec<ServiceForecast> = if self.config.parallel {
            top.par_iter().map(run).collect()
        } else {
            top.iter().map(run).collect()
        };

        CostForecastReport {
            history_start: total_series.start_date(),
            history_end: total_series.last_date(),
            total,
            services,
        }
    }
}

fn points_for(results: &[ModelResult], model: ModelKind) -> Option<Vec<ForecastPoint>> {
    results
        .iter()
        .find(|r| r.model == model)
        .and_then(|r| r.points())
        .map(<[ForecastPoint]>::to_vec)
}
