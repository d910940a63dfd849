//! # Cost Forecast
//!
//! Daily cloud spend forecasting with backtest-driven model selection.
//!
//! ## Features
//!
//! - Four competing models: Weighted Moving Average, Polynomial Trend,
//!   Seasonal Decomposition and additive Holt-Winters
//! - Walk-forward backtesting with MAPE, RMSE, MAE, directional accuracy and
//!   interval coverage
//! - Deterministic ranking and selection per series, with a fallback for
//!   histories too short to backtest
//! - Aggregate and per-service forecasts from a daily cost table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cost_forecast::{CostTable, ForecastConfig, ForecastEngine};
//!
//! let table = CostTable::from_csv("costs.csv")?;
//! let engine = ForecastEngine::new(ForecastConfig::default())?;
//!
//! let report = engine.forecast_costs(&table);
//! if let Some(forecast) = report.total.forecast() {
//!     println!("{} over 14 days: {:.2}", forecast.model, forecast.summary().total);
//! }
//! # Ok::<(), cost_forecast::ForecastError>(())
//! ```

pub mod backtest;
pub mod config;
pub mod cost_table;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod selection;
pub mod series;

// Re-export commonly used types
pub use crate::backtest::{AccuracyReport, Backtester};
pub use crate::config::ForecastConfig;
pub use crate::cost_table::CostTable;
pub use crate::engine::{
    CostForecastReport, ForecastEngine, ForecastOutcome, ForecastSummary, MonthProjection,
    SelectedForecast, ServiceForecast, UnavailableReason,
};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{FoldMetrics, ModelAccuracy};
pub use crate::models::{ForecastModel, ForecastPoint, ForecastResult, ModelKind, ModelResult};
pub use crate::selection::{ModelSelection, SelectionBasis};
pub use crate::series::DailySeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
