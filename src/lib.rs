//! # Cost Forecast Workspace
//!
//! `cost_forecast_workspace` bundles the numeric primitives in
//! [`forecast_math`] with the forecasting engine in [`cost_forecast`].
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use cost_forecast_workspace::{DailySeries, ForecastConfig, ForecastEngine, ModelKind};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = DailySeries::new(start, vec![100.0; 30]).unwrap();
//!
//! let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
//! let forecast = engine.forecast_series(&series);
//! let forecast = forecast.forecast().unwrap();
//!
//! assert_eq!(forecast.model, ModelKind::WeightedMovingAverage);
//! assert_eq!(forecast.points.len(), 14);
//! ```

pub use cost_forecast;
pub use forecast_math;

pub use cost_forecast::{
    CostForecastReport, CostTable, DailySeries, ForecastConfig, ForecastEngine, ForecastError,
    ForecastOutcome, ModelKind, Result, SelectedForecast,
};

use std::path::Path;

/// Load a cost table and forecast it in one call.
///
/// # Examples
///
/// ```no_run
/// use cost_forecast_workspace::{forecast_csv, ForecastConfig};
///
/// let report = forecast_csv("costs.csv", ForecastConfig::default())?;
/// println!("{} services forecast", report.services.len());
/// # Ok::<(), cost_forecast_workspace::ForecastError>(())
/// ```
pub fn forecast_csv<P: AsRef<Path>>(path: P, config: ForecastConfig) -> Result<CostForecastReport> {
    let engine = ForecastEngine::new(config)?;
    let table = CostTable::from_csv(path)?;
    Ok(engine.forecast_costs(&table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let result = forecast_csv("does/not/exist.csv", ForecastConfig::default());
        assert!(matches!(result, Err(ForecastError::IoError(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected_first() {
        let config = ForecastConfig::default().with_confidence_level(1.5);
        let result = forecast_csv("does/not/exist.csv", config);
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }
}
