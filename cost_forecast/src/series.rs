//! Daily cost series

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One non-negative cost value per consecutive calendar day
///
/// Construction validates the series: no gaps, no duplicate dates, finite
/// values, nothing negative. Once built it is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series starting at `start` with one value per day
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }

        for (offset, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Non-finite cost on {}",
                    start + Duration::days(offset as i64)
                )));
            }
            if *value < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Negative cost {} on {}",
                    value,
                    start + Duration::days(offset as i64)
                )));
            }
        }

        Ok(Self { start, values })
    }

    /// Create a series from `(date, value)` pairs in chronological order
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self> {
        let (start, _) = pairs.first().ok_or_else(|| {
            ForecastError::DataError("Empty time series data".to_string())
        })?;

        for window in pairs.windows(2) {
            let (previous, current) = (window[0].0, window[1].0);
            if current == previous {
                return Err(ForecastError::DataError(format!(
                    "Duplicate date {}",
                    current
                )));
            }
            if current != previous + Duration::days(1) {
                return Err(ForecastError::DataError(format!(
                    "Dates must be consecutive: {} follows {}",
                    current, previous
                )));
            }
        }

        Self::new(*start, pairs.iter().map(|(_, v)| *v).collect())
    }

    /// Cost values in date order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of days in the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty (never true for a constructed series)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First date
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last date
    pub fn last_date(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    /// Date of the observation at `index`
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// All dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.values.len()).map(|i| self.date_at(i)).collect()
    }

    /// `(date, value)` pairs in order
    pub fn pairs(&self) -> Vec<(NaiveDate, f64)> {
        self.dates().into_iter().zip(self.values.iter().copied()).collect()
    }

    /// The `horizon` dates following the last observation
    pub fn future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let last = self.last_date();
        (1..=horizon).map(|h| last + Duration::days(h as i64)).collect()
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}
