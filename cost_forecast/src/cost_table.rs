//! Daily cost table loading
//!
//! Reads the cleaned daily cost export: one row per day, a date column, a
//! `Total costs($)` column and one column per service whose header ends in
//! `($)`. The table must already be clean; gaps, duplicate dates and bad
//! values are rejected rather than repaired.

use crate::error::{ForecastError, Result};
use crate::series::DailySeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header of the aggregate cost column
pub const TOTAL_COLUMN: &str = "Total costs($)";

/// Suffix marking a cost column
pub const COST_SUFFIX: &str = "($)";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Aggregate and per-service daily cost series sharing one date range
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    total: DailySeries,
    services: BTreeMap<String, DailySeries>,
}

impl CostTable {
    /// Load a cost table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a cost table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let date_index = detect_date_column(&headers)?;
        let total_index = headers.iter().position(|h| h == TOTAL_COLUMN);
        let service_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != date_index && h.ends_with(COST_SUFFIX) && h.as_str() != TOTAL_COLUMN
            })
            .map(|(i, h)| (i, service_name(h)))
            .collect();

        if total_index.is_none() && service_columns.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No cost columns found; expected `{}` or columns ending in `{}`",
                TOTAL_COLUMN, COST_SUFFIX
            )));
        }

        let mut dates = Vec::new();
        let mut totals = Vec::new();
        let mut service_values: Vec<Vec<f64>> = vec![Vec::new(); service_columns.len()];

        for (row_number, record) in csv_reader.records().enumerate() {
            let record = record?;
            let line = row_number + 2;

            let raw_date = record.get(date_index).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|err| {
                ForecastError::DataError(format!(
                    "Line {}: bad date {:?}: {}",
                    line, raw_date, err
                ))
            })?;

            let mut row_sum = 0.0;
            for (slot, (index, name)) in service_columns.iter().enumerate() {
                let value = parse_cost(record.get(*index), name, line)?;
                row_sum += value;
                service_values[slot].push(value);
            }

            let total = match total_index {
                Some(index) => parse_cost(record.get(index), TOTAL_COLUMN, line)?,
                None => row_sum,
            };

            dates.push(date);
            totals.push(total);
        }

        let pairs: Vec<(NaiveDate, f64)> = dates.iter().copied().zip(totals).collect();
        let total = DailySeries::from_pairs(&pairs)?;

        let services = service_columns
            .into_iter()
            .zip(service_values)
            .map(|((_, name), values)| {
                DailySeries::new(total.start_date(), values).map(|series| (name, series))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        log::debug!(
            "Loaded {} days ({} to {}) with {} services",
            total.len(),
            total.start_date(),
            total.last_date(),
            services.len()
        );

        Ok(Self { total, services })
    }

    /// Build a table from series already in memory
    pub fn new(total: DailySeries, services: BTreeMap<String, DailySeries>) -> Result<Self> {
        for (name, series) in &services {
            if series.start_date() != total.start_date() || series.len() != total.len() {
                return Err(ForecastError::DataError(format!(
                    "Service {} does not cover the same dates as the total",
                    name
                )));
            }
        }
        Ok(Self { total, services })
    }

    /// Aggregate daily cost
    pub fn total_series(&self) -> &DailySeries {
        &self.total
    }

    /// Daily cost of one service
    pub fn service_series(&self, name: &str) -> Option<&DailySeries> {
        self.services.get(name)
    }

    /// Service names in alphabetical order
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Total cost per service over the whole table
    pub fn service_totals(&self) -> BTreeMap<String, f64> {
        self.services
            .iter()
            .map(|(name, series)| (name.clone(), series.total()))
            .collect()
    }

    /// The `n` most expensive services, highest total first, ties by name
    pub fn top_services(&self, n: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self.service_totals().into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

fn detect_date_column(headers: &[String]) -> Result<usize> {
    if let Some(index) = headers
        .iter()
        .position(|h| h.to_lowercase().contains("date"))
    {
        return Ok(index);
    }

    // Raw exports label the date column `Service`
    headers
        .iter()
        .position(|h| !h.ends_with(COST_SUFFIX))
        .ok_or_else(|| ForecastError::DataError("No date column found in data".to_string()))
}

/// `EC2-Instances($)` -> `EC2-Instances`
fn service_name(header: &str) -> String {
    header
        .strip_suffix(COST_SUFFIX)
        .unwrap_or(header)
        .trim()
        .to_string()
}

fn parse_cost(field: Option<&str>, column: &str, line: usize) -> Result<f64> {
    let raw = field.unwrap_or_default();
    let value: f64 = raw.parse().map_err(|_| {
        ForecastError::DataError(format!(
            "Line {}: non-numeric cost {:?} in {}",
            line, raw, column
        ))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ForecastError::DataError(format!(
            "Line {}: invalid cost {} in {}",
            line, value, column
        )));
    }
    Ok(value)
}
