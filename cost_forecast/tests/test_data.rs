use chrono::NaiveDate;
use cost_forecast::{CostTable, ForecastConfig, ForecastEngine, ForecastError};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_table(days: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,EC2-Instances($),S3($),CloudWatch($),Total costs($)").unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    for i in 0..days {
        let date = start + chrono::Duration::days(i as i64);
        let ec2 = if i % 7 < 5 { 40.0 } else { 25.0 };
        let s3 = 5.0 + 0.1 * i as f64;
        let cloudwatch = 1.5;
        writeln!(
            file,
            "{},{:.2},{:.2},{:.2},{:.2}",
            date.format("%Y-%m-%d"),
            ec2,
            s3,
            cloudwatch,
            ec2 + s3 + cloudwatch
        )
        .unwrap();
    }
    file
}

#[test]
fn test_cost_table_from_csv() {
    let file = write_table(30);
    let table = CostTable::from_csv(file.path()).unwrap();

    assert_eq!(table.total_series().len(), 30);
    assert_eq!(
        table.total_series().start_date(),
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    );
    assert_eq!(
        table.service_names().collect::<Vec<_>>(),
        vec!["CloudWatch", "EC2-Instances", "S3"]
    );

    let top: Vec<String> = table.top_services(2).into_iter().map(|(name, _)| name).collect();
    assert_eq!(top, vec!["EC2-Instances".to_string(), "S3".to_string()]);
}

#[test]
fn test_missing_file() {
    let result = CostTable::from_csv("/definitely/not/here.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_duplicate_dates_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Total costs($)").unwrap();
    writeln!(file, "2024-05-01,10.0").unwrap();
    writeln!(file, "2024-05-01,11.0").unwrap();

    let result = CostTable::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_ragged_rows_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,A($),Total costs($)").unwrap();
    writeln!(file, "2024-05-01,1.0").unwrap();

    assert!(CostTable::from_csv(file.path()).is_err());
}

#[test]
fn test_table_to_report() {
    let file = write_table(28);
    let table = CostTable::from_csv(file.path()).unwrap();
    let engine = ForecastEngine::new(ForecastConfig::default().with_top_services(3)).unwrap();

    let report = engine.forecast_costs(&table);
    assert_eq!(report.services.len(), 3);
    assert!(report.services.iter().all(|s| s.outcome.is_available()));
    assert_eq!(report.services[0].service, "EC2-Instances");
}
