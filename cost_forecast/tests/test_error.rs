use cost_forecast::{ForecastConfig, ForecastEngine, ForecastError};
use forecast_math::MathError;
use rstest::rstest;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::IoError(_)));

    let math_error = MathError::InvalidInput("bad window".to_string());
    assert!(matches!(ForecastError::from(math_error), ForecastError::Math(_)));

    let json_error = serde_json::from_str::<ForecastConfig>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::JsonError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientData {
        required: 14,
        actual: 9,
    };
    let message = error.to_string();
    assert!(message.contains("14"));
    assert!(message.contains("9"));

    let error = ForecastError::from(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "permission denied",
    ));
    let message = error.to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("permission denied"));
}

#[rstest]
#[case(ForecastConfig::default().with_horizon(0))]
#[case(ForecastConfig::default().with_seasonal_period(1))]
#[case(ForecastConfig::default().with_confidence_level(0.0))]
#[case(ForecastConfig::default().with_confidence_level(1.0))]
#[case(ForecastConfig::default().with_backtest_window(0))]
#[case(ForecastConfig { min_backtest_folds: 0, ..ForecastConfig::default() })]
#[case(ForecastConfig { max_backtest_folds: 1, ..ForecastConfig::default() })]
fn test_invalid_config_is_rejected(#[case] config: ForecastConfig) {
    assert!(matches!(
        config.validate(),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(ForecastEngine::new(config).is_err());
}

#[test]
fn test_config_from_json_uses_defaults() {
    let config = ForecastConfig::from_json_str(r#"{"forecast_horizon_days": 30}"#).unwrap();
    assert_eq!(config.forecast_horizon_days, 30);
    assert_eq!(config.seasonal_period_days, 7);
    assert_eq!(config.min_backtest_folds, 2);

    assert!(ForecastConfig::from_json_str(r#"{"confidence_level": 2.0}"#).is_err());
    assert!(ForecastConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_env() {
    std::env::set_var("FORECAST_HORIZON", "21");
    std::env::set_var("FORECAST_TOP_SERVICES", "3");
    let config = ForecastConfig::from_env().unwrap();
    assert_eq!(config.forecast_horizon_days, 21);
    assert_eq!(config.top_services, 3);

    std::env::set_var("FORECAST_HORIZON", "soon");
    assert!(matches!(
        ForecastConfig::from_env(),
        Err(ForecastError::InvalidParameter(_))
    ));

    std::env::remove_var("FORECAST_HORIZON");
    std::env::remove_var("FORECAST_TOP_SERVICES");
}
