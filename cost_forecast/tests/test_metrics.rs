use assert_approx_eq::assert_approx_eq;
use cost_forecast::metrics::{evaluate_fold, FoldObservation, ModelAccuracy};
use cost_forecast::ModelKind;

#[test]
fn test_directional_accuracy_counts_turns() {
    // Up, down, up against a prediction that goes up, up, up
    let actual = [110.0, 105.0, 115.0];
    let predicted = [108.0, 112.0, 116.0];
    let intervals = [(100.0, 120.0); 3];
    let metrics = evaluate_fold(&FoldObservation {
        cutoff: 14,
        last_actual: 100.0,
        actual: &actual,
        predicted: &predicted,
        intervals: &intervals,
    })
    .unwrap();

    assert_approx_eq!(metrics.directional_accuracy, 2.0 / 3.0, 1e-12);
    assert_eq!(metrics.ci_coverage, 1.0);
    assert_eq!(metrics.days, 3);
}

#[test]
fn test_rmse_penalises_large_misses() {
    let actual = [100.0, 100.0, 100.0, 100.0];
    let spread = [95.0, 105.0, 95.0, 105.0];
    let single = [100.0, 100.0, 100.0, 80.0];
    let intervals = [(0.0, 200.0); 4];

    let spread_metrics = evaluate_fold(&FoldObservation {
        cutoff: 7,
        last_actual: 100.0,
        actual: &actual,
        predicted: &spread,
        intervals: &intervals,
    })
    .unwrap();
    let single_metrics = evaluate_fold(&FoldObservation {
        cutoff: 7,
        last_actual: 100.0,
        actual: &actual,
        predicted: &single,
        intervals: &intervals,
    })
    .unwrap();

    // Same absolute error, different squared error
    assert_approx_eq!(spread_metrics.mae, single_metrics.mae, 1e-12);
    assert!(single_metrics.rmse > spread_metrics.rmse);
}

#[test]
fn test_accuracy_display() {
    let actual = [50.0, 60.0];
    let intervals = [(40.0, 70.0); 2];
    let observation = FoldObservation {
        cutoff: 21,
        last_actual: 45.0,
        actual: &actual,
        predicted: &[55.0, 55.0],
        intervals: &intervals,
    };
    let accuracy = ModelAccuracy::from_folds(ModelKind::SeasonalDecomposition, &[observation])
        .unwrap()
        .unwrap();

    let text = accuracy.to_string();
    assert!(text.contains("Seasonal Decomposition (1 folds)"));
    assert!(text.contains("MAPE"));
    assert_approx_eq!(accuracy.coverage_gap(0.95), 0.05, 1e-12);
}
