//! Swiss selection after a failed bootstrap propagates the stored error.
//!
//! Own test binary: the process-wide bootstrap record is poisoned with a
//! failing data path for the whole process.

use std::sync::Arc;

use astra_chart::{BirthInput, ChartOptions, CoreConfig, NatalCalculator};
use astra_ephem::{BootstrapConfig, initialize};
use astra_metrics::NoopMetrics;
use astra_ref::StaticReferenceProvider;
use astra_time::IanaTzDatabase;

#[test]
fn failed_bootstrap_error_is_propagated_to_chart_requests() {
    let rec = initialize(
        &BootstrapConfig::new("/nonexistent/ephemeris-data", "v1"),
        &NoopMetrics,
    );
    assert!(!rec.success);

    let config = CoreConfig {
        swisseph_enabled: true,
        swisseph_data_path: "/nonexistent/ephemeris-data".into(),
        swisseph_path_version: "v1".into(),
        ..CoreConfig::default()
    };
    let calculator = NatalCalculator::new(
        config,
        Arc::new(StaticReferenceProvider::with_builtin()),
        Arc::new(IanaTzDatabase),
        Arc::new(NoopMetrics),
    );

    let input = BirthInput {
        birth_date: "1990-06-15".into(),
        birth_time: Some("10:30".into()),
        birth_place: "Paris".into(),
        birth_timezone: Some("Europe/Paris".into()),
        birth_lat: Some(48.8566),
        birth_lon: Some(2.3522),
        place_resolved_id: None,
    };
    let options = ChartOptions { accurate: true, ..ChartOptions::default() };
    let err = calculator.calculate(&input, &options).unwrap_err();
    assert_eq!(err.code(), "ephemeris_data_missing");
}
