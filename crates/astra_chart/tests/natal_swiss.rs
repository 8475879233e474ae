//! End-to-end charts on the precision engine (bootstrapped workspace data).

use std::path::PathBuf;
use std::sync::{Arc, Once};

use astra_chart::{
    Ayanamsa, BirthInput, ChartOptions, CoreConfig, EngineKind, NatalCalculator, TimeScale,
    Zodiac,
};
use astra_ephem::{BootstrapConfig, initialize};
use astra_metrics::NoopMetrics;
use astra_ref::{StaticReferenceProvider, sign_index_for_longitude};
use astra_time::IanaTzDatabase;

fn ensure_bootstrap() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let ephe = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../ephe");
        let rec = initialize(&BootstrapConfig::new(ephe, "de-mini-2024"), &NoopMetrics);
        assert!(rec.success, "bootstrap failed: {:?}", rec.error);
    });
}

fn swiss_calculator() -> NatalCalculator {
    ensure_bootstrap();
    let config = CoreConfig {
        swisseph_enabled: true,
        swisseph_data_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../ephe"),
        swisseph_path_version: "de-mini-2024".into(),
        ..CoreConfig::default()
    };
    NatalCalculator::new(
        config,
        Arc::new(StaticReferenceProvider::with_builtin()),
        Arc::new(IanaTzDatabase),
        Arc::new(NoopMetrics),
    )
}

fn paris_1990() -> BirthInput {
    BirthInput {
        birth_date: "1990-06-15".into(),
        birth_time: Some("10:30".into()),
        birth_place: "Paris, France".into(),
        birth_timezone: Some("Europe/Paris".into()),
        birth_lat: Some(48.8566),
        birth_lon: Some(2.3522),
        place_resolved_id: None,
    }
}

fn accurate() -> ChartOptions {
    ChartOptions { accurate: true, ..ChartOptions::default() }
}

#[test]
fn accurate_chart_uses_swiss_and_surfaces_path_metadata() {
    let result = swiss_calculator().calculate(&paris_1990(), &accurate()).expect("chart");
    assert_eq!(result.engine, EngineKind::Swiss);
    assert_eq!(result.ephemeris_path_version.as_deref(), Some("de-mini-2024"));
    let hash = result.ephemeris_path_hash.as_deref().expect("path hash");
    assert_eq!(hash.len(), 64);
}

#[test]
fn swiss_without_coordinates_is_rejected() {
    let mut input = paris_1990();
    input.birth_lat = None;
    input.birth_lon = None;
    let err = swiss_calculator().calculate(&input, &accurate()).unwrap_err();
    assert_eq!(err.code(), "missing_birth_coordinates");
}

#[test]
fn tt_scale_carries_delta_t_into_the_result() {
    let options = ChartOptions { tt_enabled: true, ..accurate() };
    let result = swiss_calculator().calculate(&paris_1990(), &options).expect("chart");
    assert_eq!(result.time_scale, TimeScale::TT);
    let delta = result.prepared_input.delta_t_sec.expect("delta t");
    let jd_tt = result.prepared_input.jd_tt.expect("jd_tt");
    assert!((jd_tt - result.prepared_input.jd_ut - delta / 86_400.0).abs() < 1e-12);
}

#[test]
fn sidereal_lahiri_chart_shifts_signs() {
    let calculator = swiss_calculator();
    let tropical = calculator.calculate(&paris_1990(), &accurate()).expect("tropical");

    let options = ChartOptions {
        zodiac: "sidereal".into(),
        ayanamsa: Some("lahiri".into()),
        ..accurate()
    };
    let sidereal = calculator.calculate(&paris_1990(), &options).expect("sidereal");

    assert_eq!(sidereal.zodiac, Zodiac::Sidereal);
    assert_eq!(sidereal.ayanamsa, Some(Ayanamsa::Lahiri));

    let moved = tropical
        .planet_positions
        .iter()
        .zip(sidereal.planet_positions.iter())
        .filter(|(t, s)| {
            sign_index_for_longitude(t.longitude) != sign_index_for_longitude(s.longitude)
        })
        .count();
    assert!(moved >= 1, "sidereal chart moved no planet to another sign");

    // Offsets match the ayanamsa for every planet.
    let expected = Ayanamsa::Lahiri.offset_deg_at(tropical.prepared_input.jd_ut);
    for (t, s) in tropical.planet_positions.iter().zip(sidereal.planet_positions.iter()) {
        let offset = (t.longitude - s.longitude).rem_euclid(360.0);
        assert!(
            (offset - expected).abs() < 0.01,
            "{}: offset {offset} vs ayanamsa {expected}",
            t.planet_code
        );
    }
}

#[test]
fn topocentric_chart_surfaces_default_altitude() {
    let options = ChartOptions { frame: "topocentric".into(), ..accurate() };
    let result = swiss_calculator().calculate(&paris_1990(), &options).expect("chart");
    assert_eq!(result.altitude_m, Some(0.0));

    let with_altitude = ChartOptions {
        frame: "topocentric".into(),
        altitude_m: Some(35.0),
        ..accurate()
    };
    let result = swiss_calculator()
        .calculate(&paris_1990(), &with_altitude)
        .expect("chart");
    assert_eq!(result.altitude_m, Some(35.0));
}

#[test]
fn swiss_chart_respects_all_invariants() {
    let result = swiss_calculator().calculate(&paris_1990(), &accurate()).expect("chart");
    assert_eq!(result.planet_positions.len(), 10);
    assert_eq!(result.houses.len(), 12);
    for planet in &result.planet_positions {
        assert!((0.0..360.0).contains(&planet.longitude));
        assert!((1..=12).contains(&planet.house_number));
        assert!(planet.speed_longitude.is_some());
        assert!(planet.is_retrograde.is_some());
    }
}

#[test]
fn swiss_results_are_reproducible() {
    let calculator = swiss_calculator();
    let a = calculator.calculate(&paris_1990(), &accurate()).expect("first");
    let b = calculator.calculate(&paris_1990(), &accurate()).expect("second");
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
