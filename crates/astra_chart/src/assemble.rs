//! The natal assembler: orchestration, validation, coherence.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde_json::{Map, Value};

use astra_aspects::{AspectInput, calculate_major_aspects};
use astra_ephem::{
    EngineBackend, EngineKind, HouseRequest, HousesRaw, PlanetOptions, RawPlanet,
    SimplifiedEngine, SwissEngine, record as bootstrap_record,
};
use astra_metrics::{MetricsSink, metric_name};
use astra_ref::{ReferenceData, ReferenceProvider, RefError, sign_index_for_longitude};
use astra_time::{BirthInput, BirthPrepared, TimePreparer, TimezoneDatabase};

use crate::config::CoreConfig;
use crate::error::ChartError;
use crate::options::{ChartOptions, ResolvedOptions};
use crate::result::{HouseCusp, NatalResult, PlanetPosition};

/// Cooperative deadline hook, invoked at stage boundaries.
/// Returns `false` once the caller's budget is exhausted.
pub type TimeoutCheck<'a> = &'a (dyn Fn() -> bool + Sync);

/// One-in-N sampling for the inconsistency warn line.
const INCONSISTENCY_WARN_SAMPLE: u64 = 10;

static INCONSISTENCY_SEEN: AtomicU64 = AtomicU64::new(0);

/// Orchestrates time preparation, the providers and the aspect scan into a
/// coherent [`NatalResult`].
pub struct NatalCalculator {
    config: CoreConfig,
    reference: Arc<dyn ReferenceProvider>,
    metrics: Arc<dyn MetricsSink>,
    preparer: TimePreparer,
    swiss: SwissEngine,
    simplified: SimplifiedEngine,
}

impl NatalCalculator {
    pub fn new(
        config: CoreConfig,
        reference: Arc<dyn ReferenceProvider>,
        tzdb: Arc<dyn TimezoneDatabase>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let preparer = TimePreparer::new(tzdb, metrics.clone())
            .with_coordinate_derivation(config.timezone_derivation_enabled);
        let swiss = SwissEngine::new(metrics.clone());
        Self {
            config,
            reference,
            metrics,
            preparer,
            swiss,
            simplified: SimplifiedEngine::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Wire operation: prepare a birth instant without computing a chart.
    pub fn prepare(&self, input: &BirthInput, tt_enabled: bool) -> Result<BirthPrepared, ChartError> {
        Ok(self.preparer.prepare(input, tt_enabled)?)
    }

    /// Wire operation: compute a full natal chart.
    pub fn calculate(
        &self,
        input: &BirthInput,
        options: &ChartOptions,
    ) -> Result<NatalResult, ChartError> {
        self.calculate_with_deadline(input, options, None)
    }

    /// Compute a chart with a cooperative deadline checked at every stage
    /// boundary.
    pub fn calculate_with_deadline(
        &self,
        input: &BirthInput,
        options: &ChartOptions,
        timeout_check: Option<TimeoutCheck<'_>>,
    ) -> Result<NatalResult, ChartError> {
        let reference = self.reference.get_active()?;
        reference.validate()?;
        check_deadline(timeout_check)?;

        let resolved = options.resolve(&self.config).inspect_err(|err| {
            if err.code() == "invalid_ayanamsa" {
                self.metrics.incr("invalid_ayanamsa_total");
            }
        })?;
        self.check_input_against(&resolved, options, input)?;
        let engine = self.engine_for(resolved.engine)?;

        let prepared = self.preparer.prepare(input, options.tt_enabled)?;
        check_deadline(timeout_check)?;

        let (latitude, longitude) = effective_coordinates(input);
        let planet_options = PlanetOptions {
            zodiac: resolved.zodiac,
            ayanamsa: resolved.ayanamsa,
            frame: resolved.frame,
            latitude: input.birth_lat,
            longitude: input.birth_lon,
            altitude_m: resolved.altitude_m.unwrap_or(0.0),
        };
        let planets = engine.calculate_planets(prepared.jd_ut, &planet_options)?;
        check_deadline(timeout_check)?;

        let house_request = HouseRequest {
            latitude,
            longitude,
            system: resolved.house_system,
            frame: resolved.frame,
            altitude_m: resolved.altitude_m.unwrap_or(0.0),
        };
        let houses = engine.calculate_houses(prepared.jd_ut, &house_request)?;
        check_deadline(timeout_check)?;

        validate_cusps(&houses)?;
        let positions = self.place_planets(&planets, &houses, &reference, &resolved)?;
        check_deadline(timeout_check)?;

        let aspect_inputs: Vec<AspectInput> = positions
            .iter()
            .map(|p| AspectInput {
                planet_code: p.planet_code.clone(),
                longitude: p.longitude,
            })
            .collect();
        let aspects = calculate_major_aspects(
            &aspect_inputs,
            &reference.aspects,
            resolved.aspect_school,
            &self.metrics,
        );
        check_deadline(timeout_check)?;

        let (ephemeris_path_version, ephemeris_path_hash) = match resolved.engine {
            EngineKind::Swiss => bootstrap_record()
                .map(|rec| (Some(rec.path_version.clone()), rec.path_hash.clone()))
                .unwrap_or((None, None)),
            EngineKind::Simplified => (None, None),
        };

        debug!(
            "natal chart assembled: engine={} zodiac={} frame={} house_system={} planets={} aspects={}",
            resolved.engine.as_str(),
            resolved.zodiac.as_str(),
            resolved.frame.as_str(),
            resolved.house_system.as_str(),
            positions.len(),
            aspects.len(),
        );

        Ok(NatalResult {
            reference_version: reference.version.clone(),
            ruleset_version: reference.ruleset_version.clone(),
            house_system: resolved.house_system,
            engine: resolved.engine,
            zodiac: resolved.zodiac,
            frame: resolved.frame,
            ayanamsa: resolved.ayanamsa,
            altitude_m: resolved.altitude_m,
            ephemeris_path_version,
            ephemeris_path_hash,
            time_scale: prepared.time_scale,
            aspect_school: resolved.aspect_school,
            aspect_rules_version: reference.ruleset_version.clone(),
            prepared_input: prepared,
            planet_positions: positions,
            houses: houses
                .cusps
                .iter()
                .enumerate()
                .map(|(i, cusp)| HouseCusp {
                    number: i as u8 + 1,
                    cusp_longitude: *cusp,
                })
                .collect(),
            ascendant: houses.ascendant,
            mc: houses.mc,
            aspects,
        })
    }

    /// Request-shape gates that depend on the resolved engine and options.
    fn check_input_against(
        &self,
        resolved: &ResolvedOptions,
        options: &ChartOptions,
        input: &BirthInput,
    ) -> Result<(), ChartError> {
        if options.accurate && input.birth_time.is_none() {
            return Err(ChartError::MissingBirthTime);
        }
        if resolved.engine == EngineKind::Swiss && !input.has_coordinates() {
            return Err(ChartError::MissingBirthCoordinates);
        }
        Ok(())
    }

    fn engine_for(&self, kind: EngineKind) -> Result<&dyn EngineBackend, ChartError> {
        match kind {
            EngineKind::Simplified => Ok(&self.simplified),
            EngineKind::Swiss => {
                if !self.config.swisseph_enabled {
                    return Err(ChartError::Ephemeris(astra_ephem::EphemError::EngineUnavailable));
                }
                match bootstrap_record() {
                    Some(rec) if rec.success => Ok(&self.swiss),
                    Some(rec) => Err(ChartError::Ephemeris(
                        rec.error
                            .clone()
                            .unwrap_or(astra_ephem::EphemError::EngineUnavailable),
                    )),
                    None => {
                        Err(ChartError::Ephemeris(astra_ephem::EphemError::EngineUnavailable))
                    }
                }
            }
        }
    }

    /// Attribute signs and houses and enforce the coherence invariants.
    fn place_planets(
        &self,
        planets: &[RawPlanet],
        houses: &HousesRaw,
        reference: &ReferenceData,
        resolved: &ResolvedOptions,
    ) -> Result<Vec<PlanetPosition>, ChartError> {
        let mut positions = Vec::with_capacity(planets.len());
        for raw in planets {
            let code = raw.planet.code();
            if !reference.knows_planet(code) {
                return Err(ChartError::Reference(RefError::InvalidShape {
                    field: "planets",
                    reason: format!("planet '{code}' missing from reference data"),
                }));
            }

            let sign_code = reference.sign_code(sign_index_for_longitude(raw.longitude));
            let position = PlanetPosition {
                planet_code: code.to_string(),
                longitude: raw.longitude,
                sign_code: sign_code.to_string(),
                house_number: 0,
                speed_longitude: Some(raw.speed_longitude),
                is_retrograde: Some(raw.is_retrograde),
            };
            let position =
                self.check_coherence(position, houses, reference, resolved)?;
            positions.push(position);
        }
        Ok(positions)
    }

    /// Both coherence invariants for one planet; fills the house number.
    fn check_coherence(
        &self,
        mut position: PlanetPosition,
        houses: &HousesRaw,
        reference: &ReferenceData,
        resolved: &ResolvedOptions,
    ) -> Result<PlanetPosition, ChartError> {
        let expected_sign = reference.sign_code(sign_index_for_longitude(position.longitude));
        if position.sign_code != expected_sign {
            let mut details = Map::new();
            details.insert("expected_sign_code".into(), Value::String(expected_sign.into()));
            details.insert("actual_sign_code".into(), Value::String(position.sign_code.clone()));
            details.insert(
                "reference_version".into(),
                Value::String(reference.version.clone()),
            );
            details.insert(
                "house_system".into(),
                Value::String(resolved.house_system.as_str().into()),
            );
            return Err(self.report_inconsistency(
                "sign attribution mismatch",
                &position.planet_code,
                reference,
                resolved,
                details,
            ));
        }

        let Some((house, start, end)) = assign_house(&houses.cusps, position.longitude) else {
            let mut details = Map::new();
            insert_f64(&mut details, "longitude", position.longitude);
            return Err(self.report_inconsistency(
                "longitude not covered by any house arc",
                &position.planet_code,
                reference,
                resolved,
                details,
            ));
        };

        // Re-check containment of the half-open arc independently.
        let span = (end - start).rem_euclid(360.0);
        let offset = (position.longitude - start).rem_euclid(360.0);
        if offset >= span {
            let mut details = Map::new();
            insert_f64(&mut details, "longitude", position.longitude);
            details.insert("house_number".into(), Value::Number(house.into()));
            insert_f64(&mut details, "interval_start", start);
            insert_f64(&mut details, "interval_end", end);
            return Err(self.report_inconsistency(
                "house interval does not contain the longitude",
                &position.planet_code,
                reference,
                resolved,
                details,
            ));
        }

        position.house_number = house;
        Ok(position)
    }

    fn report_inconsistency(
        &self,
        reason: &'static str,
        planet_code: &str,
        reference: &ReferenceData,
        resolved: &ResolvedOptions,
        details: Map<String, Value>,
    ) -> ChartError {
        self.metrics.incr("natal_inconsistent_result_total");
        self.metrics.incr(&metric_name(
            "natal_inconsistent_result_total",
            &[
                ("reference_version", &reference.version),
                ("house_system", resolved.house_system.as_str()),
                ("planet_code", planet_code),
            ],
        ));
        let seen = INCONSISTENCY_SEEN.fetch_add(1, Ordering::Relaxed);
        if seen % INCONSISTENCY_WARN_SAMPLE == 0 {
            warn!(
                "inconsistent natal result: reason={reason} planet={planet_code} \
                 reference_version={} house_system={}",
                reference.version,
                resolved.house_system.as_str(),
            );
        }
        ChartError::InconsistentResult { reason, details }
    }
}

/// Coordinates used for the house computation.
///
/// The swiss engine has already demanded real coordinates; the simplified
/// engine substitutes the (0, 0) reference location when none are given.
fn effective_coordinates(input: &BirthInput) -> (f64, f64) {
    (input.birth_lat.unwrap_or(0.0), input.birth_lon.unwrap_or(0.0))
}

fn check_deadline(timeout_check: Option<TimeoutCheck<'_>>) -> Result<(), ChartError> {
    match timeout_check {
        Some(check) if !check() => Err(ChartError::GenerationTimeout),
        _ => Ok(()),
    }
}

/// Validate the cusp set: finite, in range, pairwise distinct.
pub(crate) fn validate_cusps(houses: &HousesRaw) -> Result<(), ChartError> {
    for cusp in &houses.cusps {
        if !cusp.is_finite() || !(0.0..360.0).contains(cusp) {
            return Err(ChartError::Reference(RefError::InvalidShape {
                field: "houses",
                reason: format!("cusp longitude {cusp} outside [0, 360)"),
            }));
        }
    }
    for i in 0..12 {
        for j in (i + 1)..12 {
            if houses.cusps[i] == houses.cusps[j] {
                return Err(ChartError::Reference(RefError::InvalidShape {
                    field: "houses",
                    reason: format!("duplicate cusp longitude at houses {} and {}", i + 1, j + 1),
                }));
            }
        }
    }
    Ok(())
}

/// Find the house whose half-open arc `[cusp_k, cusp_{k+1})` contains the
/// longitude. A longitude exactly on a cusp belongs to the house starting
/// there. Returns `(house_number, arc_start, arc_end)`.
pub(crate) fn assign_house(cusps: &[f64; 12], longitude: f64) -> Option<(u8, f64, f64)> {
    for k in 0..12 {
        let start = cusps[k];
        let end = cusps[(k + 1) % 12];
        let span = (end - start).rem_euclid(360.0);
        let offset = (longitude - start).rem_euclid(360.0);
        if offset < span {
            return Some((k as u8 + 1, start, end));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_ephem::HouseSystem;

    fn equal_cusps_from(start: f64) -> [f64; 12] {
        core::array::from_fn(|i| (start + 30.0 * i as f64).rem_euclid(360.0))
    }

    #[test]
    fn boundary_longitude_belongs_to_starting_house() {
        let cusps = equal_cusps_from(10.0);
        let (house, start, _) = assign_house(&cusps, 40.0).expect("assigned");
        assert_eq!(house, 2);
        assert!((start - 40.0).abs() < 1e-12);
    }

    #[test]
    fn zero_longitude_with_zero_first_cusp_lands_in_house_one() {
        let cusps = equal_cusps_from(0.0);
        let (house, _, _) = assign_house(&cusps, 0.0).expect("assigned");
        assert_eq!(house, 1);
    }

    #[test]
    fn wrap_arc_contains_late_longitudes() {
        let cusps = equal_cusps_from(350.0);
        // House 1 spans [350, 20).
        assert_eq!(assign_house(&cusps, 355.0).unwrap().0, 1);
        assert_eq!(assign_house(&cusps, 5.0).unwrap().0, 1);
        assert_eq!(assign_house(&cusps, 20.0).unwrap().0, 2);
    }

    #[test]
    fn every_longitude_is_assigned_exactly_once() {
        let cusps = equal_cusps_from(17.3);
        for tenth in 0..3600 {
            let lon = f64::from(tenth) * 0.1;
            let hits = (0..12)
                .filter(|&k| {
                    let start = cusps[k];
                    let end = cusps[(k + 1) % 12];
                    let span = (end - start).rem_euclid(360.0);
                    (lon - start).rem_euclid(360.0) < span
                })
                .count();
            assert_eq!(hits, 1, "longitude {lon} hit {hits} houses");
        }
    }

    #[test]
    fn sign_mismatch_is_reported_with_details_and_metrics() {
        use astra_metrics::RecordingMetrics;
        use astra_ref::StaticReferenceProvider;
        use astra_time::IanaTzDatabase;

        let metrics = Arc::new(RecordingMetrics::new());
        let calculator = NatalCalculator::new(
            CoreConfig::default(),
            Arc::new(StaticReferenceProvider::with_builtin()),
            Arc::new(IanaTzDatabase),
            metrics.clone(),
        );
        let reference = astra_ref::builtin();
        let resolved = ChartOptions::default()
            .resolve(&CoreConfig::default())
            .expect("default options resolve");
        let houses = HousesRaw {
            cusps: equal_cusps_from(0.0),
            ascendant: 0.0,
            mc: 270.0,
            system: HouseSystem::Placidus,
        };

        // 95° is Cancer; claim Leo to violate the sign invariant.
        let corrupt = PlanetPosition {
            planet_code: "mars".into(),
            longitude: 95.0,
            sign_code: "leo".into(),
            house_number: 0,
            speed_longitude: None,
            is_retrograde: None,
        };
        let err = calculator
            .check_coherence(corrupt, &houses, &reference, &resolved)
            .unwrap_err();
        assert_eq!(err.code(), "inconsistent_natal_result");
        let details = err.details();
        assert_eq!(details["expected_sign_code"], "cancer");
        assert_eq!(details["actual_sign_code"], "leo");
        assert_eq!(details["reference_version"], reference.version.as_str());

        assert_eq!(metrics.counter("natal_inconsistent_result_total"), 1);
        let labelled = metric_name(
            "natal_inconsistent_result_total",
            &[
                ("reference_version", &reference.version),
                ("house_system", "placidus"),
                ("planet_code", "mars"),
            ],
        );
        assert_eq!(metrics.counter(&labelled), 1);
    }

    #[test]
    fn duplicate_cusps_are_invalid_reference_data() {
        let mut cusps = equal_cusps_from(0.0);
        cusps[5] = cusps[4];
        let houses = HousesRaw {
            cusps,
            ascendant: 0.0,
            mc: 270.0,
            system: HouseSystem::Placidus,
        };
        let err = validate_cusps(&houses).unwrap_err();
        assert_eq!(err.code(), "invalid_reference_data");
    }

    #[test]
    fn out_of_range_cusp_is_rejected() {
        let mut cusps = equal_cusps_from(0.0);
        cusps[3] = 360.0;
        let houses = HousesRaw {
            cusps,
            ascendant: 0.0,
            mc: 270.0,
            system: HouseSystem::Equal,
        };
        assert!(validate_cusps(&houses).is_err());

        cusps[3] = f64::NAN;
        let houses = HousesRaw {
            cusps,
            ascendant: 0.0,
            mc: 270.0,
            system: HouseSystem::Equal,
        };
        assert!(validate_cusps(&houses).is_err());
    }
}

fn insert_f64(map: &mut Map<String, Value>, key: &str, value: f64) {
    if let Some(num) = serde_json::Number::from_f64(value) {
        map.insert(key.to_string(), Value::Number(num));
    }
}
