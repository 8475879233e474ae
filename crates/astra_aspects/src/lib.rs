//! Major-aspect enumeration.
//!
//! Every unordered planet pair is tested against every major aspect
//! definition. The orb threshold resolves through a strict priority chain:
//! pair override, then luminary override, then the default orb. Output is
//! sorted for determinism.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use astra_metrics::MetricsSink;
use astra_ref::{AspectDef, AspectSchool, LUMINARIES};

/// One planet longitude as seen by the aspect scan.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectInput {
    pub planet_code: String,
    pub longitude: f64,
}

/// One accepted aspect between two planets.
///
/// `planet_a` and `planet_b` are alphabetically ordered. `orb` duplicates
/// `orb_used` for older payload readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectResult {
    pub aspect_code: String,
    pub planet_a: String,
    pub planet_b: String,
    pub angle: f64,
    pub orb: f64,
    pub orb_used: f64,
    pub orb_max: f64,
}

/// Resolve the orb threshold for a definition and an unordered pair.
///
/// Priority: pair override (`"{min}-{max}"` key), then the luminary orb when
/// the pair touches the Sun or Moon, then the default orb.
pub fn resolve_orb_max(def: &AspectDef, planet_a: &str, planet_b: &str) -> f64 {
    let (first, second) = if planet_a <= planet_b {
        (planet_a, planet_b)
    } else {
        (planet_b, planet_a)
    };
    if let Some(overrides) = &def.orb_pair_overrides {
        let key = format!("{first}-{second}");
        if let Some(orb) = overrides.get(&key) {
            return *orb;
        }
    }
    if let Some(orb) = def.orb_luminaries
        && (LUMINARIES.contains(&first) || LUMINARIES.contains(&second))
    {
        return orb;
    }
    def.default_orb_deg
}

/// Angular separation of two longitudes, folded to [0, 180].
pub fn separation_deg(lon_a: f64, lon_b: f64) -> f64 {
    let delta = (lon_a - lon_b).abs().rem_euclid(360.0);
    delta.min(360.0 - delta)
}

/// Enumerate major aspects between all pairs.
///
/// Minor definitions are filtered out before iteration. The result is
/// sorted by `(aspect_code, planet_a, planet_b)`; counters for emitted and
/// orb-rejected candidates go to `metrics` under the given school.
pub fn calculate_major_aspects(
    positions: &[AspectInput],
    definitions: &[AspectDef],
    school: AspectSchool,
    metrics: &Arc<dyn MetricsSink>,
) -> Vec<AspectResult> {
    let majors: Vec<&AspectDef> = definitions.iter().filter(|def| def.is_major()).collect();

    let mut results = Vec::new();
    for (i, a) in positions.iter().enumerate() {
        for b in positions.iter().skip(i + 1) {
            let separation = separation_deg(a.longitude, b.longitude);
            for def in &majors {
                let orb_used = (separation - def.angle).abs();
                let orb_max = resolve_orb_max(def, &a.planet_code, &b.planet_code);
                // A deviation exactly at the threshold does not qualify.
                if orb_used < orb_max {
                    let (planet_a, planet_b) = if a.planet_code <= b.planet_code {
                        (a.planet_code.clone(), b.planet_code.clone())
                    } else {
                        (b.planet_code.clone(), a.planet_code.clone())
                    };
                    results.push(AspectResult {
                        aspect_code: def.code.clone(),
                        planet_a,
                        planet_b,
                        angle: def.angle,
                        orb: orb_used,
                        orb_used,
                        orb_max,
                    });
                }
            }
        }
    }

    results.sort_by(|x, y| {
        (&x.aspect_code, &x.planet_a, &x.planet_b).cmp(&(&y.aspect_code, &y.planet_a, &y.planet_b))
    });

    let pairs = positions.len() * positions.len().saturating_sub(1) / 2;
    let candidates = (pairs * majors.len()) as u64;
    let emitted = results.len() as u64;
    metrics.incr_by(
        &format!("aspects_calculated_total_{}", school.as_str()),
        emitted,
    );
    metrics.incr_by("aspects_rejected_orb_total", candidates - emitted);

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_metrics::{NoopMetrics, RecordingMetrics};
    use astra_ref::builtin;

    fn noop() -> Arc<dyn MetricsSink> {
        Arc::new(NoopMetrics)
    }

    fn pos(code: &str, lon: f64) -> AspectInput {
        AspectInput {
            planet_code: code.into(),
            longitude: lon,
        }
    }

    fn square_def(default_orb: f64) -> AspectDef {
        AspectDef {
            code: "square".into(),
            angle: 90.0,
            default_orb_deg: default_orb,
            orb_luminaries: None,
            orb_pair_overrides: None,
        }
    }

    #[test]
    fn sun_mars_square_within_default_orb() {
        let results = calculate_major_aspects(
            &[pos("sun", 0.0), pos("mars", 93.0)],
            &[square_def(6.0)],
            AspectSchool::Modern,
            &noop(),
        );
        assert_eq!(results.len(), 1);
        let aspect = &results[0];
        assert_eq!(aspect.aspect_code, "square");
        assert_eq!(aspect.planet_a, "mars");
        assert_eq!(aspect.planet_b, "sun");
        assert!((aspect.orb - 3.0).abs() < 1e-12);
        assert!((aspect.orb_used - 3.0).abs() < 1e-12);
        assert!((aspect.orb_max - 6.0).abs() < 1e-12);
    }

    #[test]
    fn luminary_orb_widens_the_threshold() {
        let def = AspectDef {
            code: "opposition".into(),
            angle: 180.0,
            default_orb_deg: 6.0,
            orb_luminaries: Some(9.0),
            orb_pair_overrides: None,
        };
        let results = calculate_major_aspects(
            &[pos("sun", 0.0), pos("moon", 174.0)],
            &[def],
            AspectSchool::Modern,
            &noop(),
        );
        assert_eq!(results.len(), 1);
        assert!((results[0].orb_max - 9.0).abs() < 1e-12);
        assert!((results[0].orb_used - 6.0).abs() < 1e-12);
    }

    #[test]
    fn without_luminary_override_the_default_rejects() {
        // orb_used is exactly 6.0: a deviation at the threshold is out.
        let def = AspectDef {
            code: "opposition".into(),
            angle: 180.0,
            default_orb_deg: 6.0,
            orb_luminaries: None,
            orb_pair_overrides: None,
        };
        let results = calculate_major_aspects(
            &[pos("sun", 0.0), pos("moon", 174.0)],
            &[def],
            AspectSchool::Modern,
            &noop(),
        );
        assert!(results.is_empty(), "threshold deviation must be rejected");
    }

    #[test]
    fn pair_override_beats_luminary_orb() {
        let def = AspectDef {
            code: "conjunction".into(),
            angle: 0.0,
            default_orb_deg: 8.0,
            orb_luminaries: Some(10.0),
            orb_pair_overrides: Some([("moon-sun".to_string(), 2.0)].into_iter().collect()),
        };
        // 3° apart: inside the luminary orb but outside the pair override.
        let results = calculate_major_aspects(
            &[pos("sun", 10.0), pos("moon", 13.0)],
            &[def],
            AspectSchool::Modern,
            &noop(),
        );
        assert!(results.is_empty(), "pair override must win over luminary orb");
    }

    #[test]
    fn minor_definitions_are_filtered() {
        let bundle = builtin();
        // 150° apart: a quincunx, which is not a major aspect.
        let results = calculate_major_aspects(
            &[pos("mars", 0.0), pos("venus", 150.0)],
            &bundle.aspects,
            AspectSchool::Modern,
            &noop(),
        );
        assert!(results.iter().all(|a| a.aspect_code != "quincunx"));
        assert!(results.iter().all(|a| a.aspect_code != "semisextile"));
    }

    #[test]
    fn separation_wraps_around_zero() {
        assert!((separation_deg(359.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((separation_deg(0.0, 180.0) - 180.0).abs() < 1e-12);
        assert!((separation_deg(350.0, 80.0) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn output_sorted_and_deterministic() {
        let bundle = builtin();
        let positions = [
            pos("venus", 0.0),
            pos("mars", 90.0),
            pos("sun", 180.0),
            pos("moon", 270.0),
        ];
        let a = calculate_major_aspects(&positions, &bundle.aspects, AspectSchool::Modern, &noop());
        let b = calculate_major_aspects(&positions, &bundle.aspects, AspectSchool::Modern, &noop());
        assert_eq!(a, b);

        let keys: Vec<_> = a
            .iter()
            .map(|r| (r.aspect_code.clone(), r.planet_a.clone(), r.planet_b.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn counters_split_emitted_and_rejected() {
        let metrics = Arc::new(RecordingMetrics::new());
        let sink: Arc<dyn MetricsSink> = metrics.clone();
        let results = calculate_major_aspects(
            &[pos("sun", 0.0), pos("mars", 93.0), pos("venus", 200.0)],
            &[square_def(6.0)],
            AspectSchool::Classic,
            &sink,
        );
        // 3 pairs x 1 major definition = 3 candidates, 1 emitted.
        assert_eq!(results.len(), 1);
        assert_eq!(metrics.counter("aspects_calculated_total_classic"), 1);
        assert_eq!(metrics.counter("aspects_rejected_orb_total"), 2);
    }
}
