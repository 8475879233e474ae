//! Deterministic pseudo-positions for offline and development use.
//!
//! Each planet advances linearly at its mean daily motion from its J2000
//! mean longitude. The output is deterministic and visually plausible but
//! non-physical; only the tropical geocentric regime is defined.

use astra_time::J2000_JD;

use crate::planets::{ALL_PLANETS, Planet, RawPlanet};

/// (J2000 mean longitude in degrees, mean motion in degrees/day).
const fn mean_elements(planet: Planet) -> (f64, f64) {
    match planet {
        Planet::Sun => (280.4665, 0.985_647_36),
        Planet::Moon => (218.3165, 13.176_396_48),
        Planet::Mercury => (252.2503, 4.092_334_45),
        Planet::Venus => (181.9798, 1.602_130_34),
        Planet::Mars => (355.4330, 0.524_038_40),
        Planet::Jupiter => (34.3515, 0.083_085_29),
        Planet::Saturn => (50.0774, 0.033_444_14),
        Planet::Uranus => (314.0550, 0.011_728_34),
        Planet::Neptune => (304.3487, 0.005_981_03),
        Planet::Pluto => (238.9581, 0.003_964_00),
    }
}

/// Pseudo-longitude of a planet at a Julian Day (UT).
pub fn simplified_longitude(planet: Planet, jd_ut: f64) -> f64 {
    let (l0, rate) = mean_elements(planet);
    (l0 + rate * (jd_ut - J2000_JD)).rem_euclid(360.0)
}

/// All ten pseudo-positions in canonical order.
pub fn simplified_planets(jd_ut: f64) -> Vec<RawPlanet> {
    ALL_PLANETS
        .iter()
        .map(|&planet| {
            let (_, rate) = mean_elements(planet);
            RawPlanet {
                planet,
                longitude: simplified_longitude(planet, jd_ut),
                speed_longitude: rate,
                is_retrograde: false,
            }
        })
        .collect()
}
