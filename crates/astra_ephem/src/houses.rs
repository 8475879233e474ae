//! House cusp computation: Placidus, Equal, Whole-Sign.
//!
//! Ascendant and MC come from the standard spherical-astronomy formulas
//! (Meeus, Ch. 13) over local sidereal time and the obliquity of date.
//! Placidus trisects the diurnal/nocturnal semi-arcs iteratively; Equal and
//! Whole-Sign divide the ecliptic directly. All returned angles are degrees
//! in [0, 360).

use std::f64::consts::{PI, TAU};

use astra_time::lst_rad;

use crate::error::EphemError;
use crate::frames::{centuries_since_j2000, obliquity_of_date_rad};
use crate::options::HouseSystem;

/// Latitude limit for semi-arc (time-based) house systems, degrees.
const MAX_PLACIDUS_LATITUDE_DEG: f64 = 66.5;

/// Twelve cusps plus the chart angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HousesRaw {
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub mc: f64,
    pub system: HouseSystem,
}

/// Compute cusps for a backend letter code (`P`, `E`, `W`).
pub fn compute_houses_by_letter(
    jd_ut: f64,
    lat_deg: f64,
    lon_deg: f64,
    letter: u8,
) -> Result<HousesRaw, EphemError> {
    let Some(system) = HouseSystem::from_letter(letter) else {
        return Err(EphemError::UnsupportedHouseSystem {
            value: char::from(letter).to_string(),
        });
    };

    let lst = lst_rad(jd_ut, lon_deg);
    let eps = obliquity_of_date_rad(centuries_since_j2000(jd_ut));
    let lat_rad = lat_deg.to_radians();
    let (asc_deg, mc_deg) = ascendant_mc_from_lst(lst, lat_rad, eps);

    let cusps = match system {
        HouseSystem::Equal => equal_cusps(asc_deg),
        HouseSystem::WholeSign => whole_sign_cusps(asc_deg),
        HouseSystem::Placidus => {
            if lat_deg.abs() > MAX_PLACIDUS_LATITUDE_DEG {
                return Err(EphemError::HousesCalcFailed {
                    reason: "latitude beyond semi-arc convergence limit".into(),
                });
            }
            placidus_cusps(asc_deg, mc_deg, lst, lat_rad, eps)
        }
    };

    Ok(HousesRaw {
        cusps,
        ascendant: asc_deg,
        mc: mc_deg,
        system,
    })
}

/// Ascendant and MC in degrees from LST, latitude and obliquity.
///
/// `Asc = atan2(-cos LST, sin LST · cos ε + tan φ · sin ε)`
/// `MC  = atan2(sin LST, cos LST · cos ε)`
pub fn ascendant_mc_from_lst(lst_rad: f64, lat_rad: f64, eps_rad: f64) -> (f64, f64) {
    let asc = f64::atan2(
        -lst_rad.cos(),
        lst_rad.sin() * eps_rad.cos() + lat_rad.tan() * eps_rad.sin(),
    )
    .rem_euclid(TAU);
    let mc = f64::atan2(lst_rad.sin(), lst_rad.cos() * eps_rad.cos()).rem_euclid(TAU);
    (asc.to_degrees(), mc.to_degrees())
}

/// Equal division: cusp k = Asc + 30(k-1).
fn equal_cusps(asc_deg: f64) -> [f64; 12] {
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = (asc_deg + 30.0 * i as f64).rem_euclid(360.0);
    }
    cusps
}

/// Whole-Sign: cusp 1 at the start of the Ascendant's sign.
fn whole_sign_cusps(asc_deg: f64) -> [f64; 12] {
    let sign_start = (asc_deg.rem_euclid(360.0) / 30.0).floor() * 30.0;
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = (sign_start + 30.0 * i as f64).rem_euclid(360.0);
    }
    cusps
}

/// Placidus: angular cusps from Asc/MC, intermediate cusps by iterative
/// trisection of the diurnal and nocturnal semi-arcs. RAMC equals LST.
fn placidus_cusps(asc_deg: f64, mc_deg: f64, ramc: f64, lat: f64, eps: f64) -> [f64; 12] {
    let mut cusps = [0.0; 12];
    cusps[0] = asc_deg;
    cusps[3] = (mc_deg + 180.0).rem_euclid(360.0);
    cusps[6] = (asc_deg + 180.0).rem_euclid(360.0);
    cusps[9] = mc_deg;

    // Houses 11, 12: diurnal semi-arc from the MC side.
    cusps[10] = placidus_cusp(ramc, lat, eps, 1.0 / 3.0, true);
    cusps[11] = placidus_cusp(ramc, lat, eps, 2.0 / 3.0, true);

    // Houses 2, 3: nocturnal semi-arc from the IC side.
    cusps[1] = placidus_cusp(ramc + PI, lat, eps, 1.0 / 3.0, false);
    cusps[2] = placidus_cusp(ramc + PI, lat, eps, 2.0 / 3.0, false);

    // Remaining cusps oppose their partners.
    cusps[4] = (cusps[10] + 180.0).rem_euclid(360.0);
    cusps[5] = (cusps[11] + 180.0).rem_euclid(360.0);
    cusps[7] = (cusps[1] + 180.0).rem_euclid(360.0);
    cusps[8] = (cusps[2] + 180.0).rem_euclid(360.0);

    cusps
}

/// One intermediate Placidus cusp by fixed-point iteration on the
/// right ascension, then projection to the ecliptic.
fn placidus_cusp(ramc: f64, lat: f64, eps: f64, fraction: f64, above_horizon: bool) -> f64 {
    let mut ra = if above_horizon {
        ramc + fraction * PI / 2.0
    } else {
        ramc + PI + fraction * PI / 2.0
    };

    for _ in 0..50 {
        let dec = (eps.sin() * ra.sin()).asin();
        let semi_arc = semi_arc_rad(dec, lat, above_horizon);
        let f = fraction * semi_arc;
        let new_ra = if above_horizon { ramc + f } else { ramc + PI + f };
        if (new_ra - ra).abs() < 1e-10 {
            ra = new_ra;
            break;
        }
        ra = new_ra;
    }

    equator_to_ecliptic_longitude_rad(ra, eps)
        .to_degrees()
        .rem_euclid(360.0)
}

/// Diurnal (or nocturnal) semi-arc: `acos(-tan δ · tan φ)`.
fn semi_arc_rad(dec: f64, lat: f64, diurnal: bool) -> f64 {
    let cos_ha = -(dec.tan() * lat.tan());
    let ha = cos_ha.clamp(-1.0, 1.0).acos();
    if diurnal { ha } else { PI - ha }
}

/// Ecliptic longitude of an equatorial point whose declination follows from
/// its right ascension on the ecliptic-projected circle.
fn equator_to_ecliptic_longitude_rad(ra: f64, eps: f64) -> f64 {
    let dec = (eps.sin() * ra.sin()).asin();
    let sin_lon = ra.sin() * eps.cos() + dec.tan() * eps.sin();
    f64::atan2(sin_lon, ra.cos()).rem_euclid(TAU)
}
