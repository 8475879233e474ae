//! Obliquity, precession and coordinate conversions.
//!
//! Everything downstream works on the ecliptic of date: body vectors are
//! propagated in the J2000 ecliptic and rotated forward by the IAU 2006
//! general precession in longitude; the observer vector is built on the
//! equator of date and tilted down by the mean obliquity of date.

use astra_time::J2000_JD;

/// Julian centuries of TT since J2000.0.
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000_JD) / 36525.0
}

/// IAU 2006 general precession in ecliptic longitude, degrees.
///
/// Dominant linear term ~1.3969°/century; zero at J2000.0.
pub fn general_precession_deg(t_centuries: f64) -> f64 {
    let t = t_centuries;
    let t2 = t * t;
    let arcsec = 5028.796195 * t + 1.1054348 * t2 + 0.00007964 * t2 * t
        - 0.000023857 * t2 * t2
        - 0.0000000383 * t2 * t2 * t;
    arcsec / 3600.0
}

/// Mean obliquity of the ecliptic of date, radians (IAU 1980 polynomial).
pub fn obliquity_of_date_rad(t_centuries: f64) -> f64 {
    let t = t_centuries;
    let arcsec = 84381.448 - 46.8150 * t - 0.00059 * t * t + 0.001813 * t * t * t;
    (arcsec / 3600.0).to_radians()
}

/// Ecliptic longitude/latitude (degrees) and distance from a Cartesian
/// vector. Longitude lands in [0, 360).
pub fn vector_to_ecliptic(v: [f64; 3]) -> (f64, f64, f64) {
    let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if r == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let lon = v[1].atan2(v[0]).to_degrees().rem_euclid(360.0);
    let lat = (v[2] / r).asin().to_degrees();
    (lon, lat, r)
}

/// Cartesian vector from ecliptic longitude/latitude (degrees) and distance.
pub fn ecliptic_to_vector(lon_deg: f64, lat_deg: f64, r: f64) -> [f64; 3] {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    [
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    ]
}

/// Rotate an equatorial vector into the ecliptic (rotation about +x by ε).
pub fn equatorial_to_ecliptic(v: [f64; 3], eps_rad: f64) -> [f64; 3] {
    let (sin_e, cos_e) = eps_rad.sin_cos();
    [
        v[0],
        v[1] * cos_e + v[2] * sin_e,
        -v[1] * sin_e + v[2] * cos_e,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precession_zero_at_j2000() {
        assert_eq!(general_precession_deg(0.0), 0.0);
    }

    #[test]
    fn precession_rate_per_century() {
        let p = general_precession_deg(1.0);
        assert!((p - 1.3972).abs() < 0.001, "p_A(1.0) = {p}°");
    }

    #[test]
    fn obliquity_j2000() {
        let eps = obliquity_of_date_rad(0.0).to_degrees();
        assert!((eps - 23.439_291).abs() < 1e-5, "ε(J2000) = {eps}°");
    }

    #[test]
    fn obliquity_decreases() {
        assert!(obliquity_of_date_rad(1.0) < obliquity_of_date_rad(0.0));
    }

    #[test]
    fn spherical_roundtrip() {
        let v = ecliptic_to_vector(123.456, -4.2, 1.5);
        let (lon, lat, r) = vector_to_ecliptic(v);
        assert!((lon - 123.456).abs() < 1e-10);
        assert!((lat - -4.2).abs() < 1e-10);
        assert!((r - 1.5).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_degenerates_cleanly() {
        assert_eq!(vector_to_ecliptic([0.0, 0.0, 0.0]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn equatorial_rotation_preserves_x() {
        let eps = obliquity_of_date_rad(0.0);
        let v = equatorial_to_ecliptic([1.0, 0.0, 0.0], eps);
        assert!((v[0] - 1.0).abs() < 1e-15);
        assert!(v[1].abs() < 1e-15 && v[2].abs() < 1e-15);
    }

    #[test]
    fn pole_maps_to_ecliptic_pole_offset() {
        // The celestial pole sits ε away from the ecliptic pole.
        let eps = obliquity_of_date_rad(0.0);
        let v = equatorial_to_ecliptic([0.0, 0.0, 1.0], eps);
        let (_, lat, _) = vector_to_ecliptic(v);
        assert!((lat - (90.0 - eps.to_degrees())).abs() < 1e-9);
    }
}
