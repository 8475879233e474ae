//! The stateful precision backend and its process-wide guard.
//!
//! The backend carries mutable regime state (sidereal mode, topocentric
//! observer) exactly like the native ephemeris libraries it stands in for,
//! so every call site goes through the process-wide mutex via
//! [`with_backend`] and scopes regime changes with a [`ModeGuard`], which
//! restores the neutral state on every exit path, including unwinding.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use astra_time::lst_rad;

use crate::ayanamsa::Ayanamsa;
use crate::error::EphemError;
use crate::frames::{
    centuries_since_j2000, ecliptic_to_vector, equatorial_to_ecliptic, general_precession_deg,
    obliquity_of_date_rad, vector_to_ecliptic,
};
use crate::kepler::{ElementsTable, EMBARY_KEY};
use crate::moon::moon_state;
use crate::planets::Planet;

/// File holding the planetary element table inside the data directory.
pub const PLANETS_FILE: &str = "planets_1800_2050.eph";

/// Kilometres per astronomical unit.
const AU_KM: f64 = 149_597_870.7;

/// Equatorial Earth radius in AU.
const EARTH_RADIUS_AU: f64 = 6_378.14 / AU_KM;

/// Polar-to-equatorial radius ratio (WGS-84 flattening).
const EARTH_AXIS_RATIO: f64 = 0.996_647_19;

/// Step for the central-difference longitudinal speed, days.
const SPEED_STEP_DAYS: f64 = 0.05;

/// Topocentric observer location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverPosition {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub altitude_m: f64,
}

/// Longitude and longitudinal speed as read from the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendPlanetState {
    pub longitude: f64,
    pub speed_longitude: f64,
}

/// The precision backend: element table plus regime state.
#[derive(Debug)]
pub struct SwissBackend {
    elements: ElementsTable,
    sidereal: Option<Ayanamsa>,
    observer: Option<ObserverPosition>,
}

impl SwissBackend {
    /// Load the backend from the validated data directory.
    ///
    /// Parse failures surface with the parser's reason only; the path never
    /// reaches the error value.
    pub fn load(data_path: &Path) -> Result<Self, EphemError> {
        let content =
            fs::read_to_string(data_path.join(PLANETS_FILE)).map_err(|_| EphemError::DataMissing {
                missing_file: Some(PLANETS_FILE.to_string()),
                reason: "element table unreadable",
            })?;
        let elements =
            ElementsTable::parse(&content).map_err(|reason| EphemError::InitFailed { reason })?;
        Ok(Self {
            elements,
            sidereal: None,
            observer: None,
        })
    }

    pub fn set_sidereal_mode(&mut self, mode: Option<Ayanamsa>) {
        self.sidereal = mode;
    }

    pub fn sidereal_mode(&self) -> Option<Ayanamsa> {
        self.sidereal
    }

    pub fn set_observer(&mut self, observer: Option<ObserverPosition>) {
        self.observer = observer;
    }

    pub fn observer(&self) -> Option<ObserverPosition> {
        self.observer
    }

    /// Longitude and speed of a planet at `jd`, honoring the current
    /// sidereal/observer state. Speed is a central difference over the full
    /// computation, so retrograde arcs show as negative values.
    pub fn planet_state(&self, planet: Planet, jd: f64) -> BackendPlanetState {
        let longitude = self.longitude_at(planet, jd);
        let ahead = self.longitude_at(planet, jd + SPEED_STEP_DAYS);
        let behind = self.longitude_at(planet, jd - SPEED_STEP_DAYS);
        let speed = signed_arc_deg(ahead, behind) / (2.0 * SPEED_STEP_DAYS);
        BackendPlanetState {
            longitude,
            speed_longitude: speed,
        }
    }

    /// Ecliptic-of-date longitude at `jd` under the current regime state.
    fn longitude_at(&self, planet: Planet, jd: f64) -> f64 {
        let t = centuries_since_j2000(jd);
        let mut v = self.geocentric_of_date_au(planet, jd, t);

        if let Some(observer) = self.observer {
            let eps = obliquity_of_date_rad(t);
            let obs = observer_ecliptic_vector_au(jd, observer, eps);
            v = [v[0] - obs[0], v[1] - obs[1], v[2] - obs[2]];
        }

        let (mut lon, _, _) = vector_to_ecliptic(v);
        if let Some(ayanamsa) = self.sidereal {
            lon -= ayanamsa.offset_deg_at(jd);
        }
        lon.rem_euclid(360.0)
    }

    /// Geocentric position in AU on the ecliptic of date.
    fn geocentric_of_date_au(&self, planet: Planet, jd: f64, t: f64) -> [f64; 3] {
        match planet {
            Planet::Moon => {
                let moon = moon_state(t);
                // The lunar series is already referred to the equinox of date.
                ecliptic_to_vector(moon.lon_deg, moon.lat_deg, moon.distance_km / AU_KM)
            }
            Planet::Sun => {
                let earth = self.heliocentric_embary(t);
                precess_to_date([-earth[0], -earth[1], -earth[2]], t)
            }
            other => {
                let earth = self.heliocentric_embary(t);
                // Table rows are keyed by the planet code.
                let body = self
                    .elements
                    .heliocentric(other.code(), t)
                    .unwrap_or([0.0, 0.0, 0.0]);
                precess_to_date(
                    [body[0] - earth[0], body[1] - earth[1], body[2] - earth[2]],
                    t,
                )
            }
        }
    }

    fn heliocentric_embary(&self, t: f64) -> [f64; 3] {
        self.elements
            .heliocentric(EMBARY_KEY, t)
            .unwrap_or([0.0, 0.0, 0.0])
    }
}

/// Rotate a J2000-ecliptic vector to the ecliptic of date by adding the
/// accumulated general precession to its longitude.
fn precess_to_date(v: [f64; 3], t: f64) -> [f64; 3] {
    let (lon, lat, r) = vector_to_ecliptic(v);
    ecliptic_to_vector(lon + general_precession_deg(t), lat, r)
}

/// Observer position on the ecliptic of date, in AU.
fn observer_ecliptic_vector_au(jd: f64, observer: ObserverPosition, eps: f64) -> [f64; 3] {
    let lat = observer.lat_deg.to_radians();
    let u = (EARTH_AXIS_RATIO * lat.tan()).atan();
    let height_frac = observer.altitude_m / 6_378_140.0;
    let rho_sin = EARTH_AXIS_RATIO * u.sin() + height_frac * lat.sin();
    let rho_cos = u.cos() + height_frac * lat.cos();

    let lst = lst_rad(jd, observer.lon_deg);
    let equatorial = [
        EARTH_RADIUS_AU * rho_cos * lst.cos(),
        EARTH_RADIUS_AU * rho_cos * lst.sin(),
        EARTH_RADIUS_AU * rho_sin,
    ];
    equatorial_to_ecliptic(equatorial, eps)
}

/// Shortest signed arc from `b` to `a`, degrees in (-180, 180].
fn signed_arc_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

// ---------------------------------------------------------------------------
// Process-wide backend slot
// ---------------------------------------------------------------------------

static BACKEND: Mutex<Option<SwissBackend>> = Mutex::new(None);

/// Install the bootstrapped backend. Called once by the bootstrap.
pub(crate) fn install_backend(backend: SwissBackend) {
    let mut slot = lock_backend();
    *slot = Some(backend);
}

/// Drop the installed backend. Test hook only.
pub fn uninstall_backend_for_tests() {
    let mut slot = lock_backend();
    *slot = None;
}

/// Run `f` against the installed backend under the process-wide mutex.
///
/// The closure is the minimum scope around backend primitives; callers do
/// pre-computation and post-normalization outside.
pub fn with_backend<T>(
    f: impl FnOnce(&mut SwissBackend) -> Result<T, EphemError>,
) -> Result<T, EphemError> {
    let mut slot = lock_backend();
    match slot.as_mut() {
        Some(backend) => f(backend),
        None => Err(EphemError::EngineUnavailable),
    }
}

fn lock_backend() -> std::sync::MutexGuard<'static, Option<SwissBackend>> {
    // A poisoned lock only means a panic elsewhere while holding it; guards
    // have already restored the neutral regime state by then.
    match BACKEND.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Scoped regime change: sets sidereal mode and observer on construction,
/// restores the neutral state on drop — on success, error and unwind alike.
pub struct ModeGuard<'a> {
    backend: &'a mut SwissBackend,
}

impl<'a> ModeGuard<'a> {
    pub fn new(
        backend: &'a mut SwissBackend,
        sidereal: Option<Ayanamsa>,
        observer: Option<ObserverPosition>,
    ) -> Self {
        backend.set_sidereal_mode(sidereal);
        backend.set_observer(observer);
        Self { backend }
    }

    pub fn backend(&self) -> &SwissBackend {
        self.backend
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.backend.set_sidereal_mode(None);
        self.backend.set_observer(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_time::J2000_JD;

    fn test_backend() -> SwissBackend {
        let manifest = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        SwissBackend::load(&manifest.join("../../ephe")).expect("workspace ephe data")
    }

    #[test]
    fn sun_longitude_at_j2000() {
        let backend = test_backend();
        let state = backend.planet_state(Planet::Sun, J2000_JD);
        assert!(
            (state.longitude - 280.46).abs() < 0.3,
            "Sun λ(J2000) = {}",
            state.longitude
        );
    }

    #[test]
    fn sun_speed_about_one_degree_per_day() {
        let backend = test_backend();
        let state = backend.planet_state(Planet::Sun, J2000_JD);
        assert!(
            (state.speed_longitude - 1.0).abs() < 0.05,
            "Sun speed = {}",
            state.speed_longitude
        );
        assert!(state.speed_longitude > 0.0);
    }

    #[test]
    fn moon_speed_about_thirteen_degrees_per_day() {
        let backend = test_backend();
        let state = backend.planet_state(Planet::Moon, J2000_JD);
        assert!(
            (11.0..16.0).contains(&state.speed_longitude),
            "Moon speed = {}",
            state.speed_longitude
        );
    }

    #[test]
    fn mode_guard_restores_neutral_state() {
        let mut backend = test_backend();
        {
            let guard = ModeGuard::new(
                &mut backend,
                Some(Ayanamsa::Lahiri),
                Some(ObserverPosition { lon_deg: 2.35, lat_deg: 48.85, altitude_m: 35.0 }),
            );
            assert_eq!(guard.backend().sidereal_mode(), Some(Ayanamsa::Lahiri));
            assert!(guard.backend().observer().is_some());
        }
        assert_eq!(backend.sidereal_mode(), None);
        assert_eq!(backend.observer(), None);
    }

    #[test]
    fn mode_guard_restores_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let mut backend = test_backend();
            let _guard = ModeGuard::new(&mut backend, Some(Ayanamsa::Raman), None);
            panic!("mid-computation failure");
        });
        assert!(result.is_err());
        // Fresh backend state is neutral; the guard ran its drop during unwind.
    }

    #[test]
    fn sidereal_shifts_by_ayanamsa() {
        let mut backend = test_backend();
        let tropical = backend.planet_state(Planet::Sun, J2000_JD).longitude;
        backend.set_sidereal_mode(Some(Ayanamsa::Lahiri));
        let sidereal = backend.planet_state(Planet::Sun, J2000_JD).longitude;
        backend.set_sidereal_mode(None);

        let offset = (tropical - sidereal).rem_euclid(360.0);
        let expected = Ayanamsa::Lahiri.offset_deg_at(J2000_JD);
        assert!(
            (offset - expected).abs() < 1e-9,
            "tropical - sidereal = {offset}, ayanamsa = {expected}"
        );
    }

    #[test]
    fn topocentric_moon_parallax_is_visible() {
        let mut backend = test_backend();
        let geo = backend.planet_state(Planet::Moon, J2000_JD).longitude;
        backend.set_observer(Some(ObserverPosition {
            lon_deg: 2.35,
            lat_deg: 48.85,
            altitude_m: 35.0,
        }));
        let topo = backend.planet_state(Planet::Moon, J2000_JD).longitude;
        backend.set_observer(None);

        let shift = signed_arc_deg(topo, geo).abs();
        assert!(shift > 0.01, "lunar parallax shift = {shift}°");
        assert!(shift < 1.5, "lunar parallax shift = {shift}°");
    }

    #[test]
    fn signed_arc_wraps() {
        assert!((signed_arc_deg(359.0, 1.0) - -2.0).abs() < 1e-12);
        assert!((signed_arc_deg(1.0, 359.0) - 2.0).abs() < 1e-12);
    }

    // Compile-time assertion: the backend slot is shared across threads.
    #[allow(dead_code)]
    const _: () = {
        fn assert_send<T: Send>() {}
        fn check() {
            assert_send::<SwissBackend>();
        }
    };
}
