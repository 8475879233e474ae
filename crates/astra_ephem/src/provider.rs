//! Engine capability seam: planet and house providers.
//!
//! Both engines implement the same contract; the assembler selects one from
//! the request options and never branches on the engine again.

use std::sync::Arc;
use std::time::Instant;

use log::debug;

use astra_metrics::{MetricsSink, metric_name};

use crate::backend::{ModeGuard, ObserverPosition, with_backend};
use crate::error::EphemError;
use crate::houses::{HousesRaw, compute_houses_by_letter};
use crate::options::{EngineKind, Frame, HouseRequest, PlanetOptions, Zodiac};
use crate::planets::{ALL_PLANETS, RawPlanet};
use crate::simplified::simplified_planets;

/// Planet and house computation capability.
pub trait EngineBackend: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Ordered planet states at `jd_ut` under the given options.
    fn calculate_planets(
        &self,
        jd_ut: f64,
        options: &PlanetOptions,
    ) -> Result<Vec<RawPlanet>, EphemError>;

    /// Twelve cusps plus Ascendant/MC at `jd_ut`.
    fn calculate_houses(&self, jd_ut: f64, request: &HouseRequest)
    -> Result<HousesRaw, EphemError>;
}

/// The precision engine over the bootstrapped backend.
pub struct SwissEngine {
    metrics: Arc<dyn MetricsSink>,
}

impl SwissEngine {
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self { metrics }
    }

    fn observer_for(frame: Frame, lat: Option<f64>, lon: Option<f64>, altitude_m: f64)
    -> Result<Option<ObserverPosition>, EphemError> {
        if frame != Frame::Topocentric {
            return Ok(None);
        }
        let (Some(lat_deg), Some(lon_deg)) = (lat, lon) else {
            return Err(EphemError::OptionUnsupported {
                reason: "topocentric frame requires coordinates",
            });
        };
        Ok(Some(ObserverPosition {
            lon_deg,
            lat_deg,
            altitude_m,
        }))
    }
}

impl EngineBackend for SwissEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Swiss
    }

    fn calculate_planets(
        &self,
        jd_ut: f64,
        options: &PlanetOptions,
    ) -> Result<Vec<RawPlanet>, EphemError> {
        let sidereal = match options.zodiac {
            Zodiac::Tropical => None,
            Zodiac::Sidereal => Some(options.ayanamsa.ok_or(EphemError::MissingAyanamsa)?),
        };
        let observer =
            Self::observer_for(options.frame, options.latitude, options.longitude, options.altitude_m)?;

        let started = Instant::now();
        let states = with_backend(|backend| {
            let guard = ModeGuard::new(backend, sidereal, observer);
            Ok(ALL_PLANETS.map(|planet| (planet, guard.backend().planet_state(planet, jd_ut))))
        })?;
        self.metrics.observe_ms(
            &metric_name(
                "swisseph_planets_latency_ms",
                &[("zodiac", options.zodiac.as_str())],
            ),
            started.elapsed().as_secs_f64() * 1e3,
        );

        debug!(
            "planets computed: zodiac_effective={} ayanamsa_effective={}",
            options.zodiac.as_str(),
            sidereal.map_or("n/a", |a| a.as_str()),
        );

        Ok(states
            .into_iter()
            .map(|(planet, state)| RawPlanet {
                planet,
                longitude: state.longitude.rem_euclid(360.0),
                speed_longitude: state.speed_longitude,
                is_retrograde: state.speed_longitude < 0.0,
            })
            .collect())
    }

    fn calculate_houses(
        &self,
        jd_ut: f64,
        request: &HouseRequest,
    ) -> Result<HousesRaw, EphemError> {
        let observer = Self::observer_for(
            request.frame,
            Some(request.latitude),
            Some(request.longitude),
            request.altitude_m,
        )?;
        let system_label = request.system.as_str();

        let started = Instant::now();
        let result = with_backend(|backend| {
            let _mode = ModeGuard::new(backend, None, observer);
            compute_houses_by_letter(jd_ut, request.latitude, request.longitude, request.system.letter())
        });
        self.metrics.observe_ms(
            &metric_name(
                "swisseph_houses_latency_ms",
                &[("house_system", system_label)],
            ),
            started.elapsed().as_secs_f64() * 1e3,
        );
        if result.is_err() {
            self.metrics.incr(&metric_name(
                "swisseph_houses_errors_total",
                &[("house_system", system_label)],
            ));
        }
        result
    }
}

/// The deterministic offline engine. Tropical geocentric only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimplifiedEngine;

impl SimplifiedEngine {
    pub fn new() -> Self {
        Self
    }
}

impl EngineBackend for SimplifiedEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Simplified
    }

    fn calculate_planets(
        &self,
        jd_ut: f64,
        options: &PlanetOptions,
    ) -> Result<Vec<RawPlanet>, EphemError> {
        if options.zodiac != Zodiac::Tropical {
            return Err(EphemError::OptionUnsupported {
                reason: "simplified engine supports the tropical zodiac only",
            });
        }
        if options.frame != Frame::Geocentric {
            return Err(EphemError::OptionUnsupported {
                reason: "simplified engine supports the geocentric frame only",
            });
        }
        Ok(simplified_planets(jd_ut))
    }

    fn calculate_houses(
        &self,
        jd_ut: f64,
        request: &HouseRequest,
    ) -> Result<HousesRaw, EphemError> {
        if request.frame != Frame::Geocentric {
            return Err(EphemError::OptionUnsupported {
                reason: "simplified engine supports the geocentric frame only",
            });
        }
        compute_houses_by_letter(jd_ut, request.latitude, request.longitude, request.system.letter())
    }
}
