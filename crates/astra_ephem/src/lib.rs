//! Ephemeris bootstrap and the planet/house providers.
//!
//! This crate owns the lifecycle of the precision backend (validated data
//! directory, content hash, process-wide mutex, regime guards) and exposes
//! the two interchangeable engines behind the [`EngineBackend`] capability:
//! the precision `swiss` engine and the deterministic `simplified` engine.

pub mod ayanamsa;
pub mod backend;
pub mod bootstrap;
pub mod error;
pub mod frames;
pub mod houses;
pub mod kepler;
pub mod moon;
pub mod options;
pub mod planets;
pub mod provider;
pub mod simplified;

pub use ayanamsa::{ALL_AYANAMSAS, Ayanamsa};
pub use backend::{ModeGuard, ObserverPosition, PLANETS_FILE, SwissBackend, with_backend};
pub use bootstrap::{
    BootstrapConfig, BootstrapRecord, DEFAULT_REQUIRED_FILES, initialize, record,
    reset_state_for_tests,
};
pub use error::EphemError;
pub use houses::HousesRaw;
pub use options::{EngineKind, Frame, HouseRequest, HouseSystem, PlanetOptions, Zodiac};
pub use planets::{ALL_PLANETS, Planet, RawPlanet};
pub use provider::{EngineBackend, SimplifiedEngine, SwissEngine};
