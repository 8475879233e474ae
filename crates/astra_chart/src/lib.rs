//! Natal chart assembly.
//!
//! The [`NatalCalculator`] offers the core's two synchronous operations:
//! `prepare` (birth event → deterministic instant) and `calculate` (birth
//! event + options → coherent [`NatalResult`]). Both are pure given the
//! reference data and the ephemeris bootstrap.

pub mod assemble;
pub mod config;
pub mod error;
pub mod options;
pub mod result;

pub use assemble::{NatalCalculator, TimeoutCheck};
pub use config::{AppEnv, CoreConfig};
pub use error::ChartError;
pub use options::{ChartOptions, ResolvedOptions};
pub use result::{HouseCusp, NatalResult, PlanetPosition};

// The option/result vocabulary callers need alongside the calculator.
pub use astra_aspects::AspectResult;
pub use astra_ephem::{Ayanamsa, EngineKind, Frame, HouseSystem, Zodiac};
pub use astra_ref::{AspectSchool, ReferenceProvider, StaticReferenceProvider};
pub use astra_time::{BirthInput, BirthPrepared, TimeScale, TimezoneSource};
