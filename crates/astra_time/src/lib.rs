//! Time preparation for birth events.
//!
//! This crate turns a raw birth event (calendar date, wall-clock time, IANA
//! zone, optional coordinates) into a deterministic instant on the UT/TT
//! scales:
//! - strict local-time attachment (DST folds and gaps are errors, never
//!   silently resolved)
//! - UTC instant, Unix timestamp and Julian Day (UT)
//! - optional ΔT and Julian Day (TT)
//! - Julian-day helpers and sidereal-time formulas shared with the
//!   ephemeris crates

pub mod delta_t;
pub mod error;
pub mod input;
pub mod julian;
pub mod prepare;
pub mod sidereal;
pub mod tzdb;

pub use delta_t::delta_t_seconds;
pub use error::TimeError;
pub use input::BirthInput;
pub use julian::{J2000_JD, JD_UNIX_EPOCH, SECONDS_PER_DAY, decimal_year_from_jd, jd_ut_from_unix};
pub use prepare::{BirthPrepared, TimePreparer, TimeScale, TimezoneSource};
pub use sidereal::{gmst_rad, lst_rad};
pub use tzdb::{IanaTzDatabase, TimezoneDatabase};
