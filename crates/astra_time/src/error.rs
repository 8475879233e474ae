//! Error type for time preparation.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from birth-input validation and time preparation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TimeError {
    /// Shape/length violation on the birth input.
    #[error("invalid birth input: {reason}")]
    InvalidBirthInput { reason: String },

    /// The zone name is not in the IANA database.
    #[error("unknown IANA timezone '{zone}'")]
    InvalidTimezone { zone: String },

    /// No timezone given and coordinate derivation not possible.
    #[error("no timezone available for the birth event")]
    MissingTimezone,

    /// Coordinate-based derivation requested without coordinates.
    #[error("timezone derivation requires birth coordinates")]
    MissingCoordinates,

    /// The local wall-clock occurs twice (DST fold).
    #[error("local time {local} is ambiguous in {zone}")]
    AmbiguousLocalTime {
        local: String,
        zone: String,
        /// The two candidate UTC offsets, earliest first.
        offsets: [String; 2],
    },

    /// The local wall-clock never occurs (DST gap).
    #[error("local time {local} does not exist in {zone}")]
    NonexistentLocalTime { local: String, zone: String },
}

impl TimeError {
    /// Stable error code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBirthInput { .. } => "invalid_birth_input",
            Self::InvalidTimezone { .. } => "invalid_timezone",
            Self::MissingTimezone => "missing_timezone",
            Self::MissingCoordinates => "missing_coordinates",
            Self::AmbiguousLocalTime { .. } => "ambiguous_local_time",
            Self::NonexistentLocalTime { .. } => "nonexistent_local_time",
        }
    }

    /// Structured details for the error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::InvalidBirthInput { reason } => {
                map.insert("reason".into(), Value::String(reason.clone()));
            }
            Self::InvalidTimezone { zone } => {
                map.insert("timezone".into(), Value::String(zone.clone()));
            }
            Self::AmbiguousLocalTime { local, zone, offsets } => {
                map.insert("local_datetime".into(), Value::String(local.clone()));
                map.insert("timezone".into(), Value::String(zone.clone()));
                map.insert(
                    "candidate_offsets".into(),
                    Value::Array(offsets.iter().cloned().map(Value::String).collect()),
                );
            }
            Self::NonexistentLocalTime { local, zone } => {
                map.insert("local_datetime".into(), Value::String(local.clone()));
                map.insert("timezone".into(), Value::String(zone.clone()));
            }
            Self::MissingTimezone | Self::MissingCoordinates => {}
        }
        map
    }
}
