//! Error type for ephemeris bootstrap and providers.
//!
//! Messages never contain filesystem paths; anything read from the
//! environment is reduced to a file name or a scrubbed reason before it
//! reaches an error value.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from bootstrap, the precision backend or the house provider.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EphemError {
    /// The ephemeris data set is absent or incomplete.
    #[error("ephemeris data missing{}", missing_file.as_deref().map(|f| format!(": {f}")).unwrap_or_default())]
    DataMissing {
        missing_file: Option<String>,
        reason: &'static str,
    },

    /// Backend initialization failed after the data set was located.
    #[error("ephemeris backend initialization failed")]
    InitFailed { reason: String },

    /// The backend is not bootstrapped (or bootstrap failed).
    #[error("ephemeris backend unavailable")]
    EngineUnavailable,

    /// The ayanamsa code is not in the allow-list.
    #[error("unknown ayanamsa '{value}'")]
    InvalidAyanamsa { value: String },

    /// Sidereal computation requested without an ayanamsa.
    #[error("sidereal zodiac requires an ayanamsa")]
    MissingAyanamsa,

    /// The house-system code is not supported.
    #[error("unsupported house system '{value}'")]
    UnsupportedHouseSystem { value: String },

    /// House computation failed; the reason is scrubbed.
    #[error("house calculation failed: {reason}")]
    HousesCalcFailed { reason: String },

    /// The engine cannot honor the requested options.
    #[error("engine option unsupported: {reason}")]
    OptionUnsupported { reason: &'static str },
}

impl EphemError {
    /// Stable error code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DataMissing { .. } => "ephemeris_data_missing",
            Self::InitFailed { .. } => "swisseph_init_failed",
            Self::EngineUnavailable => "natal_engine_unavailable",
            Self::InvalidAyanamsa { .. } => "invalid_ayanamsa",
            Self::MissingAyanamsa => "missing_ayanamsa",
            Self::UnsupportedHouseSystem { .. } => "unsupported_house_system",
            Self::HousesCalcFailed { .. } => "houses_calc_failed",
            Self::OptionUnsupported { .. } => "natal_engine_option_unsupported",
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::EngineUnavailable)
    }

    /// Structured details for the error payload.
    ///
    /// `swisseph_init_failed` intentionally carries empty details; the
    /// scrubbed reason stays in logs.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::DataMissing { missing_file, reason } => {
                if let Some(file) = missing_file {
                    map.insert("missing_file".into(), Value::String(file.clone()));
                }
                map.insert("reason".into(), Value::String((*reason).into()));
            }
            Self::InvalidAyanamsa { value } => {
                map.insert("ayanamsa".into(), Value::String(value.clone()));
            }
            Self::UnsupportedHouseSystem { value } => {
                map.insert("house_system".into(), Value::String(value.clone()));
            }
            Self::HousesCalcFailed { reason } => {
                map.insert("reason".into(), Value::String(reason.clone()));
            }
            Self::OptionUnsupported { reason } => {
                map.insert("reason".into(), Value::String((*reason).into()));
            }
            Self::EngineUnavailable => {
                map.insert("retryable".into(), Value::Bool(true));
            }
            Self::InitFailed { .. } | Self::MissingAyanamsa => {}
        }
        map
    }
}
