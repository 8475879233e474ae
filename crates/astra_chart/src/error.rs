//! Unified error catalog for chart computation.
//!
//! Every failure is a value with a stable `code`, a short message and a
//! structured details map. Errors from the time, reference and ephemeris
//! layers pass through with their own codes.

use serde_json::{Map, Value};
use thiserror::Error;

use astra_ephem::EphemError;
use astra_ref::RefError;
use astra_time::TimeError;

/// Errors surfaced by the natal assembler.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ChartError {
    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Ephemeris(#[from] EphemError),

    #[error(transparent)]
    Reference(#[from] RefError),

    /// Accurate mode needs a time of day.
    #[error("accurate mode requires a birth time")]
    MissingBirthTime,

    /// The swiss engine needs birth coordinates.
    #[error("this computation requires birth coordinates")]
    MissingBirthCoordinates,

    /// Unknown zodiac code.
    #[error("unknown zodiac '{value}'")]
    InvalidZodiac { value: String },

    /// Unknown frame code.
    #[error("unknown frame '{value}'")]
    InvalidFrame { value: String },

    /// An option needs `accurate = true`.
    #[error("accurate mode required: {reason}")]
    AccurateModeRequired { reason: &'static str },

    /// The administrative engine override is not allowed here.
    #[error("engine override is not permitted")]
    EngineOverrideForbidden,

    /// A coherence invariant failed after calculation.
    #[error("natal result failed a coherence invariant: {reason}")]
    InconsistentResult {
        reason: &'static str,
        details: Map<String, Value>,
    },

    /// Cooperative timeout raised between pipeline stages.
    #[error("natal chart generation timed out")]
    GenerationTimeout,
}

impl ChartError {
    /// Stable error code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Time(e) => e.code(),
            Self::Ephemeris(e) => e.code(),
            Self::Reference(e) => e.code(),
            Self::MissingBirthTime => "missing_birth_time",
            Self::MissingBirthCoordinates => "missing_birth_coordinates",
            Self::InvalidZodiac { .. } => "invalid_zodiac",
            Self::InvalidFrame { .. } => "invalid_frame",
            Self::AccurateModeRequired { .. } => "accurate_mode_required",
            Self::EngineOverrideForbidden => "natal_engine_override_forbidden",
            Self::InconsistentResult { .. } => "inconsistent_natal_result",
            Self::GenerationTimeout => "natal_generation_timeout",
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn retryable(&self) -> bool {
        match self {
            Self::GenerationTimeout => true,
            Self::Ephemeris(e) => e.retryable(),
            _ => false,
        }
    }

    /// Structured details for the error payload.
    pub fn details(&self) -> Map<String, Value> {
        match self {
            Self::Time(e) => e.details(),
            Self::Ephemeris(e) => e.details(),
            Self::Reference(e) => e.details(),
            Self::InvalidZodiac { value } => {
                let mut map = Map::new();
                map.insert("zodiac".into(), Value::String(value.clone()));
                map
            }
            Self::InvalidFrame { value } => {
                let mut map = Map::new();
                map.insert("frame".into(), Value::String(value.clone()));
                map
            }
            Self::AccurateModeRequired { reason } => {
                let mut map = Map::new();
                map.insert("reason".into(), Value::String((*reason).into()));
                map
            }
            Self::InconsistentResult { details, .. } => details.clone(),
            Self::GenerationTimeout => {
                let mut map = Map::new();
                map.insert("retryable".into(), Value::Bool(true));
                map
            }
            Self::MissingBirthTime
            | Self::MissingBirthCoordinates
            | Self::EngineOverrideForbidden => Map::new(),
        }
    }
}
