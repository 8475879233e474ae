//! Error type for reference-data validation and lookup.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from reference-data validation or version lookup.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RefError {
    /// A required collection or field is empty or has the wrong cardinality.
    #[error("invalid reference data: {field}: {reason}")]
    InvalidShape {
        field: &'static str,
        reason: String,
    },

    /// An orb threshold lies outside the accepted range.
    #[error("invalid reference data: aspect '{aspect}' {field} = {value} outside [0, {max}]")]
    OrbOutOfRange {
        aspect: String,
        field: &'static str,
        value: f64,
        max: f64,
    },

    /// The requested reference version is unknown to the provider.
    #[error("reference version '{0}' not found")]
    VersionNotFound(String),
}

impl RefError {
    /// Stable error code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidShape { .. } | Self::OrbOutOfRange { .. } => "invalid_reference_data",
            Self::VersionNotFound(_) => "reference_version_not_found",
        }
    }

    /// Structured details for the error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::InvalidShape { field, reason } => {
                map.insert("field".into(), Value::String((*field).into()));
                map.insert("reason".into(), Value::String(reason.clone()));
            }
            Self::OrbOutOfRange { aspect, field, value, .. } => {
                map.insert("aspect".into(), Value::String(aspect.clone()));
                map.insert("field".into(), Value::String((*field).into()));
                if let Some(num) = serde_json::Number::from_f64(*value) {
                    map.insert("value".into(), Value::Number(num));
                }
            }
            Self::VersionNotFound(version) => {
                map.insert("version".into(), Value::String(version.clone()));
            }
        }
        map
    }
}
