//! Birth event input as received from collaborators.

use serde::{Deserialize, Serialize};

use crate::error::TimeError;

/// Maximum accepted length of the free-text place, in characters.
pub const MAX_PLACE_LEN: usize = 255;

/// A birth event as submitted by a caller.
///
/// Unknown fields are rejected at deserialization; everything else is
/// checked by [`BirthInput::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BirthInput {
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: String,
    /// Wall-clock time: `H:MM`, `HH:MM` or `HH:MM:SS` with optional
    /// fractional seconds. Local midnight when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    /// Free-text place label.
    pub birth_place: String,
    /// IANA zone name; when absent the zone may be derived from coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_timezone: Option<String>,
    /// Latitude in decimal degrees, north positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_lat: Option<f64>,
    /// Longitude in decimal degrees, east positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_lon: Option<f64>,
    /// Opaque handle from an external place-resolution service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_resolved_id: Option<String>,
}

impl BirthInput {
    /// Validate shape and bounds.
    pub fn validate(&self) -> Result<(), TimeError> {
        if self.birth_date.trim().is_empty() {
            return Err(TimeError::InvalidBirthInput {
                reason: "birth_date must not be empty".into(),
            });
        }
        if self.birth_place.chars().count() > MAX_PLACE_LEN {
            return Err(TimeError::InvalidBirthInput {
                reason: format!("birth_place exceeds {MAX_PLACE_LEN} characters"),
            });
        }
        if let Some(lat) = self.birth_lat
            && !(-90.0..=90.0).contains(&lat)
        {
            return Err(TimeError::InvalidBirthInput {
                reason: format!("birth_lat {lat} outside [-90, 90]"),
            });
        }
        if let Some(lon) = self.birth_lon
            && !(-180.0..=180.0).contains(&lon)
        {
            return Err(TimeError::InvalidBirthInput {
                reason: format!("birth_lon {lon} outside [-180, 180]"),
            });
        }
        Ok(())
    }

    /// Whether both coordinates are present.
    pub fn has_coordinates(&self) -> bool {
        self.birth_lat.is_some() && self.birth_lon.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> BirthInput {
        BirthInput {
            birth_date: "1990-06-15".into(),
            birth_time: Some("10:30".into()),
            birth_place: "Paris, France".into(),
            birth_timezone: Some("Europe/Paris".into()),
            birth_lat: Some(48.8566),
            birth_lon: Some(2.3522),
            place_resolved_id: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        minimal().validate().expect("valid input");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let json = r#"{
            "birth_date": "1990-06-15",
            "birth_place": "Paris",
            "favorite_color": "blue"
        }"#;
        assert!(serde_json::from_str::<BirthInput>(json).is_err());
    }

    #[test]
    fn overlong_place_is_rejected() {
        let mut input = minimal();
        input.birth_place = "x".repeat(MAX_PLACE_LEN + 1);
        let err = input.validate().unwrap_err();
        assert_eq!(err.code(), "invalid_birth_input");
    }

    #[test]
    fn place_at_limit_passes() {
        let mut input = minimal();
        input.birth_place = "é".repeat(MAX_PLACE_LEN);
        input.validate().expect("255 chars is fine");
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let mut input = minimal();
        input.birth_lat = Some(95.0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn out_of_range_longitude_is_rejected() {
        let mut input = minimal();
        input.birth_lon = Some(-181.0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn coordinates_detection() {
        let mut input = minimal();
        assert!(input.has_coordinates());
        input.birth_lon = None;
        assert!(!input.has_coordinates());
    }
}
