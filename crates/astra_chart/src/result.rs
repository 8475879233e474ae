//! The natal result model.
//!
//! Results are serialized as stored payloads, so the schema stays
//! backward-compatible: payloads written before the engine/zodiac/frame
//! fields existed deserialize with `simplified`/`tropical`/`geocentric`
//! defaults.

use serde::{Deserialize, Serialize};

use astra_aspects::AspectResult;
use astra_ephem::{Ayanamsa, EngineKind, Frame, HouseSystem, Zodiac};
use astra_ref::AspectSchool;
use astra_time::{BirthPrepared, TimeScale};

/// One placed planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet_code: String,
    /// Ecliptic longitude in [0, 360).
    pub longitude: f64,
    pub sign_code: String,
    /// House number in [1, 12].
    pub house_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_retrograde: Option<bool>,
}

/// One house cusp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    pub number: u8,
    /// Cusp longitude in [0, 360).
    pub cusp_longitude: f64,
}

/// A fully assembled, coherent natal chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalResult {
    pub reference_version: String,
    pub ruleset_version: String,
    pub house_system: HouseSystem,
    #[serde(default = "legacy_engine")]
    pub engine: EngineKind,
    #[serde(default = "legacy_zodiac")]
    pub zodiac: Zodiac,
    #[serde(default = "legacy_frame")]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayanamsa: Option<Ayanamsa>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeris_path_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeris_path_hash: Option<String>,
    #[serde(default = "legacy_time_scale")]
    pub time_scale: TimeScale,
    #[serde(default = "legacy_school")]
    pub aspect_school: AspectSchool,
    pub aspect_rules_version: String,
    pub prepared_input: BirthPrepared,
    pub planet_positions: Vec<PlanetPosition>,
    pub houses: Vec<HouseCusp>,
    pub ascendant: f64,
    pub mc: f64,
    pub aspects: Vec<AspectResult>,
}

fn legacy_engine() -> EngineKind {
    EngineKind::Simplified
}

fn legacy_zodiac() -> Zodiac {
    Zodiac::Tropical
}

fn legacy_frame() -> Frame {
    Frame::Geocentric
}

fn legacy_time_scale() -> TimeScale {
    TimeScale::UT
}

fn legacy_school() -> AspectSchool {
    AspectSchool::Modern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_payload_gets_default_regime() {
        // A payload shaped like the pre-engine schema: no engine, zodiac,
        // frame, time_scale or aspect_school fields.
        let json = r#"{
            "reference_version": "2023.4",
            "ruleset_version": "2023.4",
            "house_system": "placidus",
            "aspect_rules_version": "2023.4",
            "prepared_input": {
                "birth_datetime_local": "1990-06-15T10:30:00+02:00",
                "birth_datetime_utc": "1990-06-15T08:30:00+00:00",
                "timestamp_utc": 645438600,
                "jd_ut": 2448057.8541666665,
                "timezone_iana": "Europe/Paris",
                "timezone_source": "user_provided",
                "time_scale": "UT"
            },
            "planet_positions": [],
            "houses": [],
            "ascendant": 12.5,
            "mc": 280.75,
            "aspects": []
        }"#;
        let result: NatalResult = serde_json::from_str(json).expect("legacy payload parses");
        assert_eq!(result.engine, EngineKind::Simplified);
        assert_eq!(result.zodiac, Zodiac::Tropical);
        assert_eq!(result.frame, Frame::Geocentric);
        assert_eq!(result.time_scale, TimeScale::UT);
        assert_eq!(result.aspect_school, AspectSchool::Modern);
        assert!(result.ayanamsa.is_none());
        assert!(result.ephemeris_path_version.is_none());
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let position = PlanetPosition {
            planet_code: "sun".into(),
            longitude: 84.0,
            sign_code: "gemini".into(),
            house_number: 11,
            speed_longitude: None,
            is_retrograde: None,
        };
        let json = serde_json::to_string(&position).unwrap();
        assert!(!json.contains("speed_longitude"));
        assert!(!json.contains("is_retrograde"));
    }
}
