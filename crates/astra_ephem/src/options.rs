//! Engine, zodiac, frame and house-system vocabulary.

use serde::{Deserialize, Serialize};

use crate::ayanamsa::Ayanamsa;

/// Which computation engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Simplified,
    Swiss,
}

impl EngineKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simplified => "simplified",
            Self::Swiss => "swiss",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "simplified" => Some(Self::Simplified),
            "swiss" => Some(Self::Swiss),
            _ => None,
        }
    }
}

/// Zodiac anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zodiac {
    Tropical,
    Sidereal,
}

impl Zodiac {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tropical => "tropical",
            Self::Sidereal => "sidereal",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "tropical" => Some(Self::Tropical),
            "sidereal" => Some(Self::Sidereal),
            _ => None,
        }
    }
}

/// Observation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    Geocentric,
    Topocentric,
}

impl Frame {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geocentric => "geocentric",
            Self::Topocentric => "topocentric",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "geocentric" => Some(Self::Geocentric),
            "topocentric" => Some(Self::Topocentric),
            _ => None,
        }
    }
}

/// House division method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    Placidus,
    WholeSign,
    Equal,
}

impl HouseSystem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placidus => "placidus",
            Self::WholeSign => "whole_sign",
            Self::Equal => "equal",
        }
    }

    /// Single-letter backend code.
    pub const fn letter(self) -> u8 {
        match self {
            Self::Placidus => b'P',
            Self::WholeSign => b'W',
            Self::Equal => b'E',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "placidus" => Some(Self::Placidus),
            "whole_sign" => Some(Self::WholeSign),
            "equal" => Some(Self::Equal),
            _ => None,
        }
    }

    pub const fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'P' => Some(Self::Placidus),
            b'W' => Some(Self::WholeSign),
            b'E' => Some(Self::Equal),
            _ => None,
        }
    }
}

/// Options resolved for a planet computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetOptions {
    pub zodiac: Zodiac,
    pub ayanamsa: Option<Ayanamsa>,
    pub frame: Frame,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: f64,
}

impl PlanetOptions {
    /// Tropical geocentric defaults.
    pub fn tropical_geocentric() -> Self {
        Self {
            zodiac: Zodiac::Tropical,
            ayanamsa: None,
            frame: Frame::Geocentric,
            latitude: None,
            longitude: None,
            altitude_m: 0.0,
        }
    }
}

/// Options resolved for a house computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub system: HouseSystem,
    pub frame: Frame,
    pub altitude_m: f64,
}
