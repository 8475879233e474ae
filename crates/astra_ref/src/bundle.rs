//! Reference bundle schema, validation and the builtin seeded bundle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RefError;
use crate::zodiac::SIGN_CODES;

/// Upper bound for every orb threshold, in degrees.
pub const MAX_ORB_DEG: f64 = 15.0;

/// The major aspect codes; everything else in a ruleset is filtered out
/// before aspect enumeration.
pub const MAJOR_ASPECTS: [&str; 5] =
    ["conjunction", "sextile", "square", "trine", "opposition"];

/// Version tag of the builtin bundle.
pub const BUILTIN_REFERENCE_VERSION: &str = "2024.1";

/// Ruleset version tag of the builtin bundle.
pub const BUILTIN_RULESET_VERSION: &str = "2024.1";

/// Named policy set for aspect selection and orb behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectSchool {
    Modern,
    Classic,
    Strict,
}

impl AspectSchool {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Classic => "classic",
            Self::Strict => "strict",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "modern" => Some(Self::Modern),
            "classic" => Some(Self::Classic),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// One planet in the reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetEntry {
    pub code: String,
    pub name: String,
}

/// One zodiac sign in the reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignEntry {
    pub code: String,
    pub name: String,
}

/// One house in the reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseEntry {
    pub number: u8,
    pub name: String,
}

/// One aspect definition in the ruleset.
///
/// `orb_pair_overrides` keys are unordered planet pairs rendered as
/// `"{min}-{max}"` (alphabetical). Older bundles used `orb_pairs` or
/// `orb_overrides` for the same map; both keep parsing as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDef {
    pub code: String,
    pub angle: f64,
    pub default_orb_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_luminaries: Option<f64>,
    #[serde(
        default,
        alias = "orb_pairs",
        alias = "orb_overrides",
        skip_serializing_if = "Option::is_none"
    )]
    pub orb_pair_overrides: Option<BTreeMap<String, f64>>,
}

impl AspectDef {
    /// Whether this definition belongs to the major set.
    pub fn is_major(&self) -> bool {
        MAJOR_ASPECTS.contains(&self.code.as_str())
    }
}

/// A versioned reference bundle: vocabulary plus aspect ruleset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub version: String,
    pub ruleset_version: String,
    pub planets: Vec<PlanetEntry>,
    pub signs: Vec<SignEntry>,
    pub houses: Vec<HouseEntry>,
    pub aspects: Vec<AspectDef>,
}

impl ReferenceData {
    /// Validate shape and bounds.
    ///
    /// Checks, in order: non-empty version tags, non-empty planet list, the
    /// 12 canonical signs in order, 12 houses numbered 1..=12, and for every
    /// aspect a non-empty code, a finite angle in [0, 360] and every orb
    /// threshold finite in [0, 15].
    pub fn validate(&self) -> Result<(), RefError> {
        if self.version.trim().is_empty() {
            return Err(RefError::InvalidShape {
                field: "version",
                reason: "must not be empty".into(),
            });
        }
        if self.ruleset_version.trim().is_empty() {
            return Err(RefError::InvalidShape {
                field: "ruleset_version",
                reason: "must not be empty".into(),
            });
        }
        if self.planets.is_empty() {
            return Err(RefError::InvalidShape {
                field: "planets",
                reason: "must not be empty".into(),
            });
        }
        for planet in &self.planets {
            if planet.code.trim().is_empty() {
                return Err(RefError::InvalidShape {
                    field: "planets",
                    reason: "planet with empty code".into(),
                });
            }
        }
        if self.signs.len() != 12 {
            return Err(RefError::InvalidShape {
                field: "signs",
                reason: format!("expected 12 signs, got {}", self.signs.len()),
            });
        }
        for (idx, sign) in self.signs.iter().enumerate() {
            if sign.code != SIGN_CODES[idx] {
                return Err(RefError::InvalidShape {
                    field: "signs",
                    reason: format!(
                        "sign {} is '{}', expected '{}'",
                        idx, sign.code, SIGN_CODES[idx]
                    ),
                });
            }
        }
        if self.houses.len() != 12 {
            return Err(RefError::InvalidShape {
                field: "houses",
                reason: format!("expected 12 houses, got {}", self.houses.len()),
            });
        }
        for (idx, house) in self.houses.iter().enumerate() {
            if usize::from(house.number) != idx + 1 {
                return Err(RefError::InvalidShape {
                    field: "houses",
                    reason: format!("house {} numbered {}", idx + 1, house.number),
                });
            }
        }
        if self.aspects.is_empty() {
            return Err(RefError::InvalidShape {
                field: "aspects",
                reason: "must not be empty".into(),
            });
        }
        for aspect in &self.aspects {
            self.validate_aspect(aspect)?;
        }
        Ok(())
    }

    fn validate_aspect(&self, aspect: &AspectDef) -> Result<(), RefError> {
        if aspect.code.trim().is_empty() {
            return Err(RefError::InvalidShape {
                field: "aspects",
                reason: "aspect with empty code".into(),
            });
        }
        if !aspect.angle.is_finite() || !(0.0..=360.0).contains(&aspect.angle) {
            return Err(RefError::InvalidShape {
                field: "aspects",
                reason: format!("aspect '{}' angle {} out of range", aspect.code, aspect.angle),
            });
        }
        check_orb(&aspect.code, "default_orb_deg", aspect.default_orb_deg)?;
        if let Some(orb) = aspect.orb_luminaries {
            check_orb(&aspect.code, "orb_luminaries", orb)?;
        }
        if let Some(overrides) = &aspect.orb_pair_overrides {
            for orb in overrides.values() {
                check_orb(&aspect.code, "orb_pair_overrides", *orb)?;
            }
        }
        Ok(())
    }

    /// Aspect definitions restricted to the major set, in bundle order.
    pub fn major_aspects(&self) -> Vec<&AspectDef> {
        self.aspects.iter().filter(|def| def.is_major()).collect()
    }

    /// Sign code for a 0-based sign index.
    pub fn sign_code(&self, index: usize) -> &str {
        &self.signs[index % 12].code
    }

    /// Whether a planet code is part of the vocabulary.
    pub fn knows_planet(&self, code: &str) -> bool {
        self.planets.iter().any(|p| p.code == code)
    }
}

fn check_orb(aspect: &str, field: &'static str, value: f64) -> Result<(), RefError> {
    if !value.is_finite() || !(0.0..=MAX_ORB_DEG).contains(&value) {
        return Err(RefError::OrbOutOfRange {
            aspect: aspect.to_string(),
            field,
            value,
            max: MAX_ORB_DEG,
        });
    }
    Ok(())
}

/// The builtin seeded bundle.
///
/// Ten classical planets, the twelve signs and houses, the five major
/// aspects with classic orb policy (wider luminary orbs, a tighter
/// sun-moon conjunction override) and two minor aspects that exercise the
/// major-set filter downstream.
pub fn builtin() -> ReferenceData {
    let planets = [
        ("sun", "Sun"),
        ("moon", "Moon"),
        ("mercury", "Mercury"),
        ("venus", "Venus"),
        ("mars", "Mars"),
        ("jupiter", "Jupiter"),
        ("saturn", "Saturn"),
        ("uranus", "Uranus"),
        ("neptune", "Neptune"),
        ("pluto", "Pluto"),
    ];
    let sign_names = [
        "Aries", "Taurus", "Gemini", "Cancer", "Leo", "Virgo", "Libra", "Scorpio",
        "Sagittarius", "Capricorn", "Aquarius", "Pisces",
    ];
    let house_names = [
        "Self", "Possessions", "Communication", "Home", "Creativity", "Health",
        "Partnerships", "Transformation", "Philosophy", "Career", "Community", "Unconscious",
    ];

    let mut sun_moon_conjunction = BTreeMap::new();
    sun_moon_conjunction.insert("moon-sun".to_string(), 12.0);

    ReferenceData {
        version: BUILTIN_REFERENCE_VERSION.to_string(),
        ruleset_version: BUILTIN_RULESET_VERSION.to_string(),
        planets: planets
            .iter()
            .map(|(code, name)| PlanetEntry { code: (*code).into(), name: (*name).into() })
            .collect(),
        signs: SIGN_CODES
            .iter()
            .zip(sign_names.iter())
            .map(|(code, name)| SignEntry { code: (*code).into(), name: (*name).into() })
            .collect(),
        houses: (1u8..=12)
            .zip(house_names.iter())
            .map(|(number, name)| HouseEntry { number, name: (*name).into() })
            .collect(),
        aspects: vec![
            AspectDef {
                code: "conjunction".into(),
                angle: 0.0,
                default_orb_deg: 8.0,
                orb_luminaries: Some(10.0),
                orb_pair_overrides: Some(sun_moon_conjunction),
            },
            AspectDef {
                code: "sextile".into(),
                angle: 60.0,
                default_orb_deg: 4.0,
                orb_luminaries: Some(6.0),
                orb_pair_overrides: None,
            },
            AspectDef {
                code: "square".into(),
                angle: 90.0,
                default_orb_deg: 6.0,
                orb_luminaries: Some(8.0),
                orb_pair_overrides: None,
            },
            AspectDef {
                code: "trine".into(),
                angle: 120.0,
                default_orb_deg: 6.0,
                orb_luminaries: Some(8.0),
                orb_pair_overrides: None,
            },
            AspectDef {
                code: "opposition".into(),
                angle: 180.0,
                default_orb_deg: 6.0,
                orb_luminaries: Some(9.0),
                orb_pair_overrides: None,
            },
            AspectDef {
                code: "semisextile".into(),
                angle: 30.0,
                default_orb_deg: 2.0,
                orb_luminaries: None,
                orb_pair_overrides: None,
            },
            AspectDef {
                code: "quincunx".into(),
                angle: 150.0,
                default_orb_deg: 3.0,
                orb_luminaries: None,
                orb_pair_overrides: None,
            },
        ],
    }
}
