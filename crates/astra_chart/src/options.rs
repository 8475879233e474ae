//! External chart options and their validated resolution.

use serde::{Deserialize, Serialize};

use astra_ephem::{Ayanamsa, EngineKind, EphemError, Frame, HouseSystem, Zodiac};
use astra_ref::AspectSchool;

use crate::config::CoreConfig;
use crate::error::ChartError;

/// Options as submitted by a caller. Codes are strings and validated by
/// [`ChartOptions::resolve`]; defaults match the tropical geocentric
/// Placidus chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartOptions {
    /// Request the precision engine.
    #[serde(default)]
    pub accurate: bool,
    #[serde(default = "default_zodiac_code")]
    pub zodiac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayanamsa: Option<String>,
    #[serde(default = "default_frame_code")]
    pub frame: String,
    #[serde(default = "default_house_system_code")]
    pub house_system: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(default = "default_school_code")]
    pub aspect_school: String,
    /// Administrative override, internal environments only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_override: Option<String>,
    /// Compute ΔT and carry the TT scale through the preparation.
    #[serde(default)]
    pub tt_enabled: bool,
}

fn default_zodiac_code() -> String {
    Zodiac::Tropical.as_str().to_string()
}

fn default_frame_code() -> String {
    Frame::Geocentric.as_str().to_string()
}

fn default_house_system_code() -> String {
    HouseSystem::Placidus.as_str().to_string()
}

fn default_school_code() -> String {
    AspectSchool::Modern.as_str().to_string()
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            accurate: false,
            zodiac: default_zodiac_code(),
            ayanamsa: None,
            frame: default_frame_code(),
            house_system: default_house_system_code(),
            altitude_m: None,
            aspect_school: default_school_code(),
            engine_override: None,
            tt_enabled: false,
        }
    }
}

/// Options after validation: typed, engine selected, gates applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub engine: EngineKind,
    pub zodiac: Zodiac,
    pub ayanamsa: Option<Ayanamsa>,
    pub frame: Frame,
    pub house_system: HouseSystem,
    /// Observer altitude; `Some` exactly when the frame is topocentric.
    pub altitude_m: Option<f64>,
    pub aspect_school: AspectSchool,
}

impl ChartOptions {
    /// Validate codes and gates and select the engine.
    ///
    /// Ordering follows the assembler pipeline: engine selection first, then
    /// regime gates (sidereal/topocentric demand accurate mode), then the
    /// per-code validations.
    pub fn resolve(&self, config: &CoreConfig) -> Result<ResolvedOptions, ChartError> {
        let engine = self.select_engine(config)?;

        let zodiac = Zodiac::from_code(&self.zodiac).ok_or_else(|| ChartError::InvalidZodiac {
            value: self.zodiac.clone(),
        })?;
        let frame = Frame::from_code(&self.frame).ok_or_else(|| ChartError::InvalidFrame {
            value: self.frame.clone(),
        })?;
        let house_system = HouseSystem::from_code(&self.house_system).ok_or_else(|| {
            ChartError::Ephemeris(EphemError::UnsupportedHouseSystem {
                value: self.house_system.clone(),
            })
        })?;
        let aspect_school = AspectSchool::from_code(&self.aspect_school).ok_or(
            ChartError::Ephemeris(EphemError::OptionUnsupported {
                reason: "unknown aspect school",
            }),
        )?;

        if zodiac == Zodiac::Sidereal && !self.accurate {
            return Err(ChartError::AccurateModeRequired {
                reason: "sidereal zodiac requires accurate mode",
            });
        }
        if frame == Frame::Topocentric && !self.accurate {
            return Err(ChartError::AccurateModeRequired {
                reason: "topocentric frame requires accurate mode",
            });
        }

        let ayanamsa = match zodiac {
            Zodiac::Tropical => None,
            Zodiac::Sidereal => match &self.ayanamsa {
                Some(code) => Some(Ayanamsa::from_code(code)?),
                None => return Err(ChartError::Ephemeris(EphemError::MissingAyanamsa)),
            },
        };

        let altitude_m = match frame {
            Frame::Topocentric => Some(self.altitude_m.unwrap_or(0.0)),
            Frame::Geocentric => None,
        };

        Ok(ResolvedOptions {
            engine,
            zodiac,
            ayanamsa,
            frame,
            house_system,
            altitude_m,
            aspect_school,
        })
    }

    fn select_engine(&self, config: &CoreConfig) -> Result<EngineKind, ChartError> {
        if let Some(code) = &self.engine_override {
            let requested = EngineKind::from_code(code).ok_or(ChartError::Ephemeris(
                EphemError::OptionUnsupported {
                    reason: "unknown engine override",
                },
            ))?;
            if requested == EngineKind::Simplified
                && !(config.natal_engine_simplified_enabled
                    && config.app_env.allows_internal_overrides())
            {
                return Err(ChartError::EngineOverrideForbidden);
            }
            return Ok(requested);
        }
        if self.accurate {
            return Ok(EngineKind::Swiss);
        }
        Ok(config.natal_engine_default)
    }
}
