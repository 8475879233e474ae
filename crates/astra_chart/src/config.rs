//! Core configuration surface.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use astra_ephem::{BootstrapConfig, EngineKind};

/// Deployment environment; gates internal-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEnv {
    Development,
    Staging,
    Production,
}

impl AppEnv {
    /// Whether administrative overrides are allowed in this environment.
    pub fn allows_internal_overrides(self) -> bool {
        !matches!(self, Self::Production)
    }
}

/// The explicit configuration the assembler consumes.
///
/// One instance per process; no ambient globals besides the bootstrap
/// record and the backend mutex.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Gate for the bootstrap and for `engine=swiss` selection.
    pub swisseph_enabled: bool,
    /// Directory of ephemeris data files.
    pub swisseph_data_path: PathBuf,
    /// Mandatory version tag surfaced in results.
    pub swisseph_path_version: String,
    /// Preferred engine when `accurate = false`.
    pub natal_engine_default: EngineKind,
    /// Allow the administrative override to the simplified engine.
    pub natal_engine_simplified_enabled: bool,
    /// Derive the timezone from coordinates when none is given.
    pub timezone_derivation_enabled: bool,
    pub app_env: AppEnv,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            swisseph_enabled: false,
            swisseph_data_path: PathBuf::new(),
            swisseph_path_version: String::new(),
            natal_engine_default: EngineKind::Simplified,
            natal_engine_simplified_enabled: true,
            timezone_derivation_enabled: false,
            app_env: AppEnv::Development,
        }
    }
}

impl CoreConfig {
    /// Bootstrap configuration for process start, `None` when disabled.
    pub fn bootstrap_config(&self) -> Option<BootstrapConfig> {
        if !self.swisseph_enabled {
            return None;
        }
        Some(BootstrapConfig::new(
            self.swisseph_data_path.clone(),
            self.swisseph_path_version.clone(),
        ))
    }
}
