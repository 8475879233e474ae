//! One-shot ephemeris bootstrap.
//!
//! Validates the data directory, hashes the required files, loads the
//! backend and stores a read-only [`BootstrapRecord`]. Initialization runs
//! once per process; a later call returns the stored record untouched. The
//! reset hook exists for tests only.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{error, info};
use sha2::{Digest, Sha256};

use astra_metrics::{MetricsSink, metric_name};

use crate::backend::{PLANETS_FILE, SwissBackend, install_backend, uninstall_backend_for_tests};
use crate::error::EphemError;

/// Files every data directory must carry when the caller lists none.
pub const DEFAULT_REQUIRED_FILES: [&str; 1] = [PLANETS_FILE];

/// Bootstrap configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub data_path: PathBuf,
    /// Mandatory version tag surfaced in results.
    pub path_version: String,
    /// Files to verify and hash; [`DEFAULT_REQUIRED_FILES`] when `None`.
    pub required_files: Option<Vec<String>>,
    /// When set, the computed hash must match exactly.
    pub expected_path_hash: Option<String>,
}

impl BootstrapConfig {
    pub fn new(data_path: impl Into<PathBuf>, path_version: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            path_version: path_version.into(),
            required_files: None,
            expected_path_hash: None,
        }
    }
}

/// Outcome of the one-shot bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapRecord {
    pub success: bool,
    pub path_version: String,
    /// SHA-256 over the sorted required files, lower-case hex.
    pub path_hash: Option<String>,
    pub error: Option<EphemError>,
}

static RECORD: Mutex<Option<Arc<BootstrapRecord>>> = Mutex::new(None);

/// Run the bootstrap, or return the record of an earlier run.
pub fn initialize(config: &BootstrapConfig, metrics: &dyn MetricsSink) -> Arc<BootstrapRecord> {
    let mut slot = lock_record();
    if let Some(existing) = slot.as_ref() {
        return Arc::clone(existing);
    }

    let (path_hash, outcome) = run_bootstrap(config);
    let record = match outcome {
        Ok(()) => {
            info!(
                "ephemeris bootstrap ok: path_version={} path_hash={}",
                config.path_version,
                path_hash.as_deref().unwrap_or("-")
            );
            BootstrapRecord {
                success: true,
                path_version: config.path_version.clone(),
                path_hash,
                error: None,
            }
        }
        Err(err) => {
            count_bootstrap_error(&err, metrics);
            error!("ephemeris bootstrap failed: code={}", err.code());
            BootstrapRecord {
                success: false,
                path_version: config.path_version.clone(),
                path_hash,
                error: Some(err),
            }
        }
    };

    let record = Arc::new(record);
    *slot = Some(Arc::clone(&record));
    record
}

/// The stored record: `None` before any [`initialize`] call.
pub fn record() -> Option<Arc<BootstrapRecord>> {
    lock_record().as_ref().map(Arc::clone)
}

/// Clear the record and the installed backend. Test hook only.
pub fn reset_state_for_tests() {
    uninstall_backend_for_tests();
    let mut slot = lock_record();
    *slot = None;
}

fn run_bootstrap(config: &BootstrapConfig) -> (Option<String>, Result<(), EphemError>) {
    if config.path_version.trim().is_empty() {
        return (
            None,
            Err(EphemError::InitFailed {
                reason: "path_version must not be empty".into(),
            }),
        );
    }
    let path = &config.data_path;
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return (
            None,
            Err(EphemError::DataMissing {
                missing_file: None,
                reason: "data path not configured",
            }),
        );
    }
    if !path.is_dir() {
        return (
            None,
            Err(EphemError::DataMissing {
                missing_file: None,
                reason: "data path is not a directory",
            }),
        );
    }

    let mut files: Vec<String> = match &config.required_files {
        Some(list) => list.clone(),
        None => DEFAULT_REQUIRED_FILES.iter().map(|f| (*f).to_string()).collect(),
    };
    files.sort();

    for file in &files {
        if !path.join(file).is_file() {
            return (
                None,
                Err(EphemError::DataMissing {
                    missing_file: Some(file.clone()),
                    reason: "required file missing",
                }),
            );
        }
    }

    let mut hasher = Sha256::new();
    for file in &files {
        let bytes = match fs::read(path.join(file)) {
            Ok(bytes) => bytes,
            Err(_) => {
                return (
                    None,
                    Err(EphemError::DataMissing {
                        missing_file: Some(file.clone()),
                        reason: "required file unreadable",
                    }),
                );
            }
        };
        hasher.update(file.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
    }
    let hash = hex::encode(hasher.finalize());

    if let Some(expected) = &config.expected_path_hash
        && expected != &hash
    {
        return (
            Some(hash),
            Err(EphemError::DataMissing {
                missing_file: None,
                reason: "path_hash_mismatch",
            }),
        );
    }

    match SwissBackend::load(path) {
        Ok(backend) => {
            install_backend(backend);
            (Some(hash), Ok(()))
        }
        Err(err) => (Some(hash), Err(err)),
    }
}

fn count_bootstrap_error(err: &EphemError, metrics: &dyn MetricsSink) {
    match err {
        EphemError::DataMissing { .. } => metrics.incr("swisseph_data_missing_total"),
        _ => metrics.incr("swisseph_init_errors_total"),
    }
    metrics.incr(&metric_name("swisseph_errors_total", &[("code", err.code())]));
}

fn lock_record() -> std::sync::MutexGuard<'static, Option<Arc<BootstrapRecord>>> {
    match RECORD.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
