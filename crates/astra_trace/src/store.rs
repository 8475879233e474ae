//! Chart trace model and store seam.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One persisted chart computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartResultTrace {
    /// Opaque unique identifier.
    pub chart_id: String,
    pub user_id: String,
    pub reference_version: String,
    pub ruleset_version: String,
    /// 64-hex fingerprint of the canonicalized prepared input + options.
    pub input_hash: String,
    /// Serialized `NatalResult`.
    pub result_payload: String,
    pub created_at: DateTime<Utc>,
}

/// Errors from trace persistence.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TraceError {
    #[error("trace serialization failed: {0}")]
    Serialization(String),

    #[error("trace storage failed: {0}")]
    Storage(String),
}

impl TraceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "trace_serialization_failed",
            Self::Storage(_) => "trace_storage_failed",
        }
    }
}

/// Persistence seam for chart traces.
pub trait ChartTraceStore: Send + Sync {
    fn persist(&self, trace: ChartResultTrace) -> Result<(), TraceError>;

    /// Most recently persisted trace for a user.
    fn get_latest(&self, user_id: &str) -> Result<Option<ChartResultTrace>, TraceError>;

    fn get(&self, chart_id: &str) -> Result<Option<ChartResultTrace>, TraceError>;
}

/// In-memory store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryTraceStore {
    traces: Mutex<Vec<ChartResultTrace>>,
}

impl InMemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.traces.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChartTraceStore for InMemoryTraceStore {
    fn persist(&self, trace: ChartResultTrace) -> Result<(), TraceError> {
        let mut traces = self
            .traces
            .lock()
            .map_err(|_| TraceError::Storage("store lock poisoned".into()))?;
        traces.push(trace);
        Ok(())
    }

    fn get_latest(&self, user_id: &str) -> Result<Option<ChartResultTrace>, TraceError> {
        let traces = self
            .traces
            .lock()
            .map_err(|_| TraceError::Storage("store lock poisoned".into()))?;
        Ok(traces.iter().rev().find(|t| t.user_id == user_id).cloned())
    }

    fn get(&self, chart_id: &str) -> Result<Option<ChartResultTrace>, TraceError> {
        let traces = self
            .traces
            .lock()
            .map_err(|_| TraceError::Storage("store lock poisoned".into()))?;
        Ok(traces.iter().find(|t| t.chart_id == chart_id).cloned())
    }
}
