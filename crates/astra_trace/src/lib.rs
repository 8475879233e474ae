//! Reproducibility layer: fingerprints, traces and consistency checks.
//!
//! Every successful chart compute yields a [`ChartResultTrace`] keyed by an
//! input fingerprint and the reference/ruleset versions. Two traces can be
//! compared for consistency; the first mismatch in (versions, fingerprint,
//! payload) order wins.

pub mod consistency;
pub mod fingerprint;
pub mod service;
pub mod store;

pub use consistency::{ConsistencyReason, ConsistencyReport, check_consistency};
pub use fingerprint::input_fingerprint;
pub use service::{ChartService, ServiceError, trace_for_result};
pub use store::{ChartResultTrace, ChartTraceStore, InMemoryTraceStore, TraceError};
