//! Chart service: compute, fingerprint, persist.

use std::sync::Arc;

use chrono::Utc;
use log::debug;
use thiserror::Error;
use uuid::Uuid;

use astra_chart::{BirthInput, ChartError, ChartOptions, NatalCalculator, NatalResult};

use crate::consistency::{ConsistencyReport, check_consistency};
use crate::fingerprint::input_fingerprint;
use crate::store::{ChartResultTrace, ChartTraceStore, TraceError};

/// Errors from the traced computation flow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Trace(#[from] TraceError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Chart(e) => e.code(),
            Self::Trace(e) => e.code(),
        }
    }
}

/// Build the trace row for a computed result.
pub fn trace_for_result(user_id: &str, result: &NatalResult) -> Result<ChartResultTrace, TraceError> {
    let payload = serde_json::to_string(result)
        .map_err(|e| TraceError::Serialization(e.to_string()))?;
    Ok(ChartResultTrace {
        chart_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        reference_version: result.reference_version.clone(),
        ruleset_version: result.ruleset_version.clone(),
        input_hash: input_fingerprint(result),
        result_payload: payload,
        created_at: Utc::now(),
    })
}

/// Computes charts and records a trace for every successful compute.
pub struct ChartService {
    calculator: NatalCalculator,
    store: Arc<dyn ChartTraceStore>,
}

impl ChartService {
    pub fn new(calculator: NatalCalculator, store: Arc<dyn ChartTraceStore>) -> Self {
        Self { calculator, store }
    }

    pub fn calculator(&self) -> &NatalCalculator {
        &self.calculator
    }

    /// Compute a chart and persist its trace.
    pub fn calculate_and_trace(
        &self,
        user_id: &str,
        input: &BirthInput,
        options: &ChartOptions,
    ) -> Result<(NatalResult, ChartResultTrace), ServiceError> {
        let result = self.calculator.calculate(input, options)?;
        let trace = trace_for_result(user_id, &result)?;
        self.store.persist(trace.clone())?;
        debug!(
            "chart trace persisted: chart_id={} input_hash={}",
            trace.chart_id, trace.input_hash
        );
        Ok((result, trace))
    }

    /// Compare a user's two most relevant traces: the given chart against
    /// the latest stored one.
    pub fn check_against_latest(
        &self,
        user_id: &str,
        trace: &ChartResultTrace,
    ) -> Result<Option<ConsistencyReport>, ServiceError> {
        let latest = self.store.get_latest(user_id)?;
        Ok(latest.map(|other| check_consistency(trace, &other)))
    }
}
