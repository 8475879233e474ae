//! Consistency comparison between two stored traces.

use serde::{Deserialize, Serialize};

use crate::store::ChartResultTrace;

/// Why two traces agree or diverge. First mismatch wins, in comparison
/// order: versions, then input hash, then payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyReason {
    Match,
    VersionMismatch,
    HashMismatch,
    PayloadMismatch,
}

impl ConsistencyReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::VersionMismatch => "version_mismatch",
            Self::HashMismatch => "hash_mismatch",
            Self::PayloadMismatch => "payload_mismatch",
        }
    }
}

/// Outcome of a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub reason: ConsistencyReason,
}

/// Compare two traces: versions, then fingerprint, then payload bytes.
pub fn check_consistency(a: &ChartResultTrace, b: &ChartResultTrace) -> ConsistencyReport {
    if a.reference_version != b.reference_version || a.ruleset_version != b.ruleset_version {
        return ConsistencyReport {
            consistent: false,
            reason: ConsistencyReason::VersionMismatch,
        };
    }
    if a.input_hash != b.input_hash {
        return ConsistencyReport {
            consistent: false,
            reason: ConsistencyReason::HashMismatch,
        };
    }
    if a.result_payload != b.result_payload {
        return ConsistencyReport {
            consistent: false,
            reason: ConsistencyReason::PayloadMismatch,
        };
    }
    ConsistencyReport {
        consistent: true,
        reason: ConsistencyReason::Match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trace() -> ChartResultTrace {
        ChartResultTrace {
            chart_id: "c1".into(),
            user_id: "u1".into(),
            reference_version: "2024.1".into(),
            ruleset_version: "2024.1".into(),
            input_hash: "a".repeat(64),
            result_payload: r#"{"x":1}"#.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn identical_traces_match() {
        let report = check_consistency(&trace(), &trace());
        assert!(report.consistent);
        assert_eq!(report.reason, ConsistencyReason::Match);
    }

    #[test]
    fn reference_version_change_wins_first() {
        let mut other = trace();
        other.reference_version = "2025.1".into();
        // Also diverge the hash: versions are compared first.
        other.input_hash = "b".repeat(64);
        let report = check_consistency(&trace(), &other);
        assert!(!report.consistent);
        assert_eq!(report.reason, ConsistencyReason::VersionMismatch);
    }

    #[test]
    fn ruleset_version_counts_as_version() {
        let mut other = trace();
        other.ruleset_version = "2024.2".into();
        assert_eq!(
            check_consistency(&trace(), &other).reason,
            ConsistencyReason::VersionMismatch
        );
    }

    #[test]
    fn hash_mismatch_beats_payload() {
        let mut other = trace();
        other.input_hash = "b".repeat(64);
        other.result_payload = r#"{"x":2}"#.into();
        assert_eq!(
            check_consistency(&trace(), &other).reason,
            ConsistencyReason::HashMismatch
        );
    }

    #[test]
    fn payload_mismatch_is_last() {
        let mut other = trace();
        other.result_payload = r#"{"x":2}"#.into();
        let report = check_consistency(&trace(), &other);
        assert!(!report.consistent);
        assert_eq!(report.reason, ConsistencyReason::PayloadMismatch);
    }
}
