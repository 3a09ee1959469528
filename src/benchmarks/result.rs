//! @ai:module:intent Uniform output contract produced by every benchmark
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkResult, RawMetrics, NEUTRAL_SCORE
//! @ai:module:stateless true

use crate::benchmarks::Dimension;
use crate::error::BenchError;
use crate::stats::ConfidenceInterval;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Score substituted when a benchmark could not produce a verdict.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Metric name to numeric or structured value.
pub type RawMetrics = BTreeMap<String, Value>;

/// @ai:intent Score plus the evidence behind it for one dimension and one codebase
/// @ai:invariant score is always present, even for degraded results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub score: f64,
    pub details: Vec<String>,
    #[serde(default)]
    pub raw_metrics: RawMetrics,
    #[serde(default)]
    pub confidence_interval: Option<ConfidenceInterval>,
}

impl BenchmarkResult {
    pub fn new(score: f64, details: Vec<String>) -> Self {
        Self {
            score,
            details,
            raw_metrics: RawMetrics::new(),
            confidence_interval: None,
        }
    }

    /// @ai:intent Attach a raw metric, replacing any previous value under the key
    /// @ai:effects pure
    pub fn with_metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.raw_metrics.insert(key.to_string(), value.into());
        self
    }

    pub fn with_interval(mut self, interval: Option<ConfidenceInterval>) -> Self {
        self.confidence_interval = interval;
        self
    }

    /// @ai:intent Result substituted for a benchmark that failed, timed out or panicked
    /// @ai:post score == NEUTRAL_SCORE and details names the cause
    /// @ai:effects pure
    pub fn degraded(dimension: Dimension, cause: &str, kind: &str) -> Self {
        Self::new(
            NEUTRAL_SCORE,
            vec![format!(
                "[Degraded] {} benchmark could not complete: {}. Neutral score {:.1} substituted.",
                dimension, cause, NEUTRAL_SCORE
            )],
        )
        .with_metric("degraded", true)
        .with_metric("failure_kind", kind)
    }

    /// @ai:intent Degraded result for a typed benchmark error
    /// @ai:effects pure
    pub fn from_error(dimension: Dimension, error: &BenchError) -> Self {
        Self::degraded(dimension, &error.to_string(), error.kind())
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.raw_metrics.get("degraded"), Some(Value::Bool(true)))
    }

    /// @ai:intent Render "7.25" or "7.25 ±0.8" when an interval exists
    /// @ai:effects pure
    pub fn format_score_with_ci(&self) -> String {
        match &self.confidence_interval {
            Some(ci) if !ci.is_point() => format!("{:.2} ±{:.1}", self.score, ci.half_width()),
            _ => format!("{:.2}", self.score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_degraded_result_keeps_score_and_explains() {
        let err = BenchError::Timeout {
            tool: "docker".to_string(),
            limit: Duration::from_secs(120),
        };
        let result = BenchmarkResult::from_error(Dimension::Security, &err);
        assert_eq!(result.score, NEUTRAL_SCORE);
        assert!(result.is_degraded());
        assert!(result.details[0].contains("Security"));
        assert!(result.details[0].contains("120s"));
        assert_eq!(result.raw_metrics["failure_kind"], "timeout");
    }

    #[test]
    fn test_format_score_with_ci() {
        let plain = BenchmarkResult::new(7.254, vec![]);
        assert_eq!(plain.format_score_with_ci(), "7.25");

        let point = plain.clone().with_interval(Some(ConfidenceInterval::new(7.0, 7.0)));
        assert_eq!(point.format_score_with_ci(), "7.25");

        let ranged = plain.with_interval(Some(ConfidenceInterval::new(6.5, 8.0)));
        assert_eq!(ranged.format_score_with_ci(), "7.25 ±0.8");
    }

    #[test]
    fn test_regular_result_is_not_degraded() {
        let result = BenchmarkResult::new(3.0, vec!["real findings".to_string()])
            .with_metric("bandit_high", 2);
        assert!(!result.is_degraded());
        assert_eq!(result.raw_metrics["bandit_high"], 2);
    }
}
