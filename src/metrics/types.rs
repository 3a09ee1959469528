//! @ai:module:intent Immutable record of one comparison run, shared by export, reports and history
//! @ai:module:layer domain
//! @ai:module:public_api ComparisonRecord, IntervalPair
//! @ai:module:stateless true

use crate::benchmarks::{Dimension, RawMetrics};
use crate::metrics::aggregator::{Verdict, Winner};
use crate::runner::Side;
use crate::stats::ConfidenceInterval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// @ai:intent Confidence intervals of both codebases for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntervalPair {
    pub codebase1: Option<ConfidenceInterval>,
    pub codebase2: Option<ConfidenceInterval>,
}

/// @ai:intent Everything a comparison produced; created once, never mutated
/// @ai:invariant every score map has the same key set, which excludes skipped and incomplete dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub codebase1: String,
    pub codebase2: String,
    pub total_score1: f64,
    pub total_score2: f64,
    pub raw_scores1: BTreeMap<Dimension, f64>,
    pub raw_scores2: BTreeMap<Dimension, f64>,
    pub normalized_scores1: BTreeMap<Dimension, f64>,
    pub normalized_scores2: BTreeMap<Dimension, f64>,
    pub raw_metrics1: BTreeMap<Dimension, RawMetrics>,
    pub raw_metrics2: BTreeMap<Dimension, RawMetrics>,
    pub confidence_intervals: BTreeMap<Dimension, IntervalPair>,
    pub details1: BTreeMap<Dimension, Vec<String>>,
    pub details2: BTreeMap<Dimension, Vec<String>>,
    pub weights: BTreeMap<Dimension, f64>,
    #[serde(default)]
    pub skipped: Vec<Dimension>,
    #[serde(default)]
    pub incomplete: Vec<Dimension>,
    #[serde(default)]
    pub degraded: Vec<Dimension>,
    #[serde(default)]
    pub partial: bool,
    pub verdict: Verdict,
    pub timestamp: String,
}

impl ComparisonRecord {
    /// @ai:intent Dimensions that were scored on both sides
    /// @ai:effects pure
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.raw_scores1.keys().copied().collect()
    }

    pub fn path(&self, side: Side) -> &str {
        match side {
            Side::First => &self.codebase1,
            Side::Second => &self.codebase2,
        }
    }

    /// @ai:intent Whether every raw score of one side is zero, which usually means nothing was analyzable
    /// @ai:edge_cases no scored dimensions -> false
    /// @ai:effects pure
    pub fn appears_empty(&self, side: Side) -> bool {
        let scores = match side {
            Side::First => &self.raw_scores1,
            Side::Second => &self.raw_scores2,
        };
        !scores.is_empty() && scores.values().all(|score| *score == 0.0)
    }

    /// @ai:intent Human verdict sentence using the codebase paths
    /// @ai:effects pure
    pub fn summary(&self) -> String {
        self.verdict.summary(&self.codebase1, &self.codebase2)
    }

    /// @ai:intent Per-dimension winner on normalized scores
    /// @ai:effects pure
    pub fn dimension_winner(&self, dimension: Dimension) -> Option<Winner> {
        let first = self.normalized_scores1.get(&dimension)?;
        let second = self.normalized_scores2.get(&dimension)?;
        Some(if first > second {
            Winner::First
        } else if second > first {
            Winner::Second
        } else {
            Winner::Tie
        })
    }
}
