//! @ai:module:intent Size bucketing and bounded size-bias correction of scores
//! @ai:module:layer domain
//! @ai:module:public_api SizeBucket, MetricKind, SizeAdjuster, classify, MAX_ADJUSTMENT
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower score bound after adjustment.
pub const SCORE_MIN: f64 = 0.0;
/// Upper score bound after adjustment.
pub const SCORE_MAX: f64 = 10.0;

/// Spread between the largest and smallest delta in the adjustment table.
pub const MAX_ADJUSTMENT: f64 = 1.0;

const TINY_LIMIT: usize = 100;
const SMALL_LIMIT: usize = 500;
const MEDIUM_LIMIT: usize = 1000;

/// @ai:intent Discrete size category derived from non-blank source lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Tiny => "tiny",
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @ai:intent Map a line count to its size bucket
/// @ai:post monotonic: a larger line_count never yields a smaller bucket
/// @ai:example (99) -> Tiny
/// @ai:example (1001) -> Large
/// @ai:effects pure
pub fn classify(line_count: usize) -> SizeBucket {
    if line_count < TINY_LIMIT {
        SizeBucket::Tiny
    } else if line_count < SMALL_LIMIT {
        SizeBucket::Small
    } else if line_count <= MEDIUM_LIMIT {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    }
}

/// @ai:intent Count lines that contain anything other than whitespace
/// @ai:effects pure
pub fn count_non_blank_lines(source: &str) -> usize {
    source.lines().filter(|line| !line.trim().is_empty()).count()
}

/// @ai:intent How a metric reacts to codebase size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Metrics driven by absolute volume; small codebases get a bonus.
    VolumeSensitive,
    /// Complexity metrics; large codebases get tolerance.
    Complexity,
    General,
}

/// @ai:intent Applies additive, bounded size corrections to raw scores
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeAdjuster;

impl SizeAdjuster {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Additive correction for a bucket and metric kind
    /// @ai:post 0.0 <= result <= MAX_ADJUSTMENT
    /// @ai:effects pure
    pub fn delta(&self, bucket: SizeBucket, kind: MetricKind) -> f64 {
        match (kind, bucket) {
            (MetricKind::VolumeSensitive, SizeBucket::Tiny) => 1.0,
            (MetricKind::VolumeSensitive, SizeBucket::Small) => 0.5,
            (MetricKind::VolumeSensitive, _) => 0.0,
            (MetricKind::Complexity, SizeBucket::Medium) => 0.25,
            (MetricKind::Complexity, SizeBucket::Large) => 0.5,
            (MetricKind::Complexity, _) => 0.0,
            (MetricKind::General, SizeBucket::Tiny) => 0.5,
            (MetricKind::General, SizeBucket::Small) => 0.25,
            (MetricKind::General, _) => 0.0,
        }
    }

    /// @ai:intent Adjust a raw score for size bias and clamp it to the score range
    /// @ai:post SCORE_MIN <= result <= SCORE_MAX
    /// @ai:effects pure
    pub fn adjust(&self, raw_score: f64, bucket: SizeBucket, kind: MetricKind) -> f64 {
        clamp_score(raw_score + self.delta(bucket, kind))
    }
}

/// @ai:intent Clamp a score into the representable range; NaN maps to the minimum
/// @ai:effects pure
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        SCORE_MIN
    } else {
        score.clamp(SCORE_MIN, SCORE_MAX)
    }
}
