//! @ai:module:intent Statistical helpers for size bias and sampling uncertainty
//! @ai:module:layer domain
//! @ai:module:public_api SizeBucket, SizeAdjuster, MetricKind, ConfidenceEstimator, Estimate, ConfidenceInterval

pub mod confidence;
pub mod size;

pub use confidence::{ConfidenceEstimator, ConfidenceInterval, Estimate};
pub use size::{
    clamp_score, classify, count_non_blank_lines, MetricKind, SizeAdjuster, SizeBucket,
    MAX_ADJUSTMENT, SCORE_MAX, SCORE_MIN,
};
