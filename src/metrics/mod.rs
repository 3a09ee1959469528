//! @ai:module:intent Normalization, weighting and the comparison record
//! @ai:module:layer domain
//! @ai:module:public_api ZScoreNormalizer, WeightedAggregator, Verdict, ComparisonRecord

pub mod aggregator;
pub mod normalizer;
pub mod types;

pub use aggregator::{
    classify_margin, margin_percent, MarginLabel, Totals, Verdict, WeightedAggregator, Winner,
};
pub use normalizer::{NormalizedPair, ZScoreNormalizer};
pub use types::{ComparisonRecord, IntervalPair};
