//! @ai:module:intent Pairwise z-score normalization of one dimension's two raw scores
//! @ai:module:layer domain
//! @ai:module:public_api ZScoreNormalizer, NormalizedPair, MIN_SPREAD
//! @ai:module:stateless true

use crate::benchmarks::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Floor for the pair's spread; differences smaller than this are not magnified.
pub const MIN_SPREAD: f64 = 1.0;
/// Normalized value of a score equal to the pair mean.
pub const CENTER: f64 = 5.0;
/// Normalized distance from the center for a z-score of one.
pub const HALF_RANGE: f64 = 5.0;

/// @ai:intent Normalized scores of both codebases for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPair {
    pub first: f64,
    pub second: f64,
}

/// @ai:intent Rescales each dimension relative to the two codebases being compared
/// @ai:invariant identical raw scores normalize to exactly CENTER on both sides
/// @ai:invariant normalized values lie in [CENTER - HALF_RANGE, CENTER + HALF_RANGE]
#[derive(Debug, Clone, Copy)]
pub struct ZScoreNormalizer {
    min_spread: f64,
}

impl ZScoreNormalizer {
    pub fn new() -> Self {
        Self {
            min_spread: MIN_SPREAD,
        }
    }

    /// @ai:intent Normalize one dimension's pair
    /// @ai:example (10.0, 0.0) -> (10.0, 0.0)
    /// @ai:example (6.0, 5.5) -> (6.25, 3.75)
    /// @ai:edge_cases a non-finite input yields CENTER for both sides
    /// @ai:effects pure
    pub fn normalize_pair(&self, first: f64, second: f64) -> NormalizedPair {
        if first == second || !first.is_finite() || !second.is_finite() {
            return NormalizedPair {
                first: CENTER,
                second: CENTER,
            };
        }

        let mean = (first + second) / 2.0;
        let spread = ((first - second).abs() / 2.0).max(self.min_spread);
        NormalizedPair {
            first: CENTER + HALF_RANGE * (first - mean) / spread,
            second: CENTER + HALF_RANGE * (second - mean) / spread,
        }
    }

    /// @ai:intent Normalize every dimension independently
    /// @ai:effects pure
    pub fn normalize(
        &self,
        raw: &BTreeMap<Dimension, (f64, f64)>,
    ) -> BTreeMap<Dimension, NormalizedPair> {
        raw.iter()
            .map(|(dimension, (first, second))| (*dimension, self.normalize_pair(*first, *second)))
            .collect()
    }
}

impl Default for ZScoreNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_scores_have_zero_difference() {
        let normalizer = ZScoreNormalizer::new();
        for score in [0.0, 3.3, 7.25, 10.0] {
            let pair = normalizer.normalize_pair(score, score);
            assert_eq!(pair, NormalizedPair { first: 5.0, second: 5.0 });
        }
    }

    #[test]
    fn test_wide_gap_maps_to_extremes() {
        let pair = ZScoreNormalizer::new().normalize_pair(10.0, 0.0);
        assert_eq!(pair, NormalizedPair { first: 10.0, second: 0.0 });
    }

    #[test]
    fn test_small_gap_is_damped_by_min_spread() {
        let pair = ZScoreNormalizer::new().normalize_pair(6.0, 5.5);
        assert_eq!(pair, NormalizedPair { first: 6.25, second: 3.75 });
    }

    #[test]
    fn test_scale_independence() {
        // the same relative gap on a wide and a narrow raw scale normalizes identically
        let normalizer = ZScoreNormalizer::new();
        assert_eq!(normalizer.normalize_pair(9.0, 3.0), normalizer.normalize_pair(4.0, 2.0));
    }

    #[test]
    fn test_pair_sums_to_twice_center() {
        let normalizer = ZScoreNormalizer::new();
        for (a, b) in [(1.0, 9.0), (4.2, 4.9), (0.0, 0.5)] {
            let pair = normalizer.normalize_pair(a, b);
            assert!((pair.first + pair.second - 10.0).abs() < 1e-9);
            assert!(pair.first >= 0.0 && pair.first <= 10.0);
        }
    }

    #[test]
    fn test_non_finite_input_is_neutral() {
        let pair = ZScoreNormalizer::new().normalize_pair(f64::NAN, 4.0);
        assert_eq!(pair, NormalizedPair { first: 5.0, second: 5.0 });
    }

    #[test]
    fn test_normalize_is_per_dimension() {
        let raw = BTreeMap::from([
            (Dimension::Security, (8.0, 8.0)),
            (Dimension::Readability, (10.0, 0.0)),
        ]);
        let normalized = ZScoreNormalizer::new().normalize(&raw);
        assert_eq!(normalized[&Dimension::Security].first, 5.0);
        assert_eq!(normalized[&Dimension::Readability].first, 10.0);
    }
}
