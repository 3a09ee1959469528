//! @ai:module:intent Weighted totals and the qualitative verdict between two codebases
//! @ai:module:layer domain
//! @ai:module:public_api WeightedAggregator, Totals, Verdict, Winner, MarginLabel
//! @ai:module:stateless true

use crate::benchmarks::Dimension;
use crate::config::Weights;
use crate::metrics::normalizer::NormalizedPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound (inclusive) of the margin percentage reported as comparable.
pub const COMPARABLE_MAX_PERCENT: f64 = 3.0;
/// Upper bound (inclusive) of "slightly better".
pub const SLIGHT_MAX_PERCENT: f64 = 10.0;
/// Upper bound (inclusive) of "moderately better"; anything above is significant.
pub const MODERATE_MAX_PERCENT: f64 = 25.0;

/// @ai:intent Which codebase has the strictly greater total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    First,
    Second,
    Tie,
}

/// @ai:intent Qualitative size of the gap between the two totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginLabel {
    Comparable,
    SlightlyBetter,
    ModeratelyBetter,
    SignificantlyBetter,
}

impl MarginLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarginLabel::Comparable => "comparable",
            MarginLabel::SlightlyBetter => "slightly better",
            MarginLabel::ModeratelyBetter => "moderately better",
            MarginLabel::SignificantlyBetter => "significantly better",
        }
    }
}

impl fmt::Display for MarginLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @ai:intent Weighted totals of both codebases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub first: f64,
    pub second: f64,
}

/// @ai:intent Winner plus the labelled margin between the totals
/// @ai:invariant winner == Tie implies label == Comparable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub winner: Winner,
    pub margin_percent: f64,
    pub label: MarginLabel,
}

impl Verdict {
    /// @ai:intent One-line human summary naming the leading codebase
    /// @ai:example "./a is moderately better than ./b (14.2% margin)."
    /// @ai:effects pure
    pub fn summary(&self, first: &str, second: &str) -> String {
        let (leader, other) = match self.winner {
            Winner::First => (first, second),
            Winner::Second => (second, first),
            Winner::Tie => {
                return format!("Both codebases are comparable ({} and {}).", first, second)
            }
        };

        if self.label == MarginLabel::Comparable {
            format!(
                "{} and {} are comparable; {} leads by {:.1}%.",
                leader, other, leader, self.margin_percent
            )
        } else {
            format!(
                "{} is {} than {} ({:.1}% margin).",
                leader, self.label, other, self.margin_percent
            )
        }
    }
}

/// @ai:intent Relative gap between totals as a percentage of the larger magnitude
/// @ai:edge_cases both totals zero -> 0.0
/// @ai:effects pure
pub fn margin_percent(first: f64, second: f64) -> f64 {
    let scale = first.abs().max(second.abs());
    if scale == 0.0 {
        return 0.0;
    }
    (first - second).abs() / scale * 100.0
}

/// @ai:intent Map a margin percentage to its label; bounds are inclusive on the lower label
/// @ai:example 3.0 -> Comparable, 3.01 -> SlightlyBetter, 25.0 -> ModeratelyBetter
/// @ai:effects pure
pub fn classify_margin(percent: f64) -> MarginLabel {
    if percent <= COMPARABLE_MAX_PERCENT {
        MarginLabel::Comparable
    } else if percent <= SLIGHT_MAX_PERCENT {
        MarginLabel::SlightlyBetter
    } else if percent <= MODERATE_MAX_PERCENT {
        MarginLabel::ModeratelyBetter
    } else {
        MarginLabel::SignificantlyBetter
    }
}

/// @ai:intent Combines normalized dimension scores into totals and a verdict
pub struct WeightedAggregator;

impl WeightedAggregator {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Weighted sum of both sides over the given dimensions
    /// @ai:post a dimension missing from weights contributes with weight 1.0
    /// @ai:effects pure
    pub fn total(&self, scores: &BTreeMap<Dimension, NormalizedPair>, weights: &Weights) -> Totals {
        scores.iter().fold(
            Totals {
                first: 0.0,
                second: 0.0,
            },
            |acc, (dimension, pair)| {
                let weight = weights.get(*dimension);
                Totals {
                    first: acc.first + weight * pair.first,
                    second: acc.second + weight * pair.second,
                }
            },
        )
    }

    /// @ai:intent Decide the winner by strict greater-than and label the margin
    /// @ai:effects pure
    pub fn verdict(&self, totals: Totals) -> Verdict {
        let winner = if totals.first > totals.second {
            Winner::First
        } else if totals.second > totals.first {
            Winner::Second
        } else {
            Winner::Tie
        };

        let margin = margin_percent(totals.first, totals.second);
        let label = match winner {
            Winner::Tie => MarginLabel::Comparable,
            _ => classify_margin(margin),
        };

        Verdict {
            winner,
            margin_percent: margin,
            label,
        }
    }
}

impl Default for WeightedAggregator {
    fn default() -> Self {
        Self::new()
    }
}
