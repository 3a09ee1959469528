//! @ai:module:intent Severity-tier deduction scoring for tool findings
//! @ai:module:layer domain
//! @ai:module:public_api Severity, FindingCounts, SeverityPenalties, TOOL_FALLBACK_SCORE
//! @ai:module:stateless true

use crate::stats::{clamp_score, SCORE_MAX};
use serde::{Deserialize, Serialize};

/// Score for a signal whose tool could not run at all.
pub const TOOL_FALLBACK_SCORE: f64 = 5.0;

/// @ai:intent Severity tier reported by an analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// @ai:intent Parse a tool's severity label; unknown labels are ignored
    /// @ai:effects pure
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "HIGH" | "CRITICAL" => Some(Severity::High),
            "MEDIUM" | "MODERATE" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// @ai:intent Number of findings per severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl FindingCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}

/// @ai:intent Fixed per-tier penalty weights subtracted from a perfect score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityPenalties {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityPenalties {
    /// Static code scanning (bandit).
    pub const STATIC_SCAN: SeverityPenalties = SeverityPenalties {
        high: 3.0,
        medium: 1.0,
        low: 0.5,
    };

    /// Dynamic application scanning (ZAP baseline).
    pub const DYNAMIC_SCAN: SeverityPenalties = SeverityPenalties {
        high: 4.0,
        medium: 2.0,
        low: 0.5,
    };

    /// @ai:intent Total deduction for a set of findings
    /// @ai:effects pure
    pub fn deduction(&self, counts: &FindingCounts) -> f64 {
        counts.high as f64 * self.high
            + counts.medium as f64 * self.medium
            + counts.low as f64 * self.low
    }

    /// @ai:intent Perfect score minus weighted findings, clamped to the score range
    /// @ai:example (STATIC_SCAN, {high:1, medium:2, low:1}) -> 4.5
    /// @ai:effects pure
    pub fn score(&self, counts: &FindingCounts) -> f64 {
        clamp_score(SCORE_MAX - self.deduction(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_findings_is_perfect() {
        let counts = FindingCounts::default();
        assert_eq!(SeverityPenalties::STATIC_SCAN.score(&counts), 10.0);
        assert_eq!(SeverityPenalties::DYNAMIC_SCAN.score(&counts), 10.0);
    }

    #[test]
    fn test_static_tier_weights() {
        let counts = FindingCounts {
            high: 1,
            medium: 2,
            low: 1,
        };
        assert_eq!(SeverityPenalties::STATIC_SCAN.deduction(&counts), 5.5);
        assert_eq!(SeverityPenalties::STATIC_SCAN.score(&counts), 4.5);
    }

    #[test]
    fn test_dynamic_tier_weights() {
        let counts = FindingCounts {
            high: 1,
            medium: 1,
            low: 2,
        };
        assert_eq!(SeverityPenalties::DYNAMIC_SCAN.score(&counts), 3.0);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let counts = FindingCounts {
            high: 4,
            medium: 0,
            low: 0,
        };
        assert_eq!(SeverityPenalties::STATIC_SCAN.score(&counts), 0.0);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse("medium"), Some(Severity::Medium));
        assert_eq!(Severity::parse(" Low "), Some(Severity::Low));
        assert_eq!(Severity::parse("UNDEFINED"), None);
    }

    #[test]
    fn test_record_and_total() {
        let mut counts = FindingCounts::default();
        counts.record(Severity::High);
        counts.record(Severity::Low);
        counts.record(Severity::Low);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.low, 2);
    }

    #[test]
    fn test_fallback_is_neither_zero_nor_perfect() {
        assert!(TOOL_FALLBACK_SCORE > 0.0 && TOOL_FALLBACK_SCORE < SCORE_MAX);
    }
}
