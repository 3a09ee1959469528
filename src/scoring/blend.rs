//! @ai:module:intent Blend a primary signal with a conditionally available secondary one
//! @ai:module:layer domain
//! @ai:module:public_api HybridBlender, Signal, SignalBlend
//! @ai:module:stateless true

use crate::benchmarks::{BenchmarkResult, RawMetrics};
use crate::error::BenchError;
use crate::stats::clamp_score;
use serde_json::Value;

/// @ai:intent Partial score produced by one analysis path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signal {
    pub score: f64,
    pub details: Vec<String>,
    pub raw_metrics: RawMetrics,
}

impl Signal {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            ..Default::default()
        }
    }

    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    pub fn metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.raw_metrics.insert(key.to_string(), value.into());
        self
    }
}

/// @ai:intent Outcome of blending, tagged so callers must handle the degraded case
#[derive(Debug, Clone, PartialEq)]
pub enum SignalBlend {
    Blended {
        primary: Signal,
        secondary: Signal,
        score: f64,
    },
    PrimaryOnly {
        primary: Signal,
        reason: String,
    },
}

impl SignalBlend {
    /// @ai:intent Final score; exactly the primary score when the secondary is absent
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        match self {
            SignalBlend::Blended { score, .. } => *score,
            SignalBlend::PrimaryOnly { primary, .. } => primary.score,
        }
    }

    pub fn is_blended(&self) -> bool {
        matches!(self, SignalBlend::Blended { .. })
    }

    /// @ai:intent Convert to a benchmark result, merging details and metrics
    /// @ai:post primary metrics are never overwritten by secondary metrics
    /// @ai:effects pure
    pub fn into_result(self, secondary_label: &str) -> BenchmarkResult {
        let score = self.score();
        match self {
            SignalBlend::Blended {
                primary, secondary, ..
            } => {
                let mut details = primary.details;
                details.extend(secondary.details);

                let mut metrics = primary.raw_metrics;
                for (key, value) in secondary.raw_metrics {
                    metrics.entry(key).or_insert(value);
                }
                metrics.insert("blend_mode".to_string(), Value::from("blended"));
                metrics
                    .entry("primary_score".to_string())
                    .or_insert_with(|| Value::from(primary.score));
                metrics
                    .entry("secondary_score".to_string())
                    .or_insert_with(|| Value::from(secondary.score));

                BenchmarkResult {
                    score,
                    details,
                    raw_metrics: metrics,
                    confidence_interval: None,
                }
            }
            SignalBlend::PrimaryOnly { primary, reason } => {
                let mut details = primary.details;
                details.push(format!(
                    "[Skipped] {} skipped: {}. Score uses the primary signal only.",
                    secondary_label, reason
                ));

                let mut metrics = primary.raw_metrics;
                metrics.insert("blend_mode".to_string(), Value::from("primary_only"));
                metrics
                    .entry("primary_score".to_string())
                    .or_insert_with(|| Value::from(primary.score));
                metrics.insert("secondary_skipped_reason".to_string(), Value::from(reason));

                BenchmarkResult {
                    score,
                    details,
                    raw_metrics: metrics,
                    confidence_interval: None,
                }
            }
        }
    }
}

/// @ai:intent Weighted composition of two signals with an explicit fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridBlender {
    primary_weight: f64,
    secondary_weight: f64,
}

impl HybridBlender {
    /// @ai:intent Create a blender; weights are normalized to sum to one
    /// @ai:pre primary_weight >= 0, secondary_weight >= 0, not both zero
    /// @ai:effects pure
    pub fn new(primary_weight: f64, secondary_weight: f64) -> Self {
        let total = primary_weight + secondary_weight;
        if total > 0.0 && total.is_finite() {
            Self {
                primary_weight: primary_weight / total,
                secondary_weight: secondary_weight / total,
            }
        } else {
            Self {
                primary_weight: 0.5,
                secondary_weight: 0.5,
            }
        }
    }

    /// Static analysis primary (0.6), dynamic scanning secondary (0.4).
    pub fn static_dynamic() -> Self {
        Self::new(0.6, 0.4)
    }

    pub fn weights(&self) -> (f64, f64) {
        (self.primary_weight, self.secondary_weight)
    }

    /// @ai:intent Blend both signals, or fall back to the primary when the secondary failed
    /// @ai:effects pure
    pub fn blend(
        &self,
        primary: Signal,
        secondary: std::result::Result<Signal, BenchError>,
    ) -> SignalBlend {
        match secondary {
            Ok(secondary) => {
                let score = clamp_score(
                    self.primary_weight * primary.score + self.secondary_weight * secondary.score,
                );
                SignalBlend::Blended {
                    primary,
                    secondary,
                    score,
                }
            }
            Err(error) => SignalBlend::PrimaryOnly {
                primary,
                reason: error.to_string(),
            },
        }
    }
}

impl Default for HybridBlender {
    fn default() -> Self {
        Self::static_dynamic()
    }
}
