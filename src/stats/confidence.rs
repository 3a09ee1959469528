//! @ai:module:intent Point estimates and small-sample confidence intervals
//! @ai:module:layer domain
//! @ai:module:public_api ConfidenceEstimator, Estimate, ConfidenceInterval
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// Two-sided 95% Student-t critical values by degrees of freedom.
const T_TABLE_95: [(usize, f64); 34] = [
    (1, 12.706),
    (2, 4.303),
    (3, 3.182),
    (4, 2.776),
    (5, 2.571),
    (6, 2.447),
    (7, 2.365),
    (8, 2.306),
    (9, 2.262),
    (10, 2.228),
    (11, 2.201),
    (12, 2.179),
    (13, 2.160),
    (14, 2.145),
    (15, 2.131),
    (16, 2.120),
    (17, 2.110),
    (18, 2.101),
    (19, 2.093),
    (20, 2.086),
    (21, 2.080),
    (22, 2.074),
    (23, 2.069),
    (24, 2.064),
    (25, 2.060),
    (26, 2.056),
    (27, 2.052),
    (28, 2.048),
    (29, 2.045),
    (30, 2.042),
    (40, 2.021),
    (60, 2.000),
    (120, 1.980),
    (usize::MAX, 1.960),
];

/// @ai:intent Closed interval around an estimate, lower <= upper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// @ai:intent Build an interval, ordering the bounds
    /// @ai:effects pure
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }

    /// @ai:intent Move both bounds by the same amount; bounds are not clamped
    /// @ai:effects pure
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            lower: self.lower + delta,
            upper: self.upper + delta,
        }
    }

    /// @ai:intent Scale both bounds, e.g. to move a 0-100 metric onto the 0-10 score scale
    /// @ai:effects pure
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.lower * factor, self.upper * factor)
    }

    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

/// @ai:intent Mean of repeated measurements plus an interval when variance is observable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub mean: f64,
    pub sample_count: usize,
    /// Sample standard deviation; absent for a single sample.
    pub std_dev: Option<f64>,
    /// Absent for a single sample.
    pub interval: Option<ConfidenceInterval>,
}

/// @ai:intent Derives t-distribution intervals from repeated samples of one metric
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEstimator;

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Estimate mean and 95% interval from samples
    /// @ai:pre samples are measurements of the same metric
    /// @ai:post None when no finite sample exists
    /// @ai:post interval is None for exactly one sample
    /// @ai:post identical samples collapse the interval to that value
    /// @ai:edge_cases non-finite samples are ignored
    /// @ai:effects pure
    pub fn estimate(&self, samples: &[f64]) -> Option<Estimate> {
        let finite: Vec<f64> = samples.iter().copied().filter(|s| s.is_finite()).collect();
        let first = *finite.first()?;
        let n = finite.len();

        let mean = if finite.iter().all(|s| *s == first) {
            first
        } else {
            finite.iter().sum::<f64>() / n as f64
        };

        if n == 1 {
            return Some(Estimate {
                mean,
                sample_count: 1,
                std_dev: None,
                interval: None,
            });
        }

        let variance = finite.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std_dev = variance.sqrt();
        let margin = t_critical_95(n - 1) * std_dev / (n as f64).sqrt();

        Some(Estimate {
            mean,
            sample_count: n,
            std_dev: Some(std_dev),
            interval: Some(ConfidenceInterval {
                lower: mean - margin,
                upper: mean + margin,
            }),
        })
    }
}

/// @ai:intent Critical t value for the largest tabulated df not above `df`
/// @ai:pre df >= 1
/// @ai:effects pure
fn t_critical_95(df: usize) -> f64 {
    T_TABLE_95
        .iter()
        .rev()
        .find(|(tabulated, _)| *tabulated <= df)
        .map(|(_, t)| *t)
        .unwrap_or(T_TABLE_95[0].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_samples_give_no_estimate() {
        assert!(ConfidenceEstimator::new().estimate(&[]).is_none());
        assert!(ConfidenceEstimator::new().estimate(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_single_sample_has_no_interval() {
        let estimate = ConfidenceEstimator::new().estimate(&[7.25]).unwrap();
        assert_eq!(estimate.mean, 7.25);
        assert_eq!(estimate.sample_count, 1);
        assert!(estimate.interval.is_none());
        assert!(estimate.std_dev.is_none());
    }

    #[test]
    fn test_identical_samples_collapse_to_point() {
        let estimate = ConfidenceEstimator::new().estimate(&[0.1, 0.1, 0.1]).unwrap();
        let interval = estimate.interval.unwrap();
        assert!(interval.is_point());
        assert_eq!(interval.lower, 0.1);
        assert_eq!(estimate.mean, 0.1);
    }

    #[test]
    fn test_two_samples_use_df_one() {
        // mean 5, sd = sqrt(2), sem = 1, t(1) = 12.706
        let estimate = ConfidenceEstimator::new().estimate(&[4.0, 6.0]).unwrap();
        let interval = estimate.interval.unwrap();
        assert!((estimate.mean - 5.0).abs() < 1e-12);
        assert!((interval.lower - (5.0 - 12.706)).abs() < 1e-9);
        assert!((interval.upper - (5.0 + 12.706)).abs() < 1e-9);
    }

    #[test]
    fn test_interval_is_not_clamped_to_score_range() {
        let estimate = ConfidenceEstimator::new().estimate(&[9.0, 10.0, 8.0]).unwrap();
        let interval = estimate.interval.unwrap();
        assert!(interval.upper > 10.0);
        assert!(interval.lower < interval.upper);
    }

    #[test]
    fn test_t_critical_lookup_is_conservative_between_rows() {
        assert_eq!(t_critical_95(1), 12.706);
        assert_eq!(t_critical_95(30), 2.042);
        assert_eq!(t_critical_95(35), 2.042);
        assert_eq!(t_critical_95(59), 2.021);
        assert_eq!(t_critical_95(500), 1.980);
    }

    #[test]
    fn test_interval_helpers() {
        let interval = ConfidenceInterval::new(6.0, 4.0);
        assert_eq!(interval.lower, 4.0);
        assert_eq!(interval.half_width(), 1.0);
        assert_eq!(interval.shifted(0.5).upper, 6.5);
        assert!((interval.scaled(0.1).lower - 0.4).abs() < 1e-12);
    }
}
