//! @ai:module:intent Benchmark capability, registry and built-in quality benchmarks
//! @ai:module:layer domain
//! @ai:module:public_api Benchmark, BenchmarkRegistry, BenchmarkResult, Codebase, Dimension
//! @ai:module:stateless true

pub mod codebase;
pub mod consistency;
pub mod dimension;
pub mod documentation;
pub mod maintainability;
pub mod performance;
pub mod readability;
pub mod result;
pub mod robustness;
pub mod scalability;
pub mod security;
pub mod testability;

pub use codebase::{Codebase, SourceFile};
pub use consistency::ConsistencyBenchmark;
pub use dimension::Dimension;
pub use documentation::DocumentationBenchmark;
pub use maintainability::MaintainabilityBenchmark;
pub use performance::PerformanceBenchmark;
pub use readability::ReadabilityBenchmark;
pub use result::{BenchmarkResult, RawMetrics, NEUTRAL_SCORE};
pub use robustness::RobustnessBenchmark;
pub use scalability::ScalabilityBenchmark;
pub use security::{HttpProbe, SecurityBenchmark, TargetProbe};
pub use testability::TestabilityBenchmark;

use crate::config::RunSettings;
use crate::error::Result;
use crate::stats::{MetricKind, SizeAdjuster};
use crate::toolchain::ToolRunner;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// @ai:intent Shared capability of every quality benchmark
/// @ai:post errors are converted to degraded results by the runner, never surfaced to the user
#[async_trait]
pub trait Benchmark: Send + Sync {
    fn dimension(&self) -> Dimension;

    /// @ai:intent Score one codebase on this benchmark's dimension
    /// @ai:pre the codebase tree is only read, never written
    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult>;
}

/// @ai:intent Benchmarks keyed by dimension, at most one per dimension
#[derive(Clone, Default)]
pub struct BenchmarkRegistry {
    benchmarks: BTreeMap<Dimension, Arc<dyn Benchmark>>,
}

impl BenchmarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Registry with every built-in benchmark, sharing one tool runner
    /// @ai:effects pure
    pub fn builtin(tools: Arc<dyn ToolRunner>) -> Self {
        Self::new()
            .register(ReadabilityBenchmark::new(tools.clone()))
            .register(MaintainabilityBenchmark::new(tools.clone()))
            .register(PerformanceBenchmark::new(tools.clone()))
            .register(TestabilityBenchmark::new(tools.clone()))
            .register(RobustnessBenchmark::new())
            .register(SecurityBenchmark::new(tools, Arc::new(HttpProbe::new())))
            .register(ScalabilityBenchmark::new())
            .register(DocumentationBenchmark::new())
            .register(ConsistencyBenchmark::new())
    }

    /// @ai:intent Add a benchmark, replacing any previous one for the same dimension
    /// @ai:effects pure
    pub fn register(mut self, benchmark: impl Benchmark + 'static) -> Self {
        self.benchmarks
            .insert(benchmark.dimension(), Arc::new(benchmark));
        self
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        self.benchmarks.keys().copied().collect()
    }

    /// @ai:intent Benchmarks that are not in the skip set, in dimension order
    /// @ai:effects pure
    pub fn enabled(&self, skip: &BTreeSet<Dimension>) -> Vec<Arc<dyn Benchmark>> {
        self.benchmarks
            .iter()
            .filter(|(dimension, _)| !skip.contains(dimension))
            .map(|(_, benchmark)| benchmark.clone())
            .collect()
    }
}

/// @ai:intent Apply the size correction to a result's score and interval
/// @ai:post the unadjusted score and bucket are recorded in raw_metrics
/// @ai:post the interval moves by exactly what the score moved, clamping included
/// @ai:effects pure
pub(crate) fn size_adjusted(
    result: BenchmarkResult,
    codebase: &Codebase,
    kind: MetricKind,
) -> BenchmarkResult {
    let adjuster = SizeAdjuster::new();
    let delta = adjuster.delta(codebase.size_bucket, kind);
    let unadjusted = result.score;
    let score = adjuster.adjust(unadjusted, codebase.size_bucket, kind);
    let shift = if unadjusted.is_finite() {
        score - unadjusted
    } else {
        delta
    };
    let interval = result.confidence_interval.map(|ci| ci.shifted(shift));

    BenchmarkResult {
        score,
        confidence_interval: interval,
        ..result
    }
    .with_metric("unadjusted_score", unadjusted)
    .with_metric("size_adjustment", delta)
    .with_metric("size_bucket", codebase.size_bucket.as_str())
    .with_metric("line_count", codebase.line_count)
}

/// @ai:intent Result for a codebase with no source files to analyze
/// @ai:effects pure
pub(crate) fn no_sources() -> BenchmarkResult {
    BenchmarkResult::new(0.0, vec!["No source files found.".to_string()])
        .with_metric("source_files", 0)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ConfidenceInterval, SizeBucket};
    use crate::toolchain::MockToolRunner;

    #[test]
    fn test_builtin_registry_has_every_dimension() {
        let registry = BenchmarkRegistry::builtin(Arc::new(MockToolRunner::new()));
        assert_eq!(registry.dimensions(), Dimension::ALL.to_vec());
    }

    #[test]
    fn test_enabled_respects_skip_set() {
        let registry = BenchmarkRegistry::builtin(Arc::new(MockToolRunner::new()));
        let skip: BTreeSet<_> = [Dimension::Performance, Dimension::Security].into();
        let enabled: Vec<_> = registry
            .enabled(&skip)
            .iter()
            .map(|b| b.dimension())
            .collect();
        assert_eq!(enabled.len(), Dimension::ALL.len() - 2);
        assert!(!enabled.contains(&Dimension::Performance));
        assert!(!enabled.contains(&Dimension::Security));
    }

    #[test]
    fn test_register_replaces_same_dimension() {
        let registry = BenchmarkRegistry::new()
            .register(RobustnessBenchmark::new())
            .register(RobustnessBenchmark::new());
        assert_eq!(registry.dimensions(), vec![Dimension::Robustness]);
    }

    #[test]
    fn test_size_adjustment_shifts_score_and_interval() {
        let codebase = fixtures::codebase(&[("a.py", "x = 1\n")]);
        assert_eq!(codebase.size_bucket, SizeBucket::Tiny);

        let result = BenchmarkResult::new(6.0, vec![])
            .with_interval(Some(ConfidenceInterval::new(5.5, 6.5)));
        let adjusted = size_adjusted(result, &codebase, MetricKind::VolumeSensitive);

        assert_eq!(adjusted.score, 7.0);
        assert_eq!(adjusted.confidence_interval, Some(ConfidenceInterval::new(6.5, 7.5)));
        assert_eq!(adjusted.raw_metrics["unadjusted_score"], 6.0);
        assert_eq!(adjusted.raw_metrics["size_bucket"], "tiny");
    }

    #[test]
    fn test_clamped_score_stays_inside_its_interval() {
        let codebase = fixtures::codebase(&[("a.py", "x = 1\n")]);
        let result = BenchmarkResult::new(9.8, vec![])
            .with_interval(Some(ConfidenceInterval::new(9.4, 10.2)));

        let adjusted = size_adjusted(result, &codebase, MetricKind::VolumeSensitive);

        assert_eq!(adjusted.score, 10.0);
        let interval = adjusted.confidence_interval.unwrap();
        assert!(interval.lower <= adjusted.score && adjusted.score <= interval.upper);
        assert!((interval.upper - 10.4).abs() < 1e-9);
        assert_eq!(adjusted.raw_metrics["size_adjustment"], 1.0);
    }
}
