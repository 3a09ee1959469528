//! @ai:module:intent End-to-end comparison: scan, run benchmarks, normalize, weigh, record
//! @ai:module:layer application
//! @ai:module:public_api Comparison, assemble_record
//! @ai:module:stateless false

use crate::benchmarks::{BenchmarkRegistry, Codebase, Dimension};
use crate::config::{CompareConfig, Weights};
use crate::error::Result;
use crate::metrics::{
    ComparisonRecord, IntervalPair, WeightedAggregator, ZScoreNormalizer,
};
use crate::runner::{BenchmarkRunner, RunOutcome, Side};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// @ai:intent Owns the benchmark registry and the cancellation signal for one comparison
pub struct Comparison {
    runner: BenchmarkRunner,
}

impl Comparison {
    pub fn new(registry: BenchmarkRegistry) -> Self {
        Self {
            runner: BenchmarkRunner::new(registry),
        }
    }

    /// @ai:intent Share a cancellation token with the caller, e.g. a Ctrl-C handler
    /// @ai:effects pure
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            runner: self.runner.with_cancellation(token),
        }
    }

    /// @ai:intent Compare two codebase roots under a configuration
    /// @ai:pre both roots are directories
    /// @ai:post Err only for configuration problems, raised before any benchmark starts
    /// @ai:effects fs:read, io, network
    pub async fn run(
        &self,
        first: &Path,
        second: &Path,
        config: &CompareConfig,
    ) -> Result<ComparisonRecord> {
        let settings = Arc::new(config.validate()?);

        let codebase1 = Arc::new(Codebase::scan(first, &settings.source_extensions)?);
        let codebase2 = Arc::new(Codebase::scan(second, &settings.source_extensions)?);
        tracing::info!(
            "Comparing {} ({} files, {} lines, {}) with {} ({} files, {} lines, {})",
            first.display(),
            codebase1.files.len(),
            codebase1.line_count,
            codebase1.size_bucket,
            second.display(),
            codebase2.files.len(),
            codebase2.line_count,
            codebase2.size_bucket
        );

        let outcome = self
            .runner
            .run(codebase1, codebase2, settings.clone())
            .await;

        let record = assemble_record(
            &first.display().to_string(),
            &second.display().to_string(),
            &outcome,
            &settings.weights,
        );

        for side in [Side::First, Side::Second] {
            if record.appears_empty(side) {
                tracing::warn!(
                    "{} appears to be empty or has no analyzable code",
                    record.path(side)
                );
            }
        }
        for dimension in &record.degraded {
            tracing::warn!("{} was scored in degraded mode; see its details", dimension);
        }
        if record.partial {
            tracing::warn!(
                "Run is partial; incomplete dimensions: {:?}",
                record.incomplete
            );
        }

        Ok(record)
    }
}

/// @ai:intent Normalize, weigh and package a run outcome
/// @ai:post skipped and incomplete dimensions appear in no score map and add nothing to the totals
/// @ai:effects pure
pub fn assemble_record(
    codebase1: &str,
    codebase2: &str,
    outcome: &RunOutcome,
    weights: &Weights,
) -> ComparisonRecord {
    let raw: BTreeMap<Dimension, (f64, f64)> = outcome
        .results
        .iter()
        .map(|(dimension, pair)| (*dimension, (pair.first.score, pair.second.score)))
        .collect();

    let normalized = ZScoreNormalizer::new().normalize(&raw);
    let aggregator = WeightedAggregator::new();
    let totals = aggregator.total(&normalized, weights);
    let verdict = aggregator.verdict(totals);

    let mut record = ComparisonRecord {
        codebase1: codebase1.to_string(),
        codebase2: codebase2.to_string(),
        total_score1: totals.first,
        total_score2: totals.second,
        raw_scores1: raw.iter().map(|(d, (a, _))| (*d, *a)).collect(),
        raw_scores2: raw.iter().map(|(d, (_, b))| (*d, *b)).collect(),
        normalized_scores1: normalized.iter().map(|(d, p)| (*d, p.first)).collect(),
        normalized_scores2: normalized.iter().map(|(d, p)| (*d, p.second)).collect(),
        raw_metrics1: BTreeMap::new(),
        raw_metrics2: BTreeMap::new(),
        confidence_intervals: BTreeMap::new(),
        details1: BTreeMap::new(),
        details2: BTreeMap::new(),
        weights: weights.resolved(raw.keys()),
        skipped: outcome.skipped.clone(),
        incomplete: outcome.incomplete.clone(),
        degraded: outcome.degraded_dimensions(),
        partial: outcome.partial,
        verdict,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    for (dimension, pair) in &outcome.results {
        record
            .raw_metrics1
            .insert(*dimension, pair.first.raw_metrics.clone());
        record
            .raw_metrics2
            .insert(*dimension, pair.second.raw_metrics.clone());
        record.details1.insert(*dimension, pair.first.details.clone());
        record.details2.insert(*dimension, pair.second.details.clone());
        record.confidence_intervals.insert(
            *dimension,
            IntervalPair {
                codebase1: pair.first.confidence_interval,
                codebase2: pair.second.confidence_interval,
            },
        );
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures::{always_panics, lines_score, FnBenchmark};
    use crate::benchmarks::{BenchmarkResult, RobustnessBenchmark};
    use crate::error::BenchError;
    use crate::metrics::{MarginLabel, Winner};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn file_count_score(codebase: &Codebase) -> Result<BenchmarkResult> {
        Ok(BenchmarkResult::new(
            (codebase.files.len() as f64 * 2.0).min(10.0),
            vec![format!("{} files", codebase.files.len())],
        ))
    }

    fn registry() -> BenchmarkRegistry {
        BenchmarkRegistry::new()
            .register(FnBenchmark {
                dimension: Dimension::Readability,
                produce: lines_score,
            })
            .register(FnBenchmark {
                dimension: Dimension::Performance,
                produce: file_count_score,
            })
            .register(RobustnessBenchmark::new())
    }

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    const SERVICE: &str = "import logging\n\ndef load(path):\n    try:\n        return open(path).read()\n    except OSError as e:\n        logging.error(e)\n        return None\n";

    #[tokio::test]
    async fn test_identical_codebases_are_comparable() {
        let a = project(&[("svc.py", SERVICE)]);
        let b = project(&[("svc.py", SERVICE)]);

        let record = Comparison::new(registry())
            .run(a.path(), b.path(), &CompareConfig::default())
            .await
            .unwrap();

        assert_eq!(record.verdict.winner, Winner::Tie);
        assert_eq!(record.verdict.label, MarginLabel::Comparable);
        assert_eq!(record.total_score1, record.total_score2);
        for dimension in record.dimensions() {
            assert_eq!(record.normalized_scores1[&dimension], 5.0);
            assert_eq!(record.normalized_scores2[&dimension], 5.0);
        }
    }

    #[tokio::test]
    async fn test_skipped_dimension_is_absent_everywhere() {
        let a = project(&[("svc.py", SERVICE), ("util.py", "x = 1\n")]);
        let b = project(&[("svc.py", SERVICE)]);
        let config = CompareConfig {
            skip: vec!["Performance".to_string()],
            ..CompareConfig::default()
        };

        let record = Comparison::new(registry())
            .run(a.path(), b.path(), &config)
            .await
            .unwrap();

        let performance = Dimension::Performance;
        assert!(!record.raw_scores1.contains_key(&performance));
        assert!(!record.raw_scores2.contains_key(&performance));
        assert!(!record.normalized_scores1.contains_key(&performance));
        assert!(!record.normalized_scores2.contains_key(&performance));
        assert!(!record.weights.contains_key(&performance));
        assert_eq!(record.skipped, vec![performance]);

        let expected: f64 = record.normalized_scores1.values().sum();
        assert_eq!(record.total_score1, expected);
    }

    #[tokio::test]
    async fn test_panicking_benchmark_leaves_others_intact() {
        let a = project(&[("svc.py", SERVICE)]);
        let b = project(&[("svc.py", SERVICE), ("extra.py", "y = 2\n")]);
        let registry = registry().register(FnBenchmark {
            dimension: Dimension::Security,
            produce: always_panics,
        });

        let record = Comparison::new(registry)
            .run(a.path(), b.path(), &CompareConfig::default())
            .await
            .unwrap();

        assert_eq!(record.dimensions().len(), 4);
        assert_eq!(record.degraded, vec![Dimension::Security]);
        assert_eq!(record.raw_scores1[&Dimension::Security], 5.0);
        assert!(record.details1[&Dimension::Security][0].contains("analyzer crashed"));
        assert!(!record.partial);
        assert_eq!(record.raw_scores2[&Dimension::Performance], 4.0);
    }

    #[tokio::test]
    async fn test_config_error_fails_before_running() {
        let a = project(&[("svc.py", SERVICE)]);
        let config = CompareConfig {
            skip: vec!["Style".to_string()],
            ..CompareConfig::default()
        };

        let err = Comparison::new(registry())
            .run(a.path(), a.path(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_root_is_a_config_error() {
        let a = project(&[("svc.py", SERVICE)]);
        let missing = a.path().join("nope");

        let err = Comparison::new(registry())
            .run(a.path(), &missing, &CompareConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_assemble_record_weights_and_intervals() {
        use crate::runner::ResultPair;
        use crate::stats::ConfidenceInterval;

        let mut outcome = RunOutcome::default();
        outcome.results.insert(
            Dimension::Readability,
            ResultPair {
                first: BenchmarkResult::new(10.0, vec![]),
                second: BenchmarkResult::new(0.0, vec![]),
            },
        );
        outcome.results.insert(
            Dimension::Security,
            ResultPair {
                first: BenchmarkResult::new(0.0, vec![])
                    .with_interval(Some(ConfidenceInterval::new(0.0, 1.0))),
                second: BenchmarkResult::new(10.0, vec![]),
            },
        );

        let raw = BTreeMap::from([("Readability".to_string(), 2.0)]);
        let weights = Weights::from_names(&raw).unwrap();
        let record = assemble_record("x", "y", &outcome, &weights);

        assert_eq!(record.total_score1, 20.0);
        assert_eq!(record.total_score2, 10.0);
        assert_eq!(record.verdict.winner, Winner::First);
        assert_eq!(record.weights[&Dimension::Security], 1.0);
        assert_eq!(
            record.confidence_intervals[&Dimension::Security].codebase1,
            Some(ConfidenceInterval::new(0.0, 1.0))
        );
        assert!(!record.appears_empty(Side::Second));
    }
}
