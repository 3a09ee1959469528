//! @ai:module:intent Testability from line coverage of the codebase's own test suite
//! @ai:module:layer domain
//! @ai:module:public_api TestabilityBenchmark, parse_coverage_percent
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::{BenchError, Result};
use crate::stats::clamp_score;
use crate::toolchain::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const LOW_COVERAGE_PERCENT: f64 = 50.0;
const COVERAGE_REPORT: &str = "coverage.json";

#[derive(Debug, Deserialize)]
struct CoverageReport {
    totals: CoverageTotals,
}

#[derive(Debug, Deserialize)]
struct CoverageTotals {
    percent_covered: f64,
}

/// @ai:intent Extract the total percentage from a coverage.py JSON report
/// @ai:effects pure
pub fn parse_coverage_percent(json: &str) -> Result<f64> {
    let report: CoverageReport = serde_json::from_str(json)
        .map_err(|e| BenchError::parse("pytest", format!("invalid coverage report: {}", e)))?;
    if !report.totals.percent_covered.is_finite() {
        return Err(BenchError::parse("pytest", "coverage percentage is not a number"));
    }
    Ok(report.totals.percent_covered)
}

/// @ai:intent Runs pytest with coverage; all artifacts go to a scratch directory
pub struct TestabilityBenchmark {
    tools: Arc<dyn ToolRunner>,
}

impl TestabilityBenchmark {
    pub fn new(tools: Arc<dyn ToolRunner>) -> Self {
        Self { tools }
    }

    /// @ai:intent pytest invocation that leaves the codebase tree untouched
    /// @ai:effects pure
    fn invocation(codebase: &Codebase, scratch: &Path, settings: &RunSettings) -> ToolInvocation {
        let root = codebase.root.to_string_lossy().into_owned();
        ToolInvocation::new("pytest", settings.tool_timeout)
            .arg(format!("--cov={}", root))
            .arg(format!(
                "--cov-report=json:{}",
                scratch.join(COVERAGE_REPORT).display()
            ))
            .args(["-q", "-p", "no:cacheprovider"])
            .arg(root)
            .current_dir(&codebase.root)
            .env("COVERAGE_FILE", scratch.join(".coverage").to_string_lossy())
            .env("PYTHONDONTWRITEBYTECODE", "1")
    }
}

#[async_trait]
impl Benchmark for TestabilityBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Testability
    }

    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }
        let test_files = codebase.test_files().count();
        if test_files == 0 {
            return Ok(BenchmarkResult::new(
                0.0,
                vec!["No test files found (e.g., files named test_*.py).".to_string()],
            )
            .with_metric("test_files", 0));
        }

        let scratch = TempDir::new()?;
        let output = self
            .tools
            .run(Self::invocation(codebase, scratch.path(), settings))
            .await?;
        tracing::debug!("pytest exited with {:?}", output.exit_code);

        let report_path = scratch.path().join(COVERAGE_REPORT);
        let report = match tokio::fs::read_to_string(&report_path).await {
            Ok(report) => report,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BenchmarkResult::new(
                    0.0,
                    vec![
                        "Coverage report was not generated. Tests may have failed.".to_string(),
                    ],
                )
                .with_metric("test_files", test_files)
                .with_metric("pytest_exit_code", output.exit_code));
            }
            Err(e) => return Err(e.into()),
        };

        let percent = parse_coverage_percent(&report)?;
        let mut details = vec![format!("Test coverage: {:.2}%", percent)];
        if percent < LOW_COVERAGE_PERCENT {
            details.push("Low coverage. Consider adding more tests for critical paths.".to_string());
        }

        Ok(BenchmarkResult::new(clamp_score(percent / 10.0), details)
            .with_metric("coverage_percent", percent)
            .with_metric("test_files", test_files)
            .with_metric("pytest_exit_code", output.exit_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures;
    use crate::toolchain::MockToolRunner;

    #[test]
    fn test_parse_coverage_percent() {
        let json = r#"{"meta": {"version": "7.4.0"}, "files": {}, "totals": {"covered_lines": 80, "num_statements": 100, "percent_covered": 80.0}}"#;
        assert_eq!(parse_coverage_percent(json).unwrap(), 80.0);
    }

    #[test]
    fn test_parse_coverage_rejects_missing_totals() {
        let err = parse_coverage_percent(r#"{"files": {}}"#).unwrap_err();
        assert_eq!(err.kind(), "parse_failure");
    }

    #[test]
    fn test_invocation_writes_only_to_scratch() {
        let codebase = fixtures::codebase(&[("test_a.py", "def test_a():\n    pass\n")]);
        let scratch = Path::new("/tmp/scratch");
        let invocation =
            TestabilityBenchmark::invocation(&codebase, scratch, &RunSettings::default());

        assert!(invocation
            .args
            .contains(&"--cov-report=json:/tmp/scratch/coverage.json".to_string()));
        assert!(invocation.args.contains(&"no:cacheprovider".to_string()));
        assert!(invocation
            .env
            .contains(&("COVERAGE_FILE".to_string(), "/tmp/scratch/.coverage".to_string())));
    }

    #[tokio::test]
    async fn test_no_test_files_scores_zero_without_running_pytest() {
        let tools = Arc::new(MockToolRunner::new());
        let benchmark = TestabilityBenchmark::new(tools.clone());
        let codebase = fixtures::codebase(&[("app.py", "x = 1\n")]);

        let result = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        assert_eq!(result.score, 0.0);
        assert!(tools.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_report_scores_zero() {
        let tools = MockToolRunner::new().with_stdout("pytest", "1 failed");
        let benchmark = TestabilityBenchmark::new(Arc::new(tools));
        let codebase = fixtures::codebase(&[("test_app.py", "def test_x():\n    assert False\n")]);

        let result = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        assert_eq!(result.score, 0.0);
        assert!(result.details[0].contains("not generated"));
    }

    #[tokio::test]
    async fn test_missing_pytest_is_an_error_for_the_runner() {
        let benchmark = TestabilityBenchmark::new(Arc::new(MockToolRunner::new()));
        let codebase = fixtures::codebase(&[("test_app.py", "def test_x():\n    pass\n")]);
        let err = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "tool_unavailable");
    }
}
