//! @ai:module:intent Performance from static anti-patterns blended with runtime profiling
//! @ai:module:layer domain
//! @ai:module:public_api PerformanceBenchmark, AntiPatternScan, AntiPatternScanner, time_tier_score
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::{BenchError, Result};
use crate::scoring::{HybridBlender, Signal};
use crate::stats::{clamp_score, ConfidenceEstimator, MetricKind, SCORE_MAX};
use crate::toolchain::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tokio::time::Instant;

const INSERT_FRONT_PENALTY: f64 = 1.0;
const LOOP_CONCAT_PENALTY: f64 = 0.5;
const NESTED_LOOP_PENALTY: f64 = 0.3;
const STATIC_WEIGHT: f64 = 0.4;
const DYNAMIC_WEIGHT: f64 = 0.6;
/// Share of the benchmark time limit that profiling runs may consume.
const PROFILE_BUDGET_SHARE: f64 = 0.5;

/// @ai:intent Wall-clock tier score for one profiling run
/// @ai:example (99.0) -> 10.0
/// @ai:example (2000.0) -> 2.0
/// @ai:edge_cases runs straddling a tier boundary, e.g. 99 ms and 101 ms, score two points apart
/// @ai:effects pure
pub fn time_tier_score(elapsed_ms: f64) -> f64 {
    if elapsed_ms < 100.0 {
        10.0
    } else if elapsed_ms < 500.0 {
        8.0
    } else if elapsed_ms < 1000.0 {
        6.0
    } else if elapsed_ms < 2000.0 {
        4.0
    } else {
        2.0
    }
}

/// @ai:intent Accumulated anti-pattern penalty and its findings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AntiPatternScan {
    pub penalty: f64,
    pub findings: Vec<String>,
}

impl AntiPatternScan {
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        clamp_score(SCORE_MAX - self.penalty)
    }
}

/// An open `for`/`while` block.
struct OpenLoop {
    indent: usize,
    is_for: bool,
}

/// @ai:intent Indentation-aware detector for common performance anti-patterns
pub struct AntiPatternScanner {
    insert_front: Regex,
    loop_header: Regex,
    name_concat: Regex,
}

impl AntiPatternScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            insert_front: Regex::new(r"\.insert\(\s*0\s*,")?,
            loop_header: Regex::new(r"^(async\s+)?(for|while)\b")?,
            name_concat: Regex::new(r"^[A-Za-z_]\w*\s*\+=")?,
        })
    }

    /// @ai:intent Scan one file, accumulating into `scan`
    /// @ai:post every enclosing `for` of a `for` header adds one nested-loop penalty
    /// @ai:effects pure
    pub fn scan_source(&self, path: &str, source: &str, scan: &mut AntiPatternScan) {
        let mut open: Vec<OpenLoop> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let code = raw.trim_start();
            if code.is_empty() || code.starts_with('#') {
                continue;
            }
            let indent = raw.len() - code.len();
            while open.last().is_some_and(|l| l.indent >= indent) {
                open.pop();
            }

            if self.insert_front.is_match(code) {
                scan.penalty += INSERT_FRONT_PENALTY;
                scan.findings
                    .push(format!("Inefficient 'list.insert(0, ...)' at {}:{}", path, line_no));
            }

            if !open.is_empty() && self.name_concat.is_match(code) {
                scan.penalty += LOOP_CONCAT_PENALTY;
                scan.findings
                    .push(format!("Concatenation in loop at {}:{}", path, line_no));
            }

            if let Some(caps) = self.loop_header.captures(code) {
                let is_for = caps.get(2).is_some_and(|m| m.as_str() == "for");
                if is_for {
                    let enclosing = open.iter().filter(|l| l.is_for).count();
                    if enclosing > 0 {
                        scan.penalty += NESTED_LOOP_PENALTY * enclosing as f64;
                        scan.findings
                            .push(format!("Nested loops (O(n²) risk) at {}:{}", path, line_no));
                    }
                }
                open.push(OpenLoop { indent, is_for });
            }
        }
    }

    /// @ai:effects pure
    pub fn scan(&self, codebase: &Codebase) -> AntiPatternScan {
        let mut scan = AntiPatternScan::default();
        for file in &codebase.files {
            self.scan_source(&file.display_path(&codebase.root), &file.content, &mut scan);
        }
        scan
    }
}

/// @ai:intent Hybrid performance benchmark
pub struct PerformanceBenchmark {
    tools: Arc<dyn ToolRunner>,
    blender: HybridBlender,
    estimator: ConfidenceEstimator,
}

impl PerformanceBenchmark {
    pub fn new(tools: Arc<dyn ToolRunner>) -> Self {
        Self {
            tools,
            blender: HybridBlender::new(STATIC_WEIGHT, DYNAMIC_WEIGHT),
            estimator: ConfidenceEstimator::new(),
        }
    }

    /// @ai:effects pure
    fn static_signal(&self, codebase: &Codebase) -> Result<Signal> {
        let scan = AntiPatternScanner::new()?.scan(codebase);
        let mut signal = Signal::new(scan.score())
            .detail(format!(
                "Static analysis: {} performance anti-patterns found (penalty {:.1})",
                scan.findings.len(),
                scan.penalty
            ))
            .metric("static_score", scan.score())
            .metric("anti_patterns", scan.findings.len());
        signal.details.extend(scan.findings);
        Ok(signal)
    }

    /// @ai:intent Run the profiling script repeatedly and collect wall-clock samples
    /// @ai:post Ok carries at least one sample, in milliseconds
    /// @ai:post runs stop once half the benchmark time limit is spent, keeping earlier samples
    /// @ai:effects io
    async fn dynamic_samples(&self, codebase: &Codebase, settings: &RunSettings) -> Result<Vec<f64>> {
        let script = settings.profile_script.as_ref().ok_or_else(|| {
            BenchError::TargetUnreachable("no profile script configured".to_string())
        })?;
        if !script.is_file() {
            return Err(BenchError::TargetUnreachable(format!(
                "profile script '{}' does not exist",
                script.display()
            )));
        }

        let budget = settings.benchmark_timeout.mul_f64(PROFILE_BUDGET_SHARE);
        let started = Instant::now();
        let mut samples = Vec::new();
        let mut last_error = String::new();

        for run in 1..=settings.profile_samples {
            let remaining = budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                tracing::warn!(
                    "Profiling budget of {:?} spent after {} of {} runs",
                    budget,
                    run - 1,
                    settings.profile_samples
                );
                break;
            }

            let invocation = ToolInvocation::new("python", settings.tool_timeout.min(remaining))
                .arg(script.to_string_lossy())
                .current_dir(&codebase.root)
                .env("PYTHONDONTWRITEBYTECODE", "1");
            let output = match self.tools.run(invocation).await {
                Ok(output) => output,
                Err(e @ BenchError::Timeout { .. }) => {
                    tracing::warn!("Profile run {} stopped: {}", run, e);
                    last_error = e.to_string();
                    break;
                }
                Err(e) => return Err(e),
            };
            if output.success {
                samples.push(output.elapsed.as_secs_f64() * 1000.0);
            } else {
                tracing::warn!("Profile run {} exited with {:?}", run, output.exit_code);
                last_error = output.stderr.lines().last().unwrap_or_default().to_string();
            }
        }

        if samples.is_empty() {
            return Err(BenchError::parse(
                "python",
                format!("profile script produced no timing: {}", last_error),
            ));
        }
        Ok(samples)
    }
}

#[async_trait]
impl Benchmark for PerformanceBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Performance
    }

    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let primary = self.static_signal(codebase)?;
        let static_score = primary.score;
        let samples = self.dynamic_samples(codebase, settings).await;

        // Each run is blended on its own; the score and interval both come from those samples.
        let estimate = samples.as_ref().ok().and_then(|times| {
            let blended: Vec<f64> = times
                .iter()
                .map(|ms| {
                    self.blender
                        .blend(Signal::new(static_score), Ok(Signal::new(time_tier_score(*ms))))
                        .score()
                })
                .collect();
            self.estimator.estimate(&blended)
        });

        let secondary = samples.map(|times| {
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            let tier = times.iter().map(|ms| time_tier_score(*ms)).sum::<f64>() / times.len() as f64;
            Signal::new(tier)
                .detail(format!(
                    "Avg execution time: {:.1}ms over {} runs",
                    avg,
                    times.len()
                ))
                .metric("dynamic_score", tier)
                .metric("avg_execution_time_ms", avg)
                .metric("execution_times_ms", times)
        });

        let mut result = self
            .blender
            .blend(primary, secondary)
            .into_result("Dynamic profiling");
        if let Some(estimate) = estimate {
            result.score = estimate.mean;
            result.confidence_interval = estimate.interval;
        }

        Ok(size_adjusted(result, codebase, MetricKind::General))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures;
    use crate::toolchain::{MockResponse, MockToolRunner, ToolOutput};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SOURCE: &str = "\
def build(rows):
    out = []
    text = ''
    for row in rows:
        out.insert(0, row)
        for cell in row:
            text += str(cell)
    return out
";

    /// Alternates between a fast and a slow run.
    struct AlternatingRunner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolRunner for AlternatingRunner {
        async fn run(&self, _invocation: ToolInvocation) -> Result<ToolOutput> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let millis = if call % 2 == 0 { 90 } else { 2100 };
            Ok(ToolOutput {
                elapsed: Duration::from_millis(millis),
                ..ToolOutput::stdout("")
            })
        }
    }

    fn profiled_settings(script: &tempfile::NamedTempFile, samples: u32) -> RunSettings {
        RunSettings {
            profile_script: Some(PathBuf::from(script.path())),
            profile_samples: samples,
            ..RunSettings::default()
        }
    }

    fn scan(source: &str) -> AntiPatternScan {
        let mut scan = AntiPatternScan::default();
        AntiPatternScanner::new()
            .unwrap()
            .scan_source("build.py", source, &mut scan);
        scan
    }

    #[test]
    fn test_time_tiers() {
        assert_eq!(time_tier_score(0.0), 10.0);
        assert_eq!(time_tier_score(100.0), 8.0);
        assert_eq!(time_tier_score(999.9), 6.0);
        assert_eq!(time_tier_score(1000.0), 4.0);
        assert_eq!(time_tier_score(5000.0), 2.0);
    }

    #[test]
    fn test_scan_finds_each_anti_pattern() {
        let scan = scan(SOURCE);
        assert!((scan.penalty - 1.8).abs() < 1e-9);
        assert_eq!(
            scan.findings,
            vec![
                "Inefficient 'list.insert(0, ...)' at build.py:5".to_string(),
                "Nested loops (O(n²) risk) at build.py:6".to_string(),
                "Concatenation in loop at build.py:7".to_string(),
            ]
        );
    }

    #[test]
    fn test_concat_after_loop_is_not_flagged() {
        let source = "for x in xs:\n    pass\ntotal += 1\n";
        assert!(scan(source).findings.is_empty());
    }

    #[test]
    fn test_triple_nesting_penalizes_each_enclosing_loop() {
        let source = "for a in x:\n    for b in a:\n        for c in b:\n            pass\n";
        assert!((scan(source).penalty - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_while_loops_enclose_but_do_not_nest() {
        let source = "while busy:\n    for x in xs:\n        n += x\n";
        let scan = scan(source);
        assert!((scan.penalty - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_without_profile_script_static_score_is_kept() {
        let benchmark = PerformanceBenchmark::new(Arc::new(MockToolRunner::new()));
        let codebase = fixtures::codebase(&[("build.py", SOURCE)]);

        let result = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        // 10 - 1.8, plus the tiny-codebase bonus of 0.5
        assert!((result.score - 8.7).abs() < 1e-9);
        assert_eq!(result.confidence_interval, None);
        assert!(result
            .details
            .iter()
            .any(|d| d.contains("Dynamic profiling skipped") && d.contains("no profile script")));
    }

    #[tokio::test]
    async fn test_profile_samples_are_blended() {
        let script = tempfile::NamedTempFile::new().unwrap();
        let output = ToolOutput {
            elapsed: Duration::from_millis(250),
            ..ToolOutput::stdout("")
        };
        let tools = Arc::new(MockToolRunner::new().with("python", MockResponse::Output(output)));
        let benchmark = PerformanceBenchmark::new(tools.clone());
        let codebase = fixtures::codebase(&[("app.py", "print('hi')\n")]);
        let settings = RunSettings {
            profile_script: Some(PathBuf::from(script.path())),
            profile_samples: 3,
            ..RunSettings::default()
        };

        let result = benchmark.produce(&codebase, &settings).await.unwrap();

        assert_eq!(tools.calls().len(), 3);
        // 0.4 * 10 + 0.6 * 8, plus 0.5 size bonus
        assert!((result.score - 9.3).abs() < 1e-9);
        let interval = result.confidence_interval.unwrap();
        assert!(interval.is_point());
        assert_eq!(result.raw_metrics["dynamic_score"], 8.0);
    }

    #[tokio::test]
    async fn test_score_lies_within_its_interval_for_varying_runs() {
        let script = tempfile::NamedTempFile::new().unwrap();
        let tools = Arc::new(AlternatingRunner {
            calls: AtomicUsize::new(0),
        });
        let benchmark = PerformanceBenchmark::new(tools);
        let codebase = fixtures::codebase(&[("app.py", "print('hi')\n")]);

        let result = benchmark
            .produce(&codebase, &profiled_settings(&script, 20))
            .await
            .unwrap();

        // per-run blends are 10.0 and 5.2, mean 7.6, plus 0.5 size bonus
        assert!((result.score - 8.1).abs() < 1e-9);
        let interval = result.confidence_interval.unwrap();
        assert!(interval.lower <= result.score && result.score <= interval.upper);
        assert!(!interval.is_point());
        assert_eq!(result.raw_metrics["dynamic_score"], 6.0);
    }

    #[tokio::test]
    async fn test_profile_runs_are_bounded_by_benchmark_budget() {
        let script = tempfile::NamedTempFile::new().unwrap();
        let tools = Arc::new(MockToolRunner::new().with("python", MockResponse::Timeout));
        let benchmark = PerformanceBenchmark::new(tools.clone());
        let codebase = fixtures::codebase(&[("app.py", "print('hi')\n")]);
        let settings = RunSettings {
            benchmark_timeout: Duration::from_secs(10),
            ..profiled_settings(&script, 5)
        };

        let result = benchmark.produce(&codebase, &settings).await.unwrap();

        let calls = tools.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].timeout <= Duration::from_secs(5));
        // the static signal survives: 10.0 plus 0.5 size bonus
        assert!((result.score - 10.0).abs() < 1e-9);
        assert!(!result.is_degraded());
        assert_eq!(result.raw_metrics["blend_mode"], "primary_only");
    }
}
