//! @ai:module:intent Readability from cyclomatic complexity and style violations
//! @ai:module:layer domain
//! @ai:module:public_api ReadabilityBenchmark, ComplexityReport, parse_radon_cc, count_style_violations
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::{BenchError, Result};
use crate::scoring::TOOL_FALLBACK_SCORE;
use crate::stats::{clamp_score, MetricKind, SCORE_MAX};
use crate::toolchain::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const COMPLEXITY_WEIGHT: f64 = 0.6;
const STYLE_WEIGHT: f64 = 0.4;
/// Functions above this cyclomatic complexity are listed individually.
const HOTSPOT_THRESHOLD: u32 = 10;
/// Average complexity that still earns a perfect complexity score.
const COMPLEXITY_BASELINE: f64 = 5.0;
const VIOLATIONS_PER_POINT: f64 = 5.0;
const STYLE_EXCLUDES: &str = ".git,.venv,venv,node_modules,__pycache__,target";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RadonCcFile {
    Blocks(Vec<RadonBlock>),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct RadonBlock {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    lineno: u32,
    complexity: u32,
}

/// @ai:intent Function with complexity above the hotspot threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub file: String,
    pub name: String,
    pub line: u32,
    pub complexity: u32,
}

/// @ai:intent Aggregated cyclomatic complexity of all functions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexityReport {
    pub function_count: usize,
    pub total_complexity: u64,
    pub hotspots: Vec<Hotspot>,
    pub unparsed_files: Vec<String>,
}

impl ComplexityReport {
    /// @ai:intent Mean complexity per function; zero when no function was found
    /// @ai:effects pure
    pub fn average(&self) -> f64 {
        if self.function_count == 0 {
            0.0
        } else {
            self.total_complexity as f64 / self.function_count as f64
        }
    }

    /// @ai:example (average 7.0) -> 8.0
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        clamp_score(SCORE_MAX - (self.average() - COMPLEXITY_BASELINE))
    }
}

/// @ai:intent Parse `radon cc -j` output
/// @ai:post classes are skipped; their methods are counted as functions
/// @ai:effects pure
pub fn parse_radon_cc(stdout: &str) -> Result<ComplexityReport> {
    let files: BTreeMap<String, RadonCcFile> = serde_json::from_str(stdout)
        .map_err(|e| BenchError::parse("radon", format!("invalid cc JSON: {}", e)))?;

    let mut report = ComplexityReport::default();
    for (file, entry) in files {
        match entry {
            RadonCcFile::Blocks(blocks) => {
                for block in blocks.into_iter().filter(|b| b.kind != "class") {
                    report.function_count += 1;
                    report.total_complexity += u64::from(block.complexity);
                    if block.complexity > HOTSPOT_THRESHOLD {
                        report.hotspots.push(Hotspot {
                            file: file.clone(),
                            name: block.name,
                            line: block.lineno,
                            complexity: block.complexity,
                        });
                    }
                }
            }
            RadonCcFile::Failed { error } => {
                tracing::debug!("radon could not parse {}: {}", file, error);
                report.unparsed_files.push(file);
            }
        }
    }
    Ok(report)
}

/// @ai:intent Count `path:line:col: CODE message` lines in pycodestyle output
/// @ai:effects pure
pub fn count_style_violations(stdout: &str) -> Result<usize> {
    let violation = Regex::new(r"^.+:\d+:\d+: [A-Z]\d+\b")?;
    Ok(stdout.lines().filter(|line| violation.is_match(line)).count())
}

/// @ai:example (10) -> 8.0
/// @ai:effects pure
fn style_score(violations: usize) -> f64 {
    clamp_score(SCORE_MAX - violations as f64 / VIOLATIONS_PER_POINT)
}

/// @ai:intent Scores readability with radon and pycodestyle
pub struct ReadabilityBenchmark {
    tools: Arc<dyn ToolRunner>,
}

impl ReadabilityBenchmark {
    pub fn new(tools: Arc<dyn ToolRunner>) -> Self {
        Self { tools }
    }

    /// @ai:effects io
    async fn complexity(&self, codebase: &Codebase, settings: &RunSettings) -> Result<ComplexityReport> {
        let invocation = ToolInvocation::new("radon", settings.tool_timeout)
            .args(["cc", "-j", "--exclude", "*/.venv/*,*/venv/*,*/node_modules/*"])
            .arg(codebase.root.to_string_lossy())
            .current_dir(&codebase.root);
        let output = self.tools.run(invocation).await?;
        parse_radon_cc(&output.stdout)
    }

    /// @ai:effects io
    async fn style(&self, codebase: &Codebase, settings: &RunSettings) -> Result<usize> {
        let invocation = ToolInvocation::new("pycodestyle", settings.tool_timeout)
            .arg(format!("--exclude={}", STYLE_EXCLUDES))
            .arg(codebase.root.to_string_lossy())
            .current_dir(&codebase.root);
        let output = self.tools.run(invocation).await?;
        // pycodestyle exits 1 when it reports violations
        if !output.success && output.stdout.trim().is_empty() {
            return Err(BenchError::parse("pycodestyle", output.stderr.trim().to_string()));
        }
        count_style_violations(&output.stdout)
    }
}

#[async_trait]
impl Benchmark for ReadabilityBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Readability
    }

    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let mut details = Vec::new();
        let mut result_metrics = Vec::new();

        let complexity_score = match self.complexity(codebase, settings).await {
            Ok(report) => {
                for hotspot in &report.hotspots {
                    details.push(format!(
                        "High complexity ({}) in function '{}' at {}:{}",
                        hotspot.complexity, hotspot.name, hotspot.file, hotspot.line
                    ));
                }
                details.push(format!(
                    "Average cyclomatic complexity: {:.2} over {} functions",
                    report.average(),
                    report.function_count
                ));
                if !report.unparsed_files.is_empty() {
                    details.push(format!(
                        "{} files could not be parsed by radon",
                        report.unparsed_files.len()
                    ));
                }
                result_metrics.push(("avg_complexity", serde_json::json!(report.average())));
                result_metrics.push(("function_count", serde_json::json!(report.function_count)));
                result_metrics.push(("complexity_hotspots", serde_json::json!(report.hotspots.len())));
                report.score()
            }
            Err(e) => {
                tracing::warn!("Readability complexity signal unavailable: {}", e);
                details.push(format!(
                    "[radon] Complexity unavailable: {}. Fallback score {:.1} used.",
                    e, TOOL_FALLBACK_SCORE
                ));
                TOOL_FALLBACK_SCORE
            }
        };

        let pep8_score = match self.style(codebase, settings).await {
            Ok(violations) => {
                details.push(format!("Found {} PEP8 style violations.", violations));
                result_metrics.push(("pep8_violations", serde_json::json!(violations)));
                style_score(violations)
            }
            Err(e) => {
                tracing::warn!("Readability style signal unavailable: {}", e);
                details.push(format!(
                    "[pycodestyle] Style check unavailable: {}. Fallback score {:.1} used.",
                    e, TOOL_FALLBACK_SCORE
                ));
                TOOL_FALLBACK_SCORE
            }
        };

        let mut result = BenchmarkResult::new(
            clamp_score(COMPLEXITY_WEIGHT * complexity_score + STYLE_WEIGHT * pep8_score),
            details,
        )
        .with_metric("complexity_score", complexity_score)
        .with_metric("pep8_score", pep8_score);
        for (key, value) in result_metrics {
            result = result.with_metric(key, value);
        }

        Ok(size_adjusted(result, codebase, MetricKind::Complexity))
    }
}
