//! @ai:module:intent Maintainability from per-file maintainability index samples
//! @ai:module:layer domain
//! @ai:module:public_api MaintainabilityBenchmark, parse_radon_mi
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::{BenchError, Result};
use crate::stats::{clamp_score, ConfidenceEstimator, MetricKind};
use crate::toolchain::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Files below this maintainability index are listed individually.
const LOW_MI_THRESHOLD: f64 = 40.0;
/// Maintainability index is reported on 0-100.
const MI_SCALE: f64 = 10.0;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RadonMiFile {
    Scored { mi: f64 },
    Failed { error: String },
}

/// @ai:intent Maintainability index per parsed file plus the files radon rejected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiReport {
    pub files: Vec<(String, f64)>,
    pub unparsed_files: Vec<String>,
}

/// @ai:intent Parse `radon mi -j` output
/// @ai:effects pure
pub fn parse_radon_mi(stdout: &str) -> Result<MiReport> {
    let files: BTreeMap<String, RadonMiFile> = serde_json::from_str(stdout)
        .map_err(|e| BenchError::parse("radon", format!("invalid mi JSON: {}", e)))?;

    let mut report = MiReport::default();
    for (file, entry) in files {
        match entry {
            RadonMiFile::Scored { mi } if mi.is_finite() => report.files.push((file, mi)),
            RadonMiFile::Scored { .. } => report.unparsed_files.push(file),
            RadonMiFile::Failed { error } => {
                tracing::debug!("radon could not parse {}: {}", file, error);
                report.unparsed_files.push(file);
            }
        }
    }
    Ok(report)
}

/// @ai:intent Scores maintainability with radon's maintainability index
pub struct MaintainabilityBenchmark {
    tools: Arc<dyn ToolRunner>,
    estimator: ConfidenceEstimator,
}

impl MaintainabilityBenchmark {
    pub fn new(tools: Arc<dyn ToolRunner>) -> Self {
        Self {
            tools,
            estimator: ConfidenceEstimator::new(),
        }
    }
}

#[async_trait]
impl Benchmark for MaintainabilityBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Maintainability
    }

    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let invocation = ToolInvocation::new("radon", settings.tool_timeout)
            .args(["mi", "-j", "--exclude", "*/.venv/*,*/venv/*,*/node_modules/*"])
            .arg(codebase.root.to_string_lossy())
            .current_dir(&codebase.root);
        let output = self.tools.run(invocation).await?;
        let report = parse_radon_mi(&output.stdout)?;

        let samples: Vec<f64> = report.files.iter().map(|(_, mi)| mi / MI_SCALE).collect();
        let Some(estimate) = self.estimator.estimate(&samples) else {
            return Ok(BenchmarkResult::new(
                0.0,
                vec!["No parseable source files found.".to_string()],
            )
            .with_metric("unparsed_files", report.unparsed_files.len()));
        };

        let avg_mi = estimate.mean * MI_SCALE;
        let mut details = vec![format!(
            "Average maintainability index (MI): {:.2} over {} files (size: {})",
            avg_mi, estimate.sample_count, codebase.size_bucket
        )];
        for (file, mi) in report.files.iter().filter(|(_, mi)| *mi < LOW_MI_THRESHOLD) {
            details.push(format!("Low maintainability index ({:.2}) in {}", mi, file));
        }
        for file in &report.unparsed_files {
            details.push(format!("Could not parse {}", file));
        }

        let file_scores: Vec<f64> = report.files.iter().map(|(_, mi)| *mi).collect();
        let result = BenchmarkResult::new(clamp_score(estimate.mean), details)
            .with_metric("avg_mi", avg_mi)
            .with_metric("file_mi_scores", file_scores)
            .with_interval(estimate.interval);

        Ok(size_adjusted(result, codebase, MetricKind::VolumeSensitive))
    }
}
