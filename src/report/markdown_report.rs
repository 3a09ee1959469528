//! @ai:module:intent Markdown report of a comparison record
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter, MarkdownReporterTrait
//! @ai:module:stateless true

use crate::metrics::{ComparisonRecord, Winner};
use crate::stats::ConfidenceInterval;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Write the record as a Markdown report
    fn generate(&self, record: &ComparisonRecord, output_path: &Path) -> Result<()>;
}

/// @ai:intent Renders a comparison as a human-readable Markdown document
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render the full report
    /// @ai:effects pure
    pub fn render(record: &ComparisonRecord) -> Result<String> {
        let mut output = String::new();
        Self::write_summary(&mut output, record)?;
        Self::write_score_table(&mut output, record)?;
        Self::write_notices(&mut output, record)?;
        Self::write_details(&mut output, record)?;
        Ok(output)
    }

    fn write_summary(output: &mut String, record: &ComparisonRecord) -> std::fmt::Result {
        writeln!(output, "# Codebase Comparison")?;
        writeln!(output)?;
        writeln!(output, "**Date:** {}", record.timestamp)?;
        writeln!(output, "**Codebase 1:** {}", record.codebase1)?;
        writeln!(output, "**Codebase 2:** {}", record.codebase2)?;
        writeln!(output)?;
        writeln!(output, "**Verdict:** {}", record.summary())?;
        writeln!(output)
    }

    /// @ai:intent Per-dimension raw and normalized scores with intervals and totals
    /// @ai:effects pure
    fn write_score_table(output: &mut String, record: &ComparisonRecord) -> std::fmt::Result {
        writeln!(output, "## Scores")?;
        writeln!(output)?;
        writeln!(
            output,
            "| Dimension | Weight | Raw 1 | Raw 2 | Normalized 1 | Normalized 2 | Leader |"
        )?;
        writeln!(
            output,
            "|-----------|--------|-------|-------|--------------|--------------|--------|"
        )?;

        for dimension in record.dimensions() {
            let intervals = record
                .confidence_intervals
                .get(&dimension)
                .copied()
                .unwrap_or_default();
            let leader = match record.dimension_winner(dimension) {
                Some(Winner::First) => "Codebase 1",
                Some(Winner::Second) => "Codebase 2",
                _ => "Tie",
            };
            writeln!(
                output,
                "| {} | {:.1} | {} | {} | {:.2} | {:.2} | {} |",
                dimension,
                record.weights.get(&dimension).copied().unwrap_or(1.0),
                format_score(record.raw_scores1[&dimension], intervals.codebase1),
                format_score(record.raw_scores2[&dimension], intervals.codebase2),
                record.normalized_scores1[&dimension],
                record.normalized_scores2[&dimension],
                leader
            )?;
        }

        writeln!(
            output,
            "| **Total** | | | | **{:.2}** | **{:.2}** | |",
            record.total_score1, record.total_score2
        )?;
        writeln!(output)
    }

    fn write_notices(output: &mut String, record: &ComparisonRecord) -> std::fmt::Result {
        let lists = [
            ("Skipped", &record.skipped),
            ("Incomplete", &record.incomplete),
            ("Degraded", &record.degraded),
        ];
        if lists.iter().all(|(_, dims)| dims.is_empty()) && !record.partial {
            return Ok(());
        }

        writeln!(output, "## Notices")?;
        writeln!(output)?;
        if record.partial {
            writeln!(output, "- The run was interrupted; results are partial.")?;
        }
        for (label, dims) in lists {
            if !dims.is_empty() {
                let names: Vec<_> = dims.iter().map(|d| d.as_str()).collect();
                writeln!(output, "- {}: {}", label, names.join(", "))?;
            }
        }
        writeln!(output)
    }

    fn write_details(output: &mut String, record: &ComparisonRecord) -> std::fmt::Result {
        writeln!(output, "## Details")?;
        for dimension in record.dimensions() {
            writeln!(output)?;
            writeln!(output, "### {}", dimension)?;
            for (label, details) in [
                ("Codebase 1", record.details1.get(&dimension)),
                ("Codebase 2", record.details2.get(&dimension)),
            ] {
                writeln!(output)?;
                writeln!(output, "**{}**", label)?;
                writeln!(output)?;
                for line in details.into_iter().flatten() {
                    writeln!(output, "- {}", line)?;
                }
            }
        }
        Ok(())
    }
}

/// @ai:intent "7.25" or "7.25 ±0.8" when a non-degenerate interval exists
/// @ai:effects pure
fn format_score(score: f64, interval: Option<ConfidenceInterval>) -> String {
    match interval {
        Some(ci) if !ci.is_point() => format!("{:.2} ±{:.1}", score, ci.half_width()),
        _ => format!("{:.2}", score),
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:effects fs:write
    fn generate(&self, record: &ComparisonRecord, output_path: &Path) -> Result<()> {
        let content = Self::render(record)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, content)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_render_contains_table_and_verdict() {
        let content = MarkdownReporter::render(&fixtures::record()).unwrap();

        assert!(content.starts_with("# Codebase Comparison"));
        assert!(content.contains("./alpha is significantly better than ./beta"));
        assert!(content.contains("| Readability | 1.0 | 8.00 ±0.5 | 5.00 | 8.00 | 2.00 | Codebase 1 |"));
        assert!(content.contains("| Security | 1.0 | 6.00 | 6.00 | 5.00 | 5.00 | Tie |"));
        assert!(content.contains("| **Total** | | | | **13.00** | **7.00** | |"));
        assert!(content.contains("- Skipped: Performance"));
        assert!(content.contains("- Degraded: Security"));
        assert!(content.contains("- [Skipped] Dynamic analysis skipped: no target."));
    }

    #[test]
    fn test_no_notices_section_for_clean_run() {
        let mut record = fixtures::record();
        record.skipped.clear();
        record.degraded.clear();
        let content = MarkdownReporter::render(&record).unwrap();
        assert!(!content.contains("## Notices"));
    }

    #[test]
    fn test_generate_writes_file() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("report.md");
        MarkdownReporter::new()
            .generate(&fixtures::record(), &output)
            .unwrap();
        assert!(std::fs::read_to_string(&output).unwrap().contains("## Details"));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(7.254, None), "7.25");
        assert_eq!(format_score(7.0, Some(ConfidenceInterval::new(7.0, 7.0))), "7.00");
        assert_eq!(format_score(7.0, Some(ConfidenceInterval::new(6.0, 8.0))), "7.00 ±1.0");
    }
}
