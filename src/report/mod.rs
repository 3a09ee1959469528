//! @ai:module:intent Export and report generation for comparison records
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, MarkdownReporter

pub mod json_report;
pub mod markdown_report;

pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::ComparisonRecord;
use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent Write whichever outputs were requested
    /// @ai:effects fs:write
    pub fn write(
        &self,
        record: &ComparisonRecord,
        export: Option<&Path>,
        report: Option<&Path>,
    ) -> Result<()> {
        if let Some(path) = export {
            self.json.generate(record, path)?;
            tracing::info!("Results exported to {}", path.display());
        }
        if let Some(path) = report {
            self.markdown.generate(record, path)?;
            tracing::info!("Report written to {}", path.display());
        }
        Ok(())
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_write_only_requested_outputs() {
        let temp = TempDir::new().unwrap();
        let export = temp.path().join("out.json");
        let report = temp.path().join("out.md");

        ReportGenerator::new()
            .write(&fixtures::record(), Some(&export), None)
            .unwrap();

        assert!(export.exists());
        assert!(!report.exists());
    }
}
