//! @ai:module:intent JSON export of a comparison record
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, JsonReporterTrait
//! @ai:module:stateless true

use crate::metrics::ComparisonRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON export
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write the record as JSON
    fn generate(&self, record: &ComparisonRecord, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes the export schema as pretty-printed JSON
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Write JSON export, creating missing parent directories
    /// @ai:effects fs:write
    fn generate(&self, record: &ComparisonRecord, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}
