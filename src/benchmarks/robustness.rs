//! @ai:module:intent Robustness from exception-handler specificity and logging use
//! @ai:module:layer domain
//! @ai:module:public_api RobustnessBenchmark, HandlerScan, HandlerScanner
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::Result;
use crate::stats::clamp_score;
use async_trait::async_trait;
use regex::Regex;

const HANDLER_POINTS: f64 = 8.0;
const LOGGING_BONUS: f64 = 2.0;
const NO_HANDLERS_WITH_LOGGING: f64 = 5.0;
const NO_HANDLERS_WITHOUT_LOGGING: f64 = 2.0;

/// @ai:intent Exception-handling findings across a codebase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerScan {
    pub total_handlers: usize,
    pub specific_handlers: usize,
    pub uses_logging: bool,
    pub findings: Vec<String>,
}

impl HandlerScan {
    /// @ai:intent Share of handlers naming a specific exception type
    /// @ai:effects pure
    pub fn quality(&self) -> Option<f64> {
        (self.total_handlers > 0).then(|| self.specific_handlers as f64 / self.total_handlers as f64)
    }

    /// @ai:example (3 of 4 specific, logging) -> 8.0
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        match self.quality() {
            None if self.uses_logging => NO_HANDLERS_WITH_LOGGING,
            None => NO_HANDLERS_WITHOUT_LOGGING,
            Some(quality) => {
                let bonus = if self.uses_logging { LOGGING_BONUS } else { 0.0 };
                clamp_score(quality * HANDLER_POINTS + bonus)
            }
        }
    }
}

/// @ai:intent Line-based detector for exception handlers and logging imports
pub struct HandlerScanner {
    handler: Regex,
    bare: Regex,
    generic: Regex,
    logging: Regex,
}

impl HandlerScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            handler: Regex::new(r"^\s*except\b")?,
            bare: Regex::new(r"^\s*except\s*:")?,
            generic: Regex::new(r"^\s*except\s+Exception\s*(as\s+\w+\s*)?:")?,
            logging: Regex::new(r"^\s*(import\s+([\w.]+\s*,\s*)*logging\b|from\s+logging(\.\w+)*\s+import\b)")?,
        })
    }

    /// @ai:intent Scan one file's source, accumulating into `scan`
    /// @ai:effects pure
    pub fn scan_source(&self, path: &str, source: &str, scan: &mut HandlerScan) {
        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            if self.logging.is_match(line) {
                scan.uses_logging = true;
            }
            if !self.handler.is_match(line) {
                continue;
            }
            scan.total_handlers += 1;
            if self.bare.is_match(line) {
                scan.findings.push(format!("Bare 'except:' used in {}:{}", path, line_no));
            } else if self.generic.is_match(line) {
                scan.findings
                    .push(format!("Generic 'except Exception' used in {}:{}", path, line_no));
            } else {
                scan.specific_handlers += 1;
            }
        }
    }

    /// @ai:effects pure
    pub fn scan(&self, codebase: &Codebase) -> HandlerScan {
        let mut scan = HandlerScan::default();
        for file in &codebase.files {
            self.scan_source(&file.display_path(&codebase.root), &file.content, &mut scan);
        }
        scan
    }
}

/// @ai:intent Scores robustness from source text alone; needs no external tool
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustnessBenchmark;

impl RobustnessBenchmark {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Benchmark for RobustnessBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Robustness
    }

    async fn produce(&self, codebase: &Codebase, _settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let scan = HandlerScanner::new()?.scan(codebase);
        let mut details = vec![if scan.uses_logging {
            "Codebase appears to use the 'logging' module.".to_string()
        } else {
            "Codebase does not appear to use the 'logging' module.".to_string()
        }];
        if let Some(quality) = scan.quality() {
            details.push(format!(
                "Error handling quality: {:.2}% ({}/{} specific handlers)",
                quality * 100.0,
                scan.specific_handlers,
                scan.total_handlers
            ));
        } else {
            details.push("No exception handlers found.".to_string());
        }
        details.extend(scan.findings.iter().cloned());

        Ok(BenchmarkResult::new(scan.score(), details)
            .with_metric("total_handlers", scan.total_handlers)
            .with_metric("specific_handlers", scan.specific_handlers)
            .with_metric("uses_logging", scan.uses_logging))
    }
}
