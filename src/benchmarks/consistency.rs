//! @ai:module:intent Consistency of naming conventions for classes, functions and variables
//! @ai:module:layer domain
//! @ai:module:public_api ConsistencyBenchmark, NamingScan, NamingScanner
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::Result;
use crate::stats::{clamp_score, SCORE_MAX};
use async_trait::async_trait;
use regex::Regex;

/// @ai:intent Naming checks and the names that broke convention
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamingScan {
    pub total_names: usize,
    pub inconsistent_names: usize,
    pub findings: Vec<String>,
}

impl NamingScan {
    /// @ai:effects pure
    pub fn consistent_names(&self) -> usize {
        self.total_names - self.inconsistent_names
    }

    /// @ai:intent Share of checked names following convention; None when nothing was checked
    /// @ai:effects pure
    pub fn ratio(&self) -> Option<f64> {
        (self.total_names > 0).then(|| self.consistent_names() as f64 / self.total_names as f64)
    }

    /// @ai:edge_cases no names to check scores 10.0
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        self.ratio()
            .map_or(SCORE_MAX, |ratio| clamp_score(ratio * SCORE_MAX))
    }
}

/// @ai:intent Line-based naming convention checker
/// @ai:invariant only statements starting outside brackets and string blocks are checked
pub struct NamingScanner {
    class_def: Regex,
    function_def: Regex,
    assignment: Regex,
    for_target: Regex,
    snake_case: Regex,
    constant_case: Regex,
    camel_case: Regex,
}

impl NamingScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            class_def: Regex::new(r"^\s*class\s+([A-Za-z_]\w*)")?,
            function_def: Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)")?,
            assignment: Regex::new(
                r"^\s*([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s*(?::[^=]+)?(?:\+|-|\*|/|//|%)?=(?:[^=]|$)",
            )?,
            for_target: Regex::new(r"^\s*(?:async\s+)?for\s+([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s+in\b")?,
            snake_case: Regex::new(r"^[a-z_][a-z0-9_]*$")?,
            constant_case: Regex::new(r"^_*[A-Z][A-Z0-9_]*$")?,
            camel_case: Regex::new(r"^_*[A-Z][a-zA-Z0-9]*$")?,
        })
    }

    /// @ai:intent Check one file's names, accumulating into `scan`
    /// @ai:post dunder functions are not checked
    /// @ai:effects pure
    pub fn scan_source(&self, path: &str, source: &str, scan: &mut NamingScan) {
        let inside = crate::benchmarks::codebase::triple_quoted_mask(source);
        let mut depth: i64 = 0;

        for (index, line) in source.lines().enumerate() {
            let at_statement_start = depth == 0 && !inside[index];
            depth = (depth + bracket_delta(line)).max(0);
            if !at_statement_start {
                continue;
            }
            let line_no = index + 1;

            if let Some(caps) = self.class_def.captures(line) {
                let name = &caps[1];
                self.check(scan, self.camel_case.is_match(name), || {
                    format!(
                        "Inconsistent class name: '{}' should be CamelCase. ({}:{})",
                        name, path, line_no
                    )
                });
            } else if let Some(caps) = self.function_def.captures(line) {
                let name = &caps[1];
                if name.starts_with("__") && name.ends_with("__") {
                    continue;
                }
                self.check(scan, self.snake_case.is_match(name), || {
                    format!(
                        "Inconsistent function name: '{}' should be snake_case. ({}:{})",
                        name, path, line_no
                    )
                });
            } else if let Some(caps) = self
                .for_target
                .captures(line)
                .or_else(|| self.assignment.captures(line))
            {
                for name in caps[1].split(',').map(str::trim) {
                    let follows = self.snake_case.is_match(name) || self.constant_case.is_match(name);
                    self.check(scan, follows, || {
                        format!(
                            "Inconsistent variable name: '{}' should be snake_case. ({}:{})",
                            name, path, line_no
                        )
                    });
                }
            }
        }
    }

    fn check(&self, scan: &mut NamingScan, follows: bool, finding: impl FnOnce() -> String) {
        scan.total_names += 1;
        if !follows {
            scan.inconsistent_names += 1;
            scan.findings.push(finding());
        }
    }

    /// @ai:effects pure
    pub fn scan(&self, codebase: &Codebase) -> NamingScan {
        let mut scan = NamingScan::default();
        for file in &codebase.files {
            self.scan_source(&file.display_path(&codebase.root), &file.content, &mut scan);
        }
        scan
    }
}

/// Net bracket nesting opened by a line, ignoring anything after `#`.
fn bracket_delta(line: &str) -> i64 {
    line.split('#')
        .next()
        .unwrap_or_default()
        .chars()
        .map(|ch| match ch {
            '(' | '[' | '{' => 1,
            ')' | ']' | '}' => -1,
            _ => 0,
        })
        .sum()
}

/// @ai:intent Scores naming consistency from source text alone; a ratio, so not size-adjusted
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyBenchmark;

impl ConsistencyBenchmark {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Benchmark for ConsistencyBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Consistency
    }

    async fn produce(&self, codebase: &Codebase, _settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let scan = NamingScanner::new()?.scan(codebase);
        let mut details = Vec::new();
        match scan.ratio() {
            Some(ratio) => details.push(format!(
                "Naming consistency: {:.2}% ({}/{} consistent)",
                ratio * 100.0,
                scan.consistent_names(),
                scan.total_names
            )),
            None => details.push("No relevant names found to check.".to_string()),
        }
        details.extend(scan.findings.iter().cloned());

        Ok(BenchmarkResult::new(scan.score(), details)
            .with_metric("total_names", scan.total_names)
            .with_metric("inconsistent_names", scan.inconsistent_names))
    }
}
