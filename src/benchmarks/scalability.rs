//! @ai:module:intent Scalability from concurrency, parallelism and caching usage
//! @ai:module:layer domain
//! @ai:module:public_api ScalabilityBenchmark, ScalabilityScan, ScalabilityScanner
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::Result;
use crate::stats::{clamp_score, MetricKind};
use async_trait::async_trait;
use regex::Regex;

const ASYNC_POINTS: f64 = 3.0;
const MULTIPROCESSING_POINTS: f64 = 3.0;
const CACHING_POINTS: f64 = 2.0;
const ASYNC_RATIO_POINTS: f64 = 2.0;

/// Module name fragments of caching and task-queue libraries.
const CACHING_MODULES: &[&str] = &["redis", "memcached", "celery", "cache"];

/// @ai:intent Concurrency-related imports and async function counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalabilityScan {
    pub uses_asyncio: bool,
    pub uses_multiprocessing: bool,
    pub uses_caching: bool,
    pub async_functions: usize,
    pub total_functions: usize,
}

impl ScalabilityScan {
    fn record_module(&mut self, module: &str) {
        if module.contains("async") {
            self.uses_asyncio = true;
        }
        if module.contains("multiprocessing") {
            self.uses_multiprocessing = true;
        }
        if CACHING_MODULES.iter().any(|fragment| module.contains(fragment)) {
            self.uses_caching = true;
        }
    }

    /// @ai:effects pure
    pub fn async_ratio(&self) -> f64 {
        if self.total_functions == 0 {
            0.0
        } else {
            self.async_functions as f64 / self.total_functions as f64
        }
    }

    /// @ai:example (asyncio, caching, 1 of 4 functions async) -> 5.5
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.uses_asyncio {
            score += ASYNC_POINTS;
        }
        if self.uses_multiprocessing {
            score += MULTIPROCESSING_POINTS;
        }
        if self.uses_caching {
            score += CACHING_POINTS;
        }
        clamp_score(score + self.async_ratio() * ASYNC_RATIO_POINTS)
    }
}

/// @ai:intent Line-based detector for imports and function definitions
pub struct ScalabilityScanner {
    import: Regex,
    from_import: Regex,
    function: Regex,
}

impl ScalabilityScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            import: Regex::new(r"^\s*import\s+(.+)$")?,
            from_import: Regex::new(r"^\s*from\s+([\w.]+)\s+import\b")?,
            function: Regex::new(r"^\s*(async\s+)?def\s+[A-Za-z_]\w*")?,
        })
    }

    /// @ai:effects pure
    pub fn scan_line(&self, line: &str, scan: &mut ScalabilityScan) {
        if let Some(caps) = self.from_import.captures(line) {
            scan.record_module(&caps[1]);
        } else if let Some(caps) = self.import.captures(line) {
            for name in caps[1].split(',') {
                if let Some(module) = name.split_whitespace().next() {
                    scan.record_module(module);
                }
            }
        } else if let Some(caps) = self.function.captures(line) {
            scan.total_functions += 1;
            if caps.get(1).is_some() {
                scan.async_functions += 1;
            }
        }
    }

    /// @ai:effects pure
    pub fn scan(&self, codebase: &Codebase) -> ScalabilityScan {
        let mut scan = ScalabilityScan::default();
        for file in &codebase.files {
            for (_, line) in file.code_lines() {
                self.scan_line(line, &mut scan);
            }
        }
        scan
    }
}

/// @ai:intent Scores scalability from source text alone; needs no external tool
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalabilityBenchmark;

impl ScalabilityBenchmark {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Benchmark for ScalabilityBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Scalability
    }

    async fn produce(&self, codebase: &Codebase, _settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let scan = ScalabilityScanner::new()?.scan(codebase);
        let mut details = Vec::new();
        if scan.uses_asyncio {
            details.push("Uses 'asyncio' for I/O-bound concurrency.".to_string());
        }
        if scan.uses_multiprocessing {
            details.push("Uses 'multiprocessing' for CPU-bound parallelism.".to_string());
        }
        if scan.uses_caching {
            details.push(
                "Appears to use a caching or task queue library (e.g. Redis, Celery).".to_string(),
            );
        }
        if scan.async_functions > 0 {
            details.push(format!(
                "{:.1}% of functions are async.",
                scan.async_ratio() * 100.0
            ));
        }
        if details.is_empty() {
            details.push("No concurrency, parallelism or caching usage found.".to_string());
        }

        let result = BenchmarkResult::new(scan.score(), details)
            .with_metric("uses_asyncio", scan.uses_asyncio)
            .with_metric("uses_multiprocessing", scan.uses_multiprocessing)
            .with_metric("uses_caching", scan.uses_caching)
            .with_metric("async_functions", scan.async_functions)
            .with_metric("total_functions", scan.total_functions);

        Ok(size_adjusted(result, codebase, MetricKind::General))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\
import asyncio, json
from functools import lru_cache
from app.cache import store

async def fetch(url):
    return url

def parse(body):
    return json.loads(body)

def save(row):
    store.put(row)

def main():
    asyncio.run(fetch('x'))
";

    fn scan(source: &str) -> ScalabilityScan {
        let scanner = ScalabilityScanner::new().unwrap();
        let mut scan = ScalabilityScan::default();
        for line in source.lines() {
            scanner.scan_line(line, &mut scan);
        }
        scan
    }

    #[test]
    fn test_scan_detects_imports_and_async_functions() {
        let scan = scan(SOURCE);
        assert_eq!(
            scan,
            ScalabilityScan {
                uses_asyncio: true,
                uses_multiprocessing: false,
                uses_caching: true,
                async_functions: 1,
                total_functions: 4,
            }
        );
        assert!((scan.score() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_import_aliases_and_multiprocessing() {
        let scan = scan("import multiprocessing as mp\nimport os.path as p, redis\n");
        assert!(scan.uses_multiprocessing);
        assert!(scan.uses_caching);
        assert!(!scan.uses_asyncio);
        assert_eq!(scan.score(), 5.0);
    }

    #[test]
    fn test_score_is_capped() {
        let scan = ScalabilityScan {
            uses_asyncio: true,
            uses_multiprocessing: true,
            uses_caching: true,
            async_functions: 2,
            total_functions: 2,
        };
        assert_eq!(scan.score(), 10.0);
    }

    #[tokio::test]
    async fn test_imports_quoted_in_docstrings_are_ignored() {
        let source = "\"\"\"Example:\nimport asyncio\n\"\"\"\ndef run():\n    pass\n";
        let codebase = fixtures::codebase(&[("run.py", source)]);

        let result = ScalabilityBenchmark::new()
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        assert_eq!(result.raw_metrics["uses_asyncio"], false);
        // nothing found, plus the tiny-codebase bonus of 0.5
        assert_eq!(result.score, 0.5);
        assert_eq!(result.details[0], "No concurrency, parallelism or caching usage found.");
    }
}
