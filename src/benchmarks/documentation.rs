//! @ai:module:intent Documentation from docstring coverage and docstring thoroughness
//! @ai:module:layer domain
//! @ai:module:public_api DocumentationBenchmark, DocstringScan, DocstringScanner, is_thorough_docstring
//! @ai:module:stateless true

use crate::benchmarks::codebase::triple_quoted_mask;
use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::Result;
use crate::stats::{clamp_score, MetricKind, SCORE_MAX};
use async_trait::async_trait;
use regex::Regex;

const MIN_THOROUGH_LINES: usize = 3;
const MAX_BLANK_RUN: usize = 5;

/// @ai:intent Docstring describes its parameters and return value over several lines
/// @ai:example ("Sum.\n\nArgs:\n    xs: values\nReturns:\n    total") -> true
/// @ai:example ("Sum the values.") -> false
/// @ai:effects pure
pub fn is_thorough_docstring(text: &str) -> bool {
    let non_blank = text.lines().filter(|line| !line.trim().is_empty()).count();
    if non_blank < MIN_THOROUGH_LINES {
        return false;
    }

    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                return false;
            }
        } else {
            blank_run = 0;
        }
    }

    let lowered = text.to_lowercase();
    let has_params = lowered.contains("args:") || lowered.contains("parameters:");
    has_params && lowered.contains("returns:")
}

/// @ai:intent Docstring counts across modules, classes and functions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocstringScan {
    pub entities: usize,
    pub documented: usize,
    pub thorough: usize,
    pub findings: Vec<String>,
}

impl DocstringScan {
    fn record(&mut self, docstring: Option<String>, missing: impl FnOnce() -> String) {
        self.entities += 1;
        match docstring {
            Some(text) => {
                self.documented += 1;
                if is_thorough_docstring(&text) {
                    self.thorough += 1;
                }
            }
            None => self.findings.push(missing()),
        }
    }

    /// @ai:effects pure
    pub fn coverage(&self) -> Option<f64> {
        (self.entities > 0).then(|| self.documented as f64 / self.entities as f64)
    }

    /// @ai:intent Share of docstrings that are thorough; 0 when nothing is documented
    /// @ai:effects pure
    pub fn thoroughness(&self) -> f64 {
        if self.documented == 0 {
            0.0
        } else {
            self.thorough as f64 / self.documented as f64
        }
    }

    /// @ai:intent Mean of coverage and thoroughness on the score scale
    /// @ai:example (2 of 5 documented, 1 of them thorough) -> 4.5
    /// @ai:effects pure
    pub fn score(&self) -> f64 {
        match self.coverage() {
            None => 0.0,
            Some(coverage) => clamp_score((coverage + self.thoroughness()) * SCORE_MAX / 2.0),
        }
    }
}

/// @ai:intent Line-based docstring detector for modules, classes and functions
pub struct DocstringScanner {
    definition: Regex,
    string_open: Regex,
}

impl DocstringScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            definition: Regex::new(r"^\s*(?:async\s+def|def|class)\s+([A-Za-z_]\w*)")?,
            string_open: Regex::new(r#"^[rRuU]?("""|'''|"|')"#)?,
        })
    }

    /// @ai:intent Scan one file, accumulating into `scan`
    /// @ai:post every file adds one module entity plus one per class or function
    /// @ai:effects pure
    pub fn scan_source(&self, path: &str, source: &str, scan: &mut DocstringScan) {
        let lines: Vec<&str> = source.lines().collect();
        let inside = triple_quoted_mask(source);

        let module_doc = next_code_line(&lines, 0).and_then(|at| self.docstring_at(&lines, at));
        scan.record(module_doc, || format!("Missing docstring in module: {}", path));

        for (index, line) in lines.iter().enumerate() {
            if inside[index] {
                continue;
            }
            let Some(caps) = self.definition.captures(line) else {
                continue;
            };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let docstring = body_start(&lines, index).and_then(|at| self.docstring_at(&lines, at));
            scan.record(docstring, || {
                format!("Missing docstring for '{}' in {}:{}", name, path, index + 1)
            });
        }
    }

    /// @ai:effects pure
    pub fn scan(&self, codebase: &Codebase) -> DocstringScan {
        let mut scan = DocstringScan::default();
        for file in &codebase.files {
            self.scan_source(&file.display_path(&codebase.root), &file.content, &mut scan);
        }
        scan
    }

    /// @ai:intent Text of the string literal opening line `at`, if it is a non-empty docstring
    /// @ai:edge_cases an unterminated literal runs to the end of the file
    fn docstring_at(&self, lines: &[&str], at: usize) -> Option<String> {
        let code = lines.get(at)?.trim_start();
        let opening = self.string_open.captures(code)?;
        let quote = opening.get(1)?.as_str();
        let rest = &code[opening.get(0)?.end()..];

        let text = if let Some(end) = rest.find(quote) {
            rest[..end].to_string()
        } else if quote.len() == 1 {
            rest.to_string()
        } else {
            let mut parts = vec![rest];
            for line in &lines[at + 1..] {
                match line.find(quote) {
                    Some(end) => {
                        parts.push(&line[..end]);
                        break;
                    }
                    None => parts.push(line),
                }
            }
            parts.join("\n")
        };

        (!text.trim().is_empty()).then_some(text)
    }
}

/// First line at or after `from` with code on it.
fn next_code_line(lines: &[&str], from: usize) -> Option<usize> {
    (from..lines.len()).find(|&i| {
        let trimmed = lines[i].trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}

/// @ai:intent First body line of the definition starting at `header`
/// @ai:post None for one-line definitions such as `def f(): return 1`
fn body_start(lines: &[&str], header: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    for (offset, line) in lines[header..].iter().enumerate() {
        let code = line.split('#').next().unwrap_or_default();
        for ch in code.chars() {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        if depth <= 0 {
            return if code.trim_end().ends_with(':') {
                next_code_line(lines, header + offset + 1)
            } else {
                None
            };
        }
    }
    None
}

/// @ai:intent Scores documentation from source text alone; needs no external tool
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationBenchmark;

impl DocumentationBenchmark {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Benchmark for DocumentationBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Documentation
    }

    async fn produce(&self, codebase: &Codebase, _settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let scan = DocstringScanner::new()?.scan(codebase);
        let coverage = scan.coverage().unwrap_or_default();
        let mut details = vec![
            format!(
                "Documentation coverage: {:.2}% ({}/{})",
                coverage * 100.0,
                scan.documented,
                scan.entities
            ),
            format!(
                "Thorough docstrings: {}/{} ({:.2}%)",
                scan.thorough,
                scan.documented,
                scan.thoroughness() * 100.0
            ),
        ];
        details.extend(scan.findings.iter().cloned());

        let result = BenchmarkResult::new(scan.score(), details)
            .with_metric("documentable_entities", scan.entities)
            .with_metric("documented_entities", scan.documented)
            .with_metric("thorough_docstrings", scan.thorough)
            .with_metric("coverage_percent", coverage * 100.0);

        Ok(size_adjusted(result, codebase, MetricKind::VolumeSensitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#""""Billing helpers."""

def total(items):
    """Sum item prices.

    Args:
        items: priced items
    Returns:
        the sum
    """
    return sum(i.price for i in items)


class Invoice:
    def render(self,
               fmt="pdf"):
        return fmt

async def send(invoice): return invoice
"#;

    fn scan(source: &str) -> DocstringScan {
        let mut scan = DocstringScan::default();
        DocstringScanner::new()
            .unwrap()
            .scan_source("billing.py", source, &mut scan);
        scan
    }

    #[test]
    fn test_thorough_docstring_heuristic() {
        assert!(is_thorough_docstring("Sum.\n\nArgs:\n    xs: values\nReturns:\n    total"));
        assert!(is_thorough_docstring("Sum.\nParameters: xs\nReturns: total"));
        assert!(!is_thorough_docstring("Sum the values."));
        assert!(!is_thorough_docstring("Sum.\nArgs: xs\nmore text"));
        assert!(!is_thorough_docstring("Sum.\nArgs: xs\n\n\n\n\n\n\nReturns: total"));
    }

    #[test]
    fn test_scan_counts_entities_and_docstrings() {
        let scan = scan(SOURCE);
        assert_eq!(scan.entities, 5);
        assert_eq!(scan.documented, 2);
        assert_eq!(scan.thorough, 1);
        assert_eq!(
            scan.findings,
            vec![
                "Missing docstring for 'Invoice' in billing.py:14".to_string(),
                "Missing docstring for 'render' in billing.py:15".to_string(),
                "Missing docstring for 'send' in billing.py:19".to_string(),
            ]
        );
        assert!((scan.score() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_definitions_inside_docstrings_are_ignored() {
        let source = "\"\"\"Usage:\n\n    def example():\n        pass\n\"\"\"\n";
        let scan = scan(source);
        assert_eq!(scan.entities, 1);
        assert_eq!(scan.documented, 1);
    }

    #[test]
    fn test_empty_and_fstring_literals_are_not_docstrings() {
        let scan = scan("def a():\n    \"\"\n\ndef b():\n    f\"\"\"x\"\"\"\n");
        assert_eq!(scan.entities, 3);
        assert_eq!(scan.documented, 0);
        assert_eq!(scan.score(), 0.0);
    }

    #[test]
    fn test_single_quoted_docstrings_count() {
        let scan = scan("'module'\n\nclass A:\n    'A thing.'\n");
        assert_eq!(scan.documented, 2);
        assert_eq!(scan.coverage(), Some(1.0));
    }

    #[tokio::test]
    async fn test_produce_is_volume_sensitive() {
        let codebase = fixtures::codebase(&[("billing.py", SOURCE)]);
        let result = DocumentationBenchmark::new()
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        // 4.5 plus the tiny-codebase volume bonus of 1.0
        assert!((result.score - 5.5).abs() < 1e-9);
        assert_eq!(result.details[0], "Documentation coverage: 40.00% (2/5)");
        assert_eq!(result.details[1], "Thorough docstrings: 1/2 (50.00%)");
        assert_eq!(result.raw_metrics["documentable_entities"], 5);
        assert_eq!(result.raw_metrics["size_adjustment"], 1.0);
    }
}
