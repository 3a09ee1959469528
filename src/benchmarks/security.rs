//! @ai:module:intent Security from static scanners blended with an optional dynamic web scan
//! @ai:module:layer domain
//! @ai:module:public_api SecurityBenchmark, TargetProbe, HttpProbe, parse_bandit, parse_safety, parse_zap_summary
//! @ai:module:stateless true

use crate::benchmarks::{no_sources, size_adjusted, Benchmark, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::{BenchError, Result};
use crate::scoring::{
    FindingCounts, HybridBlender, Severity, SeverityPenalties, Signal, TOOL_FALLBACK_SCORE,
};
use crate::stats::{clamp_score, MetricKind, SCORE_MAX};
use crate::toolchain::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const BANDIT_WEIGHT: f64 = 0.7;
const SAFETY_WEIGHT: f64 = 0.3;
const SAFETY_PENALTY_PER_VULN: f64 = 2.0;
/// Score when there is no dependency manifest to audit.
const NO_MANIFEST_SCORE: f64 = 8.0;
const LISTED_BANDIT_FINDINGS: usize = 10;
const LISTED_SAFETY_FINDINGS: usize = 5;
const ZAP_IMAGE: &str = "ghcr.io/zaproxy/zaproxy:stable";
const CONTAINER_REMOVAL_TIMEOUT: Duration = Duration::from_secs(30);

static ZAP_CONTAINER_SEQ: AtomicU64 = AtomicU64::new(0);

/// @ai:intent Container name unique within this host and process
/// @ai:effects state:write
fn zap_container_name() -> String {
    format!(
        "codebench-zap-{}-{}",
        std::process::id(),
        ZAP_CONTAINER_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// @ai:intent Checks that a dynamic-scan target answers before scanning it
#[async_trait]
pub trait TargetProbe: Send + Sync {
    /// @ai:post Err is always TargetUnreachable
    async fn probe(&self, url: &str, timeout: Duration) -> Result<()>;
}

/// @ai:intent Probe over HTTP; any HTTP response, even an error status, counts as reachable
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TargetProbe for HttpProbe {
    /// @ai:effects network
    async fn probe(&self, url: &str, timeout: Duration) -> Result<()> {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                tracing::debug!("Dynamic scan target {} answered {}", url, response.status());
                Ok(())
            }
            Err(e) => Err(BenchError::TargetUnreachable(format!("{}: {}", url, e))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BanditReport {
    #[serde(default)]
    results: Vec<BanditFinding>,
}

#[derive(Debug, Deserialize)]
struct BanditFinding {
    issue_severity: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    line_number: u32,
}

/// @ai:intent Severity counts and listed findings of a bandit run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BanditSummary {
    pub counts: FindingCounts,
    pub findings: Vec<String>,
}

/// @ai:intent Parse `bandit -f json` output
/// @ai:effects pure
pub fn parse_bandit(stdout: &str) -> Result<BanditSummary> {
    let report: BanditReport = serde_json::from_str(stdout)
        .map_err(|e| BenchError::parse("bandit", format!("invalid JSON report: {}", e)))?;

    let mut summary = BanditSummary::default();
    for finding in &report.results {
        if let Some(severity) = Severity::parse(&finding.issue_severity) {
            summary.counts.record(severity);
        }
    }
    summary.findings = report
        .results
        .iter()
        .take(LISTED_BANDIT_FINDINGS)
        .map(|f| format!("  - {} ({}:{})", f.issue_text, f.filename, f.line_number))
        .collect();
    Ok(summary)
}

/// @ai:intent Parse `safety check --json` output into vulnerable package descriptions
/// @ai:edge_cases accepts both the legacy list layout and the object layout with `vulnerabilities`
/// @ai:effects pure
pub fn parse_safety(stdout: &str) -> Result<Vec<String>> {
    let report: Value = serde_json::from_str(stdout)
        .map_err(|e| BenchError::parse("safety", format!("invalid JSON report: {}", e)))?;

    let entries = match &report {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("vulnerabilities") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(BenchError::parse("safety", "report has no vulnerabilities list")),
        },
        _ => return Err(BenchError::parse("safety", "unexpected report layout")),
    };

    Ok(entries
        .iter()
        .map(|entry| match entry {
            Value::Object(v) => {
                let package = v.get("package_name").and_then(Value::as_str).unwrap_or("?");
                let advisory = v.get("advisory").and_then(Value::as_str).unwrap_or_default();
                format!("{}: {}", package, truncate(advisory, 100))
            }
            Value::Array(fields) => {
                let package = fields.first().and_then(Value::as_str).unwrap_or("?");
                let advisory = fields.get(3).and_then(Value::as_str).unwrap_or_default();
                format!("{}: {}", package, truncate(advisory, 100))
            }
            other => other.to_string(),
        })
        .collect())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// @ai:intent Parse the summary line of `zap-baseline.py`
/// @ai:post FAIL-NEW counts as high, WARN-NEW as medium, INFO as low
/// @ai:effects pure
pub fn parse_zap_summary(stdout: &str) -> Result<FindingCounts> {
    let counter = |label: &str| -> Result<Option<u32>> {
        let re = Regex::new(&format!(r"\b{}:\s*(\d+)", regex::escape(label)))?;
        Ok(re
            .captures_iter(stdout)
            .last()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()))
    };

    match (counter("FAIL-NEW")?, counter("WARN-NEW")?, counter("INFO")?) {
        (None, None, None) => Err(BenchError::parse("zap", "no baseline summary in output")),
        (high, medium, low) => Ok(FindingCounts {
            high: high.unwrap_or(0),
            medium: medium.unwrap_or(0),
            low: low.unwrap_or(0),
        }),
    }
}

/// @ai:intent Hybrid security benchmark: bandit + safety, optionally ZAP baseline
pub struct SecurityBenchmark {
    tools: Arc<dyn ToolRunner>,
    probe: Arc<dyn TargetProbe>,
    blender: HybridBlender,
}

impl SecurityBenchmark {
    pub fn new(tools: Arc<dyn ToolRunner>, probe: Arc<dyn TargetProbe>) -> Self {
        Self {
            tools,
            probe,
            blender: HybridBlender::static_dynamic(),
        }
    }

    /// @ai:effects io
    async fn bandit(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BanditSummary> {
        let invocation = ToolInvocation::new("bandit", settings.tool_timeout)
            .args(["-r", "-f", "json", "-q", "-x", ".venv,venv,node_modules,.git"])
            .arg(codebase.root.to_string_lossy())
            .current_dir(&codebase.root);
        let output = self.tools.run(invocation).await?;
        parse_bandit(&output.stdout)
    }

    /// @ai:effects io
    async fn safety(&self, codebase: &Codebase, settings: &RunSettings) -> Option<Result<Vec<String>>> {
        let manifest = codebase.root.join("requirements.txt");
        if !manifest.is_file() {
            return None;
        }
        let invocation = ToolInvocation::new("safety", settings.tool_timeout)
            .args(["check", "--json"])
            .arg(format!("--file={}", manifest.display()))
            .current_dir(&codebase.root);
        Some(match self.tools.run(invocation).await {
            Ok(output) => parse_safety(&output.stdout),
            Err(e) => Err(e),
        })
    }

    /// @ai:intent Static signal; each tool that fails contributes its fallback score
    /// @ai:effects io
    async fn static_signal(&self, codebase: &Codebase, settings: &RunSettings) -> Signal {
        let mut signal = Signal::default();

        let bandit_score = match self.bandit(codebase, settings).await {
            Ok(summary) => {
                let counts = summary.counts;
                signal = signal
                    .detail(format!(
                        "[Bandit] High: {}, Medium: {}, Low: {}",
                        counts.high, counts.medium, counts.low
                    ))
                    .metric("bandit_high", counts.high)
                    .metric("bandit_medium", counts.medium)
                    .metric("bandit_low", counts.low);
                signal.details.extend(summary.findings);
                SeverityPenalties::STATIC_SCAN.score(&counts)
            }
            Err(e) => {
                tracing::warn!("Bandit scan failed: {}", e);
                signal = signal.detail(format!(
                    "[Bandit] Could not run bandit: {}. Fallback score {:.1} used.",
                    e, TOOL_FALLBACK_SCORE
                ));
                TOOL_FALLBACK_SCORE
            }
        };

        let safety_score = match self.safety(codebase, settings).await {
            None => {
                signal = signal.detail("[Safety] No requirements.txt found.");
                NO_MANIFEST_SCORE
            }
            Some(Ok(vulnerabilities)) => {
                signal = signal
                    .detail(format!("[Safety] {} vulnerable dependencies", vulnerabilities.len()))
                    .metric("safety_vulnerabilities", vulnerabilities.len());
                let count = vulnerabilities.len();
                signal.details.extend(
                    vulnerabilities
                        .into_iter()
                        .take(LISTED_SAFETY_FINDINGS)
                        .map(|v| format!("  - {}", v)),
                );
                clamp_score(SCORE_MAX - count as f64 * SAFETY_PENALTY_PER_VULN)
            }
            Some(Err(e)) => {
                tracing::warn!("Safety scan failed: {}", e);
                signal = signal.detail(format!(
                    "[Safety] Could not run safety: {}. Fallback score {:.1} used.",
                    e, TOOL_FALLBACK_SCORE
                ));
                TOOL_FALLBACK_SCORE
            }
        };

        let static_score = clamp_score(BANDIT_WEIGHT * bandit_score + SAFETY_WEIGHT * safety_score);
        signal.score = static_score;
        signal
            .metric("bandit_score", bandit_score)
            .metric("safety_score", safety_score)
            .metric("static_score", static_score)
    }

    /// @ai:intent Dynamic signal from a ZAP baseline scan of the configured web app
    /// @ai:effects network, io
    async fn dynamic_signal(&self, settings: &RunSettings) -> Result<Signal> {
        let url = settings
            .web_app_url
            .as_deref()
            .ok_or_else(|| BenchError::TargetUnreachable("no web app URL configured".to_string()))?;
        self.probe.probe(url, settings.probe_timeout).await?;

        let container = zap_container_name();
        let invocation = ToolInvocation::new("docker", settings.dynamic_scan_timeout)
            .args(["run", "--rm", "--name", container.as_str()])
            .args(["--network", "host", ZAP_IMAGE, "zap-baseline.py", "-t"])
            .arg(url);
        let output = match self.tools.run(invocation).await {
            Ok(output) => output,
            Err(e @ BenchError::Timeout { .. }) => {
                self.remove_container(&container).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let counts = parse_zap_summary(&output.stdout)?;
        let score = SeverityPenalties::DYNAMIC_SCAN.score(&counts);

        Ok(Signal::new(score)
            .detail(format!(
                "[ZAP] Findings - High: {}, Medium: {}, Low: {}",
                counts.high, counts.medium, counts.low
            ))
            .metric("zap_high", counts.high)
            .metric("zap_medium", counts.medium)
            .metric("zap_low", counts.low)
            .metric("dynamic_score", score))
    }

    /// @ai:intent Force-remove a scan container left running after its client was killed
    /// @ai:edge_cases removal failures are logged, never raised
    /// @ai:effects io
    async fn remove_container(&self, name: &str) {
        let invocation =
            ToolInvocation::new("docker", CONTAINER_REMOVAL_TIMEOUT).args(["rm", "-f", name]);
        match self.tools.run(invocation).await {
            Ok(output) if output.success => {
                tracing::info!("Removed timed-out ZAP container {}", name)
            }
            Ok(output) => tracing::warn!(
                "Could not remove ZAP container {}: {}",
                name,
                output.stderr.trim()
            ),
            Err(e) => tracing::warn!("Could not remove ZAP container {}: {}", name, e),
        }
    }
}

#[async_trait]
impl Benchmark for SecurityBenchmark {
    fn dimension(&self) -> Dimension {
        Dimension::Security
    }

    async fn produce(&self, codebase: &Codebase, settings: &RunSettings) -> Result<BenchmarkResult> {
        if codebase.is_empty() {
            return Ok(no_sources());
        }

        let primary = self.static_signal(codebase, settings).await;
        let secondary = self.dynamic_signal(settings).await;
        if let Err(e) = &secondary {
            tracing::info!("Security dynamic scan skipped: {}", e);
        }

        let result = self
            .blender
            .blend(primary, secondary)
            .into_result("Dynamic analysis");
        Ok(size_adjusted(result, codebase, MetricKind::General))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::fixtures;
    use crate::toolchain::{MockResponse, MockToolRunner};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const BANDIT: &str = r#"{
        "errors": [],
        "results": [
            {"issue_severity": "HIGH", "issue_confidence": "HIGH", "issue_text": "Use of exec detected.", "filename": "app.py", "line_number": 3},
            {"issue_severity": "MEDIUM", "issue_confidence": "LOW", "issue_text": "Possible SQL injection.", "filename": "db.py", "line_number": 14},
            {"issue_severity": "LOW", "issue_confidence": "HIGH", "issue_text": "Consider possible security implications.", "filename": "db.py", "line_number": 1}
        ]
    }"#;

    const ZAP: &str = "\
PASS: Vulnerable JS Library [10003]
WARN-NEW: X-Content-Type-Options Header Missing [10021] x 4
FAIL-NEW: 1	FAIL-INPROG: 0	WARN-NEW: 2	WARN-INPROG: 0	INFO: 3	IGNORE: 0	PASS: 52
";

    struct ReachableProbe;

    #[async_trait]
    impl TargetProbe for ReachableProbe {
        async fn probe(&self, _url: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }
    }

    struct DownProbe;

    #[async_trait]
    impl TargetProbe for DownProbe {
        async fn probe(&self, url: &str, _timeout: Duration) -> Result<()> {
            Err(BenchError::TargetUnreachable(format!("{}: connection refused", url)))
        }
    }

    fn settings_with_url() -> RunSettings {
        RunSettings {
            web_app_url: Some("http://localhost:8000".to_string()),
            ..RunSettings::default()
        }
    }

    #[test]
    fn test_parse_bandit_counts_severities() {
        let summary = parse_bandit(BANDIT).unwrap();
        assert_eq!(
            summary.counts,
            FindingCounts {
                high: 1,
                medium: 1,
                low: 1
            }
        );
        assert_eq!(summary.findings[0], "  - Use of exec detected. (app.py:3)");
        assert_eq!(SeverityPenalties::STATIC_SCAN.score(&summary.counts), 5.5);
    }

    #[test]
    fn test_parse_safety_layouts() {
        let legacy = r#"[["django", "<2.2", "2.1", "Django 2.1 has a SQL injection flaw.", "12345"]]"#;
        assert_eq!(
            parse_safety(legacy).unwrap(),
            vec!["django: Django 2.1 has a SQL injection flaw.".to_string()]
        );

        let modern = r#"{"vulnerabilities": [{"package_name": "flask", "advisory": "Flask leaks sessions."}], "ignored": []}"#;
        assert_eq!(
            parse_safety(modern).unwrap(),
            vec!["flask: Flask leaks sessions.".to_string()]
        );

        assert_eq!(parse_safety("[]").unwrap().len(), 0);
        assert!(parse_safety("\"oops\"").is_err());
    }

    #[test]
    fn test_parse_zap_summary_uses_summary_counters() {
        let counts = parse_zap_summary(ZAP).unwrap();
        assert_eq!(
            counts,
            FindingCounts {
                high: 1,
                medium: 2,
                low: 3
            }
        );
        assert_eq!(SeverityPenalties::DYNAMIC_SCAN.score(&counts), 0.5);
    }

    #[test]
    fn test_parse_zap_without_summary_is_parse_failure() {
        let err = parse_zap_summary("docker: image not found").unwrap_err();
        assert_eq!(err.kind(), "parse_failure");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_without_url_score_is_static_only() {
        let tools = MockToolRunner::new().with_stdout("bandit", r#"{"results": []}"#);
        let benchmark = SecurityBenchmark::new(Arc::new(tools), Arc::new(ReachableProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        let result = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        // 0.7 * 10 + 0.3 * 8 (no requirements.txt), plus 0.5 tiny bonus
        assert!((result.score - 9.9).abs() < 1e-9);
        assert!(result
            .details
            .iter()
            .any(|d| d.contains("Dynamic analysis skipped") && d.contains("no web app URL")));
        assert_eq!(result.raw_metrics["blend_mode"], "primary_only");
    }

    #[tokio::test]
    async fn test_unreachable_target_falls_back_without_running_docker() {
        let tools = Arc::new(MockToolRunner::new().with_stdout("bandit", r#"{"results": []}"#));
        let benchmark = SecurityBenchmark::new(tools.clone(), Arc::new(DownProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        let result = benchmark.produce(&codebase, &settings_with_url()).await.unwrap();

        assert!(tools.calls().iter().all(|c| c.program != "docker"));
        assert!(result.details.iter().any(|d| d.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_dynamic_timeout_falls_back_to_static() {
        let tools = MockToolRunner::new()
            .with_stdout("bandit", r#"{"results": []}"#)
            .with("docker", MockResponse::Timeout);
        let benchmark = SecurityBenchmark::new(Arc::new(tools), Arc::new(ReachableProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        let result = benchmark.produce(&codebase, &settings_with_url()).await.unwrap();

        assert!((result.score - 9.9).abs() < 1e-9);
        assert!(result.details.iter().any(|d| d.contains("time limit")));
    }

    #[tokio::test]
    async fn test_timed_out_scan_removes_its_container() {
        let tools = Arc::new(
            MockToolRunner::new()
                .with_stdout("bandit", r#"{"results": []}"#)
                .with("docker", MockResponse::Timeout),
        );
        let benchmark = SecurityBenchmark::new(tools.clone(), Arc::new(ReachableProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        benchmark.produce(&codebase, &settings_with_url()).await.unwrap();

        let docker: Vec<_> = tools
            .calls()
            .into_iter()
            .filter(|c| c.program == "docker")
            .collect();
        assert_eq!(docker.len(), 2);
        let name_at = docker[0].args.iter().position(|a| a == "--name").unwrap();
        let name = docker[0].args[name_at + 1].clone();
        assert!(name.starts_with("codebench-zap-"));
        assert_eq!(docker[1].args, vec!["rm".to_string(), "-f".to_string(), name]);
    }

    #[tokio::test]
    async fn test_finished_scan_needs_no_cleanup() {
        let tools = Arc::new(
            MockToolRunner::new()
                .with_stdout("bandit", r#"{"results": []}"#)
                .with_stdout("docker", ZAP),
        );
        let benchmark = SecurityBenchmark::new(tools.clone(), Arc::new(ReachableProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        benchmark.produce(&codebase, &settings_with_url()).await.unwrap();

        let docker = tools.calls().into_iter().filter(|c| c.program == "docker").count();
        assert_eq!(docker, 1);
    }

    #[test]
    fn test_container_names_are_unique() {
        assert_ne!(zap_container_name(), zap_container_name());
    }

    #[tokio::test]
    async fn test_blends_static_and_dynamic() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask==0.1\n").unwrap();
        fs::write(dir.path().join("app.py"), "print(1)\n").unwrap();
        let codebase = Codebase::scan(dir.path(), &["py".to_string()]).unwrap();

        let tools = MockToolRunner::new()
            .with_stdout("bandit", BANDIT)
            .with_stdout("safety", "[]")
            .with_stdout("docker", ZAP);
        let benchmark = SecurityBenchmark::new(Arc::new(tools), Arc::new(ReachableProbe));

        let result = benchmark.produce(&codebase, &settings_with_url()).await.unwrap();

        // static = 0.7 * 5.5 + 0.3 * 10 = 6.85; final = 0.6 * 6.85 + 0.4 * 0.5 + 0.5
        assert!((result.score - 4.81).abs() < 1e-9);
        assert_eq!(result.raw_metrics["blend_mode"], "blended");
        assert_eq!(result.raw_metrics["zap_high"], 1);
        assert_eq!(result.raw_metrics["bandit_high"], 1);
    }

    #[tokio::test]
    async fn test_missing_static_tools_use_fallback_scores() {
        let benchmark =
            SecurityBenchmark::new(Arc::new(MockToolRunner::new()), Arc::new(ReachableProbe));
        let codebase = fixtures::codebase(&[("app.py", "print(1)\n")]);

        let result = benchmark
            .produce(&codebase, &RunSettings::default())
            .await
            .unwrap();

        // 0.7 * 5 + 0.3 * 8, plus 0.5 tiny bonus
        assert!((result.score - 6.4).abs() < 1e-9);
        assert!(result.details.iter().any(|d| d.starts_with("[Bandit] Could not run")));
    }
}
