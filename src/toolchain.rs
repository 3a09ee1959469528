//! @ai:module:intent Bounded invocation of external analyzer tools and availability checks
//! @ai:module:layer infrastructure
//! @ai:module:public_api ToolRunner, SystemToolRunner, MockToolRunner, ToolInvocation, ToolOutput, ToolchainValidator, ToolchainStatus
//! @ai:module:stateless true

use crate::benchmarks::Dimension;
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// @ai:intent One external command with its time ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// @ai:intent Captured result of a finished tool process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ToolOutput {
    /// @ai:intent Successful output carrying only stdout
    /// @ai:effects pure
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }
}

/// @ai:intent Trait for running external tools under a timeout
/// @ai:post a missing binary maps to ToolUnavailable, an expired ceiling to Timeout
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput>;
}

/// @ai:intent Runs tools as child processes, killing them when the ceiling expires
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    /// @ai:intent Spawn the tool, wait at most `timeout`, capture its output
    /// @ai:effects io
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!("Running {} {:?}", invocation.program, invocation.args);
        let start = Instant::now();

        let output = match tokio::time::timeout(invocation.timeout, command.output()).await {
            Err(_) => {
                return Err(BenchError::Timeout {
                    tool: invocation.program,
                    limit: invocation.timeout,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BenchError::ToolUnavailable {
                    hint: install_hint(&invocation.program).to_string(),
                    tool: invocation.program,
                })
            }
            Ok(Err(e)) => return Err(BenchError::Io(e)),
            Ok(Ok(output)) => output,
        };

        let result = ToolOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            "{} exited with {:?} after {:?}",
            invocation.program,
            result.exit_code,
            result.elapsed
        );
        Ok(result)
    }
}

/// @ai:intent Scripted response of the mock runner
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(ToolOutput),
    Missing,
    Timeout,
}

/// @ai:intent Tool runner returning scripted outputs keyed by program name
/// @ai:edge_cases programs without a script behave as not installed
#[derive(Debug, Default)]
pub struct MockToolRunner {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: &str, response: MockResponse) -> Self {
        self.responses.insert(program.to_string(), response);
        self
    }

    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        self.with(program, MockResponse::Output(ToolOutput::stdout(stdout)))
    }

    /// @ai:intent Invocations received so far, in call order
    /// @ai:effects state:read
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        match self.responses.get(&invocation.program) {
            Some(MockResponse::Output(output)) => Ok(output.clone()),
            Some(MockResponse::Timeout) => Err(BenchError::Timeout {
                tool: invocation.program,
                limit: invocation.timeout,
            }),
            Some(MockResponse::Missing) | None => Err(BenchError::ToolUnavailable {
                hint: install_hint(&invocation.program).to_string(),
                tool: invocation.program,
            }),
        }
    }
}

/// @ai:intent Install hint for a known analyzer tool
/// @ai:effects pure
pub fn install_hint(tool: &str) -> &'static str {
    match tool {
        "radon" => "Install radon: pip install radon",
        "pycodestyle" => "Install pycodestyle: pip install pycodestyle",
        "pytest" => "Install pytest with coverage: pip install pytest pytest-cov",
        "bandit" => "Install bandit: pip install bandit",
        "safety" => "Install safety: pip install safety",
        "docker" => "Install Docker and pull ghcr.io/zaproxy/zaproxy:stable",
        "python" => "Install Python: https://www.python.org/downloads/",
        _ => "Check tool documentation for installation instructions",
    }
}

/// @ai:intent External tool used by a dimension
#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub name: &'static str,
    pub version_args: &'static [&'static str],
    pub used_by: Dimension,
}

/// @ai:intent Availability report for all external tools
#[derive(Debug)]
pub struct ToolchainStatus {
    pub available: Vec<ExternalTool>,
    pub missing: Vec<ExternalTool>,
}

impl ToolchainStatus {
    /// @ai:intent Dimensions that will run degraded or partially because a tool is missing
    /// @ai:effects pure
    pub fn affected_dimensions(&self) -> Vec<Dimension> {
        let mut dims: Vec<_> = self.missing.iter().map(|t| t.used_by).collect();
        dims.sort();
        dims.dedup();
        dims
    }
}

/// @ai:intent Validates that analyzer tools are installed
pub struct ToolchainValidator;

impl ToolchainValidator {
    /// @ai:effects pure
    fn known_tools() -> Vec<ExternalTool> {
        vec![
            ExternalTool {
                name: "radon",
                version_args: &["--version"],
                used_by: Dimension::Readability,
            },
            ExternalTool {
                name: "pycodestyle",
                version_args: &["--version"],
                used_by: Dimension::Readability,
            },
            ExternalTool {
                name: "radon",
                version_args: &["--version"],
                used_by: Dimension::Maintainability,
            },
            ExternalTool {
                name: "python",
                version_args: &["--version"],
                used_by: Dimension::Performance,
            },
            ExternalTool {
                name: "pytest",
                version_args: &["--version"],
                used_by: Dimension::Testability,
            },
            ExternalTool {
                name: "bandit",
                version_args: &["--version"],
                used_by: Dimension::Security,
            },
            ExternalTool {
                name: "safety",
                version_args: &["--version"],
                used_by: Dimension::Security,
            },
            ExternalTool {
                name: "docker",
                version_args: &["--version"],
                used_by: Dimension::Security,
            },
        ]
    }

    /// @ai:intent Check if a command is available on the system
    /// @ai:effects io
    fn is_tool_available(tool: &str, args: &[&str]) -> bool {
        Command::new(tool)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// @ai:intent Probe every known tool once
    /// @ai:effects io
    pub fn validate() -> ToolchainStatus {
        let mut cache: HashMap<&'static str, bool> = HashMap::new();
        let mut available = Vec::new();
        let mut missing = Vec::new();

        for tool in Self::known_tools() {
            let present = *cache
                .entry(tool.name)
                .or_insert_with(|| Self::is_tool_available(tool.name, tool.version_args));
            if present {
                available.push(tool);
            } else {
                missing.push(tool);
            }
        }

        ToolchainStatus { available, missing }
    }

    /// @ai:intent Probe every known tool on the blocking pool, for callers on the async runtime
    /// @ai:effects io
    pub async fn validate_async() -> Result<ToolchainStatus> {
        tokio::task::spawn_blocking(Self::validate)
            .await
            .map_err(|e| BenchError::Io(std::io::Error::other(e)))
    }

    /// @ai:intent Log warnings for missing tools
    /// @ai:effects io
    pub fn log_warnings(status: &ToolchainStatus) {
        for tool in &status.missing {
            tracing::warn!(
                "Tool '{}' not found - {} will be scored in degraded mode. {}",
                tool.name,
                tool.used_by,
                install_hint(tool.name)
            );
        }
    }
}
