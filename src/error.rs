//! @ai:module:intent Define the error taxonomy for codebase comparison
//! @ai:module:layer domain
//! @ai:module:public_api BenchError, Result
//! @ai:module:stateless true

use std::time::Duration;
use thiserror::Error;

/// @ai:intent Unified error type for scoring, tool invocation and persistence
/// @ai:invariant Config is the only variant that aborts a run; the others degrade one benchmark
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Tool '{tool}' is not available. {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("Target unreachable: {0}")]
    TargetUnreachable(String),

    #[error("Could not interpret output of '{tool}': {message}")]
    ParseFailure { tool: String, message: String },

    #[error("'{tool}' exceeded its {}s time limit", .limit.as_secs())]
    Timeout { tool: String, limit: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("History store error: {0}")]
    History(String),

    #[error("Invalid scan pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl BenchError {
    /// @ai:intent Stable snake_case label recorded in degraded results
    /// @ai:effects pure
    pub fn kind(&self) -> &'static str {
        match self {
            BenchError::ToolUnavailable { .. } => "tool_unavailable",
            BenchError::TargetUnreachable(_) => "target_unreachable",
            BenchError::ParseFailure { .. } => "parse_failure",
            BenchError::Timeout { .. } => "timeout",
            BenchError::Config(_) => "config_error",
            BenchError::Io(_) => "io",
            BenchError::Json(_) => "json",
            BenchError::Toml(_) | BenchError::TomlSer(_) => "toml",
            BenchError::Sqlite(_) | BenchError::History(_) => "history",
            BenchError::Pattern(_) => "pattern",
        }
    }

    /// @ai:intent Whether the error must stop a run before any benchmark starts
    /// @ai:effects pure
    pub fn is_fatal(&self) -> bool {
        matches!(self, BenchError::Config(_))
    }

    pub fn parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::ParseFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
