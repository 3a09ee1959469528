//! @ai:module:intent Configuration file structs and their validation into run settings
//! @ai:module:layer infrastructure
//! @ai:module:public_api CompareConfig, TimeoutConfig, RunSettings, Weights
//! @ai:module:stateless true

use crate::benchmarks::Dimension;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Weight applied to any dimension absent from the weights map.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// @ai:intent User-facing configuration, loaded from TOML or assembled by the CLI
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub profile_script: Option<PathBuf>,
    #[serde(default)]
    pub web_app_url: Option<String>,
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(default = "default_profile_samples")]
    pub profile_samples: u32,
    #[serde(default = "default_history_db")]
    pub history_db: PathBuf,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// @ai:intent Per-invocation time ceilings, in seconds
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_tool_secs")]
    pub tool_secs: u64,
    #[serde(default = "default_dynamic_scan_secs")]
    pub dynamic_scan_secs: u64,
    #[serde(default = "default_benchmark_secs")]
    pub benchmark_secs: u64,
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            skip: Vec::new(),
            profile_script: None,
            web_app_url: None,
            source_extensions: default_source_extensions(),
            profile_samples: default_profile_samples(),
            history_db: default_history_db(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            tool_secs: default_tool_secs(),
            dynamic_scan_secs: default_dynamic_scan_secs(),
            benchmark_secs: default_benchmark_secs(),
            probe_secs: default_probe_secs(),
        }
    }
}

fn default_source_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_profile_samples() -> u32 {
    3
}

fn default_history_db() -> PathBuf {
    PathBuf::from("benchmark_results.db")
}

fn default_tool_secs() -> u64 {
    300
}

fn default_dynamic_scan_secs() -> u64 {
    120
}

fn default_benchmark_secs() -> u64 {
    900
}

fn default_probe_secs() -> u64 {
    10
}

impl CompareConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Parse a comma-separated skip list and append it
    /// @ai:effects pure
    pub fn extend_skip(&mut self, csv: &str) {
        self.skip.extend(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    /// @ai:intent Parse a JSON weights object and merge it over file weights
    /// @ai:effects pure
    pub fn merge_weights_json(&mut self, json: &str) -> Result<()> {
        let parsed: BTreeMap<String, f64> = serde_json::from_str(json)
            .map_err(|e| BenchError::Config(format!("Invalid JSON format for weights: {}", e)))?;
        self.weights.extend(parsed);
        Ok(())
    }

    /// @ai:intent Validate every field and produce typed run settings
    /// @ai:post Err is always BenchError::Config
    /// @ai:effects pure
    pub fn validate(&self) -> Result<RunSettings> {
        let weights = Weights::from_names(&self.weights)?;

        let skip = self
            .skip
            .iter()
            .map(|name| name.parse::<Dimension>())
            .collect::<Result<BTreeSet<_>>>()?;

        if skip.len() == Dimension::ALL.len() {
            return Err(BenchError::Config(
                "Every dimension is skipped; nothing to compare".to_string(),
            ));
        }

        if self.profile_samples == 0 {
            return Err(BenchError::Config(
                "profile_samples must be at least 1".to_string(),
            ));
        }

        if let Some(url) = &self.web_app_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(BenchError::Config(format!(
                    "Invalid web_app_url '{}': expected an http:// or https:// URL",
                    url
                )));
            }
        }

        let timeouts = &self.timeouts;
        for (name, secs) in [
            ("tool_secs", timeouts.tool_secs),
            ("dynamic_scan_secs", timeouts.dynamic_scan_secs),
            ("benchmark_secs", timeouts.benchmark_secs),
            ("probe_secs", timeouts.probe_secs),
        ] {
            if secs == 0 {
                return Err(BenchError::Config(format!("timeouts.{} must be positive", name)));
            }
        }

        let source_extensions: Vec<String> = self
            .source_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if source_extensions.is_empty() {
            return Err(BenchError::Config(
                "source_extensions must name at least one extension".to_string(),
            ));
        }

        Ok(RunSettings {
            weights,
            skip,
            profile_script: self.profile_script.clone(),
            web_app_url: self.web_app_url.clone(),
            source_extensions,
            profile_samples: self.profile_samples,
            tool_timeout: Duration::from_secs(timeouts.tool_secs),
            dynamic_scan_timeout: Duration::from_secs(timeouts.dynamic_scan_secs),
            benchmark_timeout: Duration::from_secs(timeouts.benchmark_secs),
            probe_timeout: Duration::from_secs(timeouts.probe_secs),
        })
    }
}

/// @ai:intent Validated, typed configuration handed to the runner and benchmarks
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub weights: Weights,
    pub skip: BTreeSet<Dimension>,
    pub profile_script: Option<PathBuf>,
    pub web_app_url: Option<String>,
    pub source_extensions: Vec<String>,
    pub profile_samples: u32,
    pub tool_timeout: Duration,
    pub dynamic_scan_timeout: Duration,
    pub benchmark_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        let config = CompareConfig::default();
        RunSettings {
            weights: Weights::default(),
            skip: BTreeSet::new(),
            profile_script: None,
            web_app_url: None,
            source_extensions: config.source_extensions,
            profile_samples: config.profile_samples,
            tool_timeout: Duration::from_secs(config.timeouts.tool_secs),
            dynamic_scan_timeout: Duration::from_secs(config.timeouts.dynamic_scan_secs),
            benchmark_timeout: Duration::from_secs(config.timeouts.benchmark_secs),
            probe_timeout: Duration::from_secs(config.timeouts.probe_secs),
        }
    }
}

impl RunSettings {
    pub fn is_skipped(&self, dimension: Dimension) -> bool {
        self.skip.contains(&dimension)
    }
}

/// @ai:intent Positive multipliers per dimension; absent dimensions weigh DEFAULT_WEIGHT
/// @ai:invariant every stored weight is finite and > 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights(BTreeMap<Dimension, f64>);

impl Weights {
    /// @ai:intent Build weights from name-keyed input, rejecting unknown names and non-positive values
    /// @ai:effects pure
    pub fn from_names(raw: &BTreeMap<String, f64>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (name, weight) in raw {
            let dimension: Dimension = name.parse()?;
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(BenchError::Config(format!(
                    "Weight for {} must be a positive number, got {}",
                    dimension, weight
                )));
            }
            weights.insert(dimension, *weight);
        }
        Ok(Self(weights))
    }

    /// @ai:intent Weight for a dimension, defaulting to 1.0
    /// @ai:effects pure
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// @ai:intent Weights actually applied to the given dimensions
    /// @ai:effects pure
    pub fn resolved<'a>(
        &self,
        dimensions: impl IntoIterator<Item = &'a Dimension>,
    ) -> BTreeMap<Dimension, f64> {
        dimensions.into_iter().map(|d| (*d, self.get(*d))).collect()
    }
}
