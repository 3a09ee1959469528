//! @ai:module:intent Codebase quality comparison library
//! @ai:module:layer application
//! @ai:module:public_api benchmarks, compare, config, error, history, metrics, report, runner, scoring, stats, toolchain

pub mod benchmarks;
pub mod compare;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod stats;
pub mod toolchain;

pub use benchmarks::{Benchmark, BenchmarkRegistry, BenchmarkResult, Codebase, Dimension};
pub use compare::Comparison;
pub use config::{CompareConfig, RunSettings, Weights};
pub use error::{BenchError, Result};
pub use history::{HistoryEntry, HistoryStore};
pub use metrics::{ComparisonRecord, Verdict, WeightedAggregator, ZScoreNormalizer};
pub use report::ReportGenerator;
pub use runner::{BenchmarkRunner, RunOutcome};
pub use toolchain::{SystemToolRunner, ToolRunner, ToolchainStatus, ToolchainValidator};
