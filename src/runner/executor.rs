//! @ai:module:intent Run every enabled benchmark on both codebases in parallel, isolating failures
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkRunner, RunOutcome, ResultPair, Side
//! @ai:module:stateless false

use crate::benchmarks::{Benchmark, BenchmarkRegistry, BenchmarkResult, Codebase, Dimension};
use crate::config::RunSettings;
use crate::error::BenchError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// @ai:intent Which of the two compared codebases a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => f.write_str("codebase1"),
            Side::Second => f.write_str("codebase2"),
        }
    }
}

/// @ai:intent Results of one dimension for both codebases
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPair {
    pub first: BenchmarkResult,
    pub second: BenchmarkResult,
}

/// @ai:intent Everything a run produced
/// @ai:invariant a dimension is in exactly one of results, skipped or incomplete
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: BTreeMap<Dimension, ResultPair>,
    pub skipped: Vec<Dimension>,
    pub incomplete: Vec<Dimension>,
    pub partial: bool,
}

impl RunOutcome {
    /// @ai:intent Dimensions whose result on either side is degraded
    /// @ai:effects pure
    pub fn degraded_dimensions(&self) -> Vec<Dimension> {
        self.results
            .iter()
            .filter(|(_, pair)| pair.first.is_degraded() || pair.second.is_degraded())
            .map(|(dimension, _)| *dimension)
            .collect()
    }
}

/// Aborts the wrapped task when dropped, so an aborted or timed-out runner task
/// never leaves its benchmark running in the background.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// @ai:intent Parallel, cancellable executor for a benchmark registry
pub struct BenchmarkRunner {
    registry: BenchmarkRegistry,
    cancel: CancellationToken,
}

impl BenchmarkRunner {
    pub fn new(registry: BenchmarkRegistry) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// @ai:intent Use a caller-owned token so an outer layer can stop the run
    /// @ai:effects pure
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// @ai:intent Run every enabled benchmark against both codebases
    /// @ai:post every completed (dimension, side) pair has a result, degraded when it failed
    /// @ai:post on cancellation completed pairs are kept and the outcome is partial
    /// @ai:effects io
    pub async fn run(
        &self,
        first: Arc<Codebase>,
        second: Arc<Codebase>,
        settings: Arc<RunSettings>,
    ) -> RunOutcome {
        let enabled = self.registry.enabled(&settings.skip);
        let mut tasks = JoinSet::new();

        for benchmark in &enabled {
            for (side, codebase) in [(Side::First, &first), (Side::Second, &second)] {
                tracing::info!("Running {} benchmark on {}", benchmark.dimension(), side);
                tasks.spawn(run_isolated(
                    benchmark.clone(),
                    codebase.clone(),
                    settings.clone(),
                    side,
                ));
            }
        }

        let mut slots: BTreeMap<Dimension, (Option<BenchmarkResult>, Option<BenchmarkResult>)> =
            enabled.iter().map(|b| (b.dimension(), (None, None))).collect();
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::warn!("Run cancelled; {} benchmark tasks aborted", tasks.len());
                    tasks.abort_all();
                    cancelled = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((dimension, side, result))) => {
                        if let Some(slot) = slots.get_mut(&dimension) {
                            match side {
                                Side::First => slot.0 = Some(result),
                                Side::Second => slot.1 = Some(result),
                            }
                        }
                    }
                    Some(Err(e)) => tracing::warn!("Benchmark task ended abnormally: {}", e),
                },
            }
        }

        let mut outcome = RunOutcome {
            skipped: settings.skip.iter().copied().collect(),
            ..RunOutcome::default()
        };
        for (dimension, slot) in slots {
            match slot {
                (Some(first), Some(second)) => {
                    outcome.results.insert(dimension, ResultPair { first, second });
                }
                _ => outcome.incomplete.push(dimension),
            }
        }
        outcome.partial = cancelled || !outcome.incomplete.is_empty();

        tracing::info!(
            "Run finished: {} dimensions complete, {} incomplete, {} skipped",
            outcome.results.len(),
            outcome.incomplete.len(),
            outcome.skipped.len()
        );
        outcome
    }
}

/// @ai:intent Run one benchmark under its time limit; never panics, never fails
/// @ai:post errors, panics and timeouts become degraded results
/// @ai:effects io
async fn run_isolated(
    benchmark: Arc<dyn Benchmark>,
    codebase: Arc<Codebase>,
    settings: Arc<RunSettings>,
    side: Side,
) -> (Dimension, Side, BenchmarkResult) {
    let dimension = benchmark.dimension();
    let limit = settings.benchmark_timeout;

    let mut handle = AbortOnDrop(tokio::spawn(async move {
        benchmark.produce(&codebase, &settings).await
    }));

    let result = match tokio::time::timeout(limit, &mut handle.0).await {
        Ok(Ok(Ok(result))) => result,
        Ok(Ok(Err(e))) => {
            tracing::warn!("{} benchmark on {} degraded: {}", dimension, side, e);
            BenchmarkResult::from_error(dimension, &e)
        }
        Ok(Err(join_error)) if join_error.is_panic() => {
            let message = panic_message(join_error.into_panic());
            tracing::warn!("{} benchmark on {} panicked: {}", dimension, side, message);
            BenchmarkResult::degraded(
                dimension,
                &format!("unexpected failure: {}", message),
                "panic",
            )
        }
        Ok(Err(join_error)) => {
            BenchmarkResult::degraded(dimension, &join_error.to_string(), "aborted")
        }
        Err(_) => {
            tracing::warn!("{} benchmark on {} timed out after {:?}", dimension, side, limit);
            let error = BenchError::Timeout {
                tool: format!("{} benchmark", dimension),
                limit,
            };
            BenchmarkResult::from_error(dimension, &error)
        }
    };

    (dimension, side, result)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
