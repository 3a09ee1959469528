//! @ai:module:intent Benchmark execution across both codebases
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkRunner, RunOutcome, ResultPair, Side

pub mod executor;

pub use executor::{BenchmarkRunner, ResultPair, RunOutcome, Side};
