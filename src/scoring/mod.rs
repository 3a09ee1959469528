//! @ai:module:intent Score composition shared by tool-backed benchmarks
//! @ai:module:layer domain
//! @ai:module:public_api HybridBlender, Signal, SignalBlend, Severity, FindingCounts, SeverityPenalties

pub mod blend;
pub mod severity;

pub use blend::{HybridBlender, Signal, SignalBlend};
pub use severity::{FindingCounts, Severity, SeverityPenalties, TOOL_FALLBACK_SCORE};
