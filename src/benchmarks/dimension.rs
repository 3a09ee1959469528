//! @ai:module:intent Closed set of quality dimensions known at compile time
//! @ai:module:layer domain
//! @ai:module:public_api Dimension
//! @ai:module:stateless true

use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// @ai:intent One named quality axis scored independently per codebase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Readability,
    Maintainability,
    Performance,
    Testability,
    Robustness,
    Security,
    Scalability,
    Documentation,
    Consistency,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Readability,
        Dimension::Maintainability,
        Dimension::Performance,
        Dimension::Testability,
        Dimension::Robustness,
        Dimension::Security,
        Dimension::Scalability,
        Dimension::Documentation,
        Dimension::Consistency,
    ];

    /// @ai:intent Display name used in exports, history and CLI output
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Readability => "Readability",
            Dimension::Maintainability => "Maintainability",
            Dimension::Performance => "Performance",
            Dimension::Testability => "Testability",
            Dimension::Robustness => "Robustness",
            Dimension::Security => "Security",
            Dimension::Scalability => "Scalability",
            Dimension::Documentation => "Documentation",
            Dimension::Consistency => "Consistency",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = BenchError;

    /// @ai:intent Parse a dimension name case-insensitively
    /// @ai:effects pure
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                BenchError::Config(format!(
                    "Unknown dimension '{}'. Known dimensions: {}",
                    wanted,
                    Dimension::ALL
                        .iter()
                        .map(|d| d.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("security".parse::<Dimension>().unwrap(), Dimension::Security);
        assert_eq!(" PERFORMANCE ".parse::<Dimension>().unwrap(), Dimension::Performance);
        assert_eq!("documentation".parse::<Dimension>().unwrap(), Dimension::Documentation);
    }

    #[test]
    fn test_parse_unknown_is_config_error() {
        let err = "GitHealth".parse::<Dimension>().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Readability"));
    }

    #[test]
    fn test_serializes_as_display_name() {
        let json = serde_json::to_string(&Dimension::Maintainability).unwrap();
        assert_eq!(json, "\"Maintainability\"");
    }
}
