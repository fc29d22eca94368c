//! Confidence Labels
//!
//! The four output classes of the classifier. Order is fixed: it is the
//! column order of the classifier head and of every probability vector.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Number of output classes
pub const NUM_CLASSES: usize = 4;

/// Confidence level - both the model's class and the business risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    FalsePositive,
}

impl ConfidenceLevel {
    /// All labels in classifier column order
    pub const ALL: [ConfidenceLevel; NUM_CLASSES] = [
        ConfidenceLevel::High,
        ConfidenceLevel::Medium,
        ConfidenceLevel::Low,
        ConfidenceLevel::FalsePositive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::FalsePositive => "false_positive",
        }
    }

    /// Column index in the classifier head
    pub fn index(&self) -> usize {
        match self {
            ConfidenceLevel::High => 0,
            ConfidenceLevel::Medium => 1,
            ConfidenceLevel::Low => 2,
            ConfidenceLevel::FalsePositive => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(ConfidenceLevel::High),
            "medium" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            "false_positive" => Ok(ConfidenceLevel::FalsePositive),
            other => Err(EngineError::Validation(format!("invalid label '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        for (i, level) in ConfidenceLevel::ALL.iter().enumerate() {
            assert_eq!(level.index(), i);
            assert_eq!(ConfidenceLevel::from_index(i), Some(*level));
        }
        assert_eq!(ConfidenceLevel::from_index(NUM_CLASSES), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("false_positive".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::FalsePositive);
        assert!("critical".parse::<ConfidenceLevel>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ConfidenceLevel::FalsePositive).unwrap();
        assert_eq!(json, "\"false_positive\"");
    }
}
