use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which phase of a text scan came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStage {
    /// No element carried the target text.
    Target,
    /// Target candidates existed but none sat inside a container holding the related text.
    Related,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStage::Target => write!(f, "target text"),
            MatchStage::Related => write!(f, "related text"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("No match found for {stage} '{text}'")]
    NoMatchFound { stage: MatchStage, text: String },

    #[error("Cannot build a composite locator from an empty strategy list")]
    EmptyStrategyList,

    #[error("Strategy '{selector}' failed: {reason}")]
    InvalidStrategyExecution { selector: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Document query failed: {0}")]
    Document(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, LocatorError>;

// Convert anyhow::Error to LocatorError
impl From<anyhow::Error> for LocatorError {
    fn from(err: anyhow::Error) -> Self {
        LocatorError::AnyhowError(err.to_string())
    }
}

impl LocatorError {
    pub fn invalid_strategy<E: fmt::Display>(selector: &str, err: E) -> Self {
        LocatorError::InvalidStrategyExecution {
            selector: selector.to_string(),
            reason: err.to_string(),
        }
    }

    /// Failures a caller can route around instead of aborting: a single bad
    /// strategy, or an element that went stale and can be re-derived.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LocatorError::InvalidStrategyExecution { .. } | LocatorError::ElementNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_names_stage() {
        let err = LocatorError::NoMatchFound {
            stage: MatchStage::Related,
            text: "iPhone 15 Pro".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No match found for related text 'iPhone 15 Pro'"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(LocatorError::invalid_strategy("div[", "unexpected end").is_recoverable());
        assert!(LocatorError::ElementNotFound("#gone".to_string()).is_recoverable());
        assert!(!LocatorError::EmptyStrategyList.is_recoverable());
    }

    #[test]
    fn test_from_anyhow() {
        let err: LocatorError = anyhow::anyhow!("tab crashed").into();
        assert!(matches!(err, LocatorError::AnyhowError(ref m) if m == "tab crashed"));
    }
}
