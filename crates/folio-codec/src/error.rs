//! Error types for the YAML codec
//!
//! - Parse operations (text → value)
//! - Serialize operations (value → text)

use std::path::PathBuf;

/// Errors while reading a YAML document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed YAML text
    #[error("syntax error{}: {message}", location(.path))]
    Syntax {
        /// File the text came from, when known
        path: Option<PathBuf>,
        /// Message reported by the YAML scanner
        message: String,
    },

    /// Document parsed, but its top level is not a mapping
    #[error("expected a mapping at the top level{}, found {found}", location(.path))]
    NotAMapping {
        /// File the text came from, when known
        path: Option<PathBuf>,
        /// Kind of node that was found instead
        found: &'static str,
    },
}

impl ParseError {
    /// Create syntax error without a path
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            path: None,
            message: message.into(),
        }
    }

    /// Attach the originating file to the error
    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        let path = Some(path.into());
        match self {
            Self::Syntax { message, .. } => Self::Syntax { path, message },
            Self::NotAMapping { found, .. } => Self::NotAMapping { path, found },
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

/// Errors while producing YAML text
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Typed value could not be converted to a YAML node
    #[error("cannot convert value to yaml: {0}")]
    Convert(#[from] serde_yaml::Error),

    /// Mapping keys must be scalars
    #[error("mapping key must be a scalar, found {0}")]
    ComplexKey(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_without_path() {
        let err = ParseError::syntax("bad indent");
        assert_eq!(err.to_string(), "syntax error: bad indent");
    }

    #[test]
    fn syntax_error_display_with_path() {
        let err = ParseError::syntax("bad indent").with_path("/data/active.yaml");
        assert_eq!(
            err.to_string(),
            "syntax error in /data/active.yaml: bad indent"
        );
    }

    #[test]
    fn not_a_mapping_keeps_kind() {
        let err = ParseError::NotAMapping {
            path: None,
            found: "sequence",
        }
        .with_path("season.yaml");
        assert!(err.to_string().contains("found sequence"));
        assert!(err.to_string().contains("season.yaml"));
    }
}
