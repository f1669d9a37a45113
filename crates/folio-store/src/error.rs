//! Error types for the folio stores
//!
//! - Missing entities (`NotFound`) and id collisions (`AlreadyExists`)
//! - Rejected input (`Validation`), checked before any write
//! - Unreadable or unwritable YAML files (`Parse`, `Serialize`, `Io`)
//! - Version-control side effects (`Commit`)

use folio_codec::{ParseError, SerializeError};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Kind of record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Base project record in a status partition
    Project,
    /// Task inside a project's detail document
    Task,
    /// Season document
    Season,
    /// Initiative inside a season
    Initiative,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Season => "season",
            Self::Initiative => "initiative",
        })
    }
}

/// Main store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Record required by the operation does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: Entity,
        /// Identifier that was looked up
        id: String,
    },

    /// Target identifier is already taken
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record
        entity: Entity,
        /// Identifier that collided
        id: String,
    },

    /// Input payload rejected before writing
    #[error("validation failed: {0}")]
    Validation(String),

    /// A YAML file on disk could not be read
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A document could not be rendered
    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Post-write commit failed
    #[error("commit failed: {0}")]
    Commit(String),
}

impl StoreError {
    /// Create not-found error
    #[inline]
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create already-exists error
    #[inline]
    pub fn already_exists(entity: Entity, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create IO error for path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error is a missing record
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if error is rejected input
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::not_found(Entity::Season, "2025Q3");
        assert_eq!(err.to_string(), "season not found: 2025Q3");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn already_exists_display() {
        let err = StoreError::already_exists(Entity::Project, "alpha");
        assert_eq!(err.to_string(), "project already exists: alpha");
    }

    #[test]
    fn parse_error_conversion() {
        let err: StoreError = ParseError::syntax("bad").into();
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
