//! Folio YAML codec
//!
//! Reads and writes the YAML documents that hold all folio data.
//!
//! # Core Operations
//!
//! - **Parse**: YAML text → [`serde_yaml::Value`] ([`parse`], [`parse_mapping`])
//! - **Serialize**: value → YAML text with a fixed, diff-friendly layout ([`serialize`])
//! - **Front matter**: split `---` headers off markdown notes
//!
//! # Example
//!
//! ```rust
//! use folio_codec::{parse, serialize};
//!
//! let doc = parse("projects: [{id: a}, {id: b}]").unwrap();
//! assert_eq!(
//!     serialize(&doc).unwrap(),
//!     "projects:\n  - id: a\n\n  - id: b\n"
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod front_matter;
pub mod yaml;

pub use error::{ParseError, SerializeError};
pub use front_matter::{split_front_matter, strip_front_matter};
pub use yaml::{from_value, kind, parse, parse_mapping, serialize, to_string, to_value};

/// Re-exported so callers share one YAML node type
pub use serde_yaml::{Mapping, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
