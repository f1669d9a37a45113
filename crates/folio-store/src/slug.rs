//! Id generation from titles and checks on ids used as file names

use crate::error::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("valid slug regex"));

/// Lower-case, whitespace runs to `-`, everything outside `[a-z0-9-]` dropped
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let dashed = WHITESPACE_RE.replace_all(&lower, "-");
    DISALLOWED_RE.replace_all(&dashed, "").into_owned()
}

/// `base`, or `base-2`, `base-3`, ... whichever is first not taken
#[must_use]
pub fn unique_id(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Reject ids that cannot be used as a single path component
///
/// Project ids, season ids and status keys all name a file or folder under
/// the data root, so empty values, `.`, `..` and anything holding a path
/// separator or NUL are refused.
///
/// # Errors
/// `Validation` naming `what` and the offending value.
pub fn validate_id(value: &str, what: &str) -> StoreResult<()> {
    let bad = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::validation(format!("invalid {what} {value:?}")));
    }
    Ok(())
}
