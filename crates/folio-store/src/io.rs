//! Whole-file read and write helpers shared by the stores

use crate::error::{StoreError, StoreResult};
use folio_codec::{Mapping, Value};
use std::io::ErrorKind;
use std::path::Path;

/// Read a text file, `None` when it does not exist
pub(crate) async fn read_text(path: &Path) -> StoreResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "read file");
            Ok(Some(text))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Read a YAML file whose top level is a mapping, `None` when missing
pub(crate) async fn read_mapping(path: &Path) -> StoreResult<Option<Mapping>> {
    let Some(text) = read_text(path).await? else {
        return Ok(None);
    };
    let map = folio_codec::parse_mapping(&text).map_err(|e| e.with_path(path))?;
    Ok(Some(map))
}

/// Replace a file with a serialized document, creating parent directories
pub(crate) async fn write_document(path: &Path, document: &Value) -> StoreResult<()> {
    let text = folio_codec::serialize(document)?;
    write_text(path, &text).await
}

/// Replace a file with text, creating parent directories
pub(crate) async fn write_text(path: &Path, text: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote file");
    Ok(())
}

/// `mkdir -p`
pub(crate) async fn ensure_dir(path: &Path) -> StoreResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Whether a path exists
pub(crate) async fn exists(path: &Path) -> StoreResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Remove a directory tree if present, reporting whether it existed
pub(crate) async fn remove_dir_if_exists(path: &Path) -> StoreResult<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Names of entries in a directory matching `keep`, sorted; empty when missing
pub(crate) async fn list_dir(
    path: &Path,
    keep: impl Fn(&std::fs::FileType, &str) -> bool,
) -> StoreResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(path, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StoreError::io(entry.path(), e))?;
        if let Some(name) = entry.file_name().to_str() {
            if keep(&file_type, name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Sequence stored under `key`, empty when absent or not a sequence
pub(crate) fn sequence(map: &Mapping, key: &str) -> Vec<Value> {
    map.get(key)
        .and_then(Value::as_sequence)
        .cloned()
        .unwrap_or_default()
}

/// String field of a mapping node
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
