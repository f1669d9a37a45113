//! YAML document codec
//!
//! Parsing goes through `serde_yaml`. Emission is done here so the layout is
//! stable across writes:
//! - 2-space indentation, sequences indented under their key
//! - no line wrapping
//! - one blank line before every sequence item after the first, at every depth
//!
//! Strings are written plain whenever reading them back plain yields the same
//! string, otherwise double-quoted with escapes.

use crate::error::{ParseError, SerializeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Parse YAML text into a value
///
/// Empty or whitespace-only text is an empty document (`Value::Null`).
///
/// # Errors
/// Returns `ParseError::Syntax` for malformed YAML.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|e| ParseError::syntax(e.to_string()))
}

/// Parse YAML text whose top level must be a mapping
///
/// An empty document yields an empty mapping.
///
/// # Errors
/// Returns `ParseError::NotAMapping` when the top level is a scalar or sequence.
pub fn parse_mapping(text: &str) -> Result<Mapping, ParseError> {
    match parse(text)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => Err(ParseError::NotAMapping {
            path: None,
            found: kind(&other),
        }),
    }
}

/// Convert a YAML node into a typed value
///
/// # Errors
/// Returns the `serde_yaml` error when the node does not match `T`.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_value(value)
}

/// Convert a typed value into a YAML node
///
/// # Errors
/// Returns `SerializeError::Convert` if `T`'s `Serialize` impl fails.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, SerializeError> {
    Ok(serde_yaml::to_value(value)?)
}

/// Serialize a value into YAML text
///
/// `parse(&serialize(v)?)` is structurally equal to `v` for any tree of
/// mappings, sequences, strings, numbers, booleans and null.
///
/// # Errors
/// Returns `SerializeError::ComplexKey` for mappings keyed by collections.
pub fn serialize(value: &Value) -> Result<String, SerializeError> {
    let mut lines = Vec::new();
    match render(value)? {
        Node::Inline(text) => lines.push(text),
        Node::Block { tag, body } => {
            lines.extend(tag);
            lines.extend(body);
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Serialize any `Serialize` value with the document layout
///
/// # Errors
/// See [`to_value`] and [`serialize`].
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, SerializeError> {
    serialize(&to_value(value)?)
}

/// Short name of a node's kind, for diagnostics
#[must_use]
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// A rendered node: either fits after `key: ` / `- `, or needs its own lines
enum Node {
    Inline(String),
    Block {
        tag: Option<String>,
        body: Vec<String>,
    },
}

fn render(value: &Value) -> Result<Node, SerializeError> {
    match value {
        Value::Mapping(map) if !map.is_empty() => Ok(Node::Block {
            tag: None,
            body: mapping_lines(map)?,
        }),
        Value::Sequence(seq) if !seq.is_empty() => Ok(Node::Block {
            tag: None,
            body: sequence_lines(seq)?,
        }),
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            Ok(match render(&tagged.value)? {
                Node::Inline(text) => Node::Inline(format!("{tag} {text}")),
                Node::Block { body, .. } => Node::Block {
                    tag: Some(tag),
                    body,
                },
            })
        }
        other => Ok(Node::Inline(scalar(other))),
    }
}

fn mapping_lines(map: &Mapping) -> Result<Vec<String>, SerializeError> {
    let mut lines = Vec::new();
    for (key, value) in map {
        let key = key_text(key)?;
        match render(value)? {
            Node::Inline(text) => lines.push(format!("{key}: {text}")),
            Node::Block { tag, body } => {
                lines.push(match tag {
                    Some(tag) => format!("{key}: {tag}"),
                    None => format!("{key}:"),
                });
                lines.extend(indented(body));
            }
        }
    }
    Ok(lines)
}

fn sequence_lines(seq: &[Value]) -> Result<Vec<String>, SerializeError> {
    let mut lines = Vec::new();
    for (i, item) in seq.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        match render(item)? {
            Node::Inline(text) => lines.push(format!("- {text}")),
            Node::Block { tag: Some(tag), body } => {
                lines.push(format!("- {tag}"));
                lines.extend(indented(body));
            }
            Node::Block { tag: None, body } => {
                let mut body = body.into_iter();
                if let Some(first) = body.next() {
                    lines.push(format!("- {first}"));
                }
                lines.extend(indented(body));
            }
        }
    }
    Ok(lines)
}

fn indented(lines: impl IntoIterator<Item = String>) -> impl Iterator<Item = String> {
    lines.into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!("  {line}")
        }
    })
}

fn key_text(key: &Value) -> Result<String, SerializeError> {
    match key {
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            Err(SerializeError::ComplexKey(kind(key)))
        }
        other => Ok(scalar(other)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_scalar(s),
        Value::Sequence(_) => "[]".to_string(),
        Value::Mapping(_) => "{}".to_string(),
        // render() unwraps tags before reaching scalars
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, scalar(&tagged.value)),
    }
}

fn string_scalar(s: &str) -> String {
    if is_plain_safe(s) {
        s.to_string()
    } else {
        double_quoted(s)
    }
}

const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

fn is_plain_safe(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if INDICATORS.contains(&first) || s.trim() != s {
        return false;
    }
    if s.chars().any(|c| c.is_control() || !is_printable(c) || is_break(c)) {
        return false;
    }
    // Anything that reads back as a number, bool, null, collection or a
    // different string must be quoted.
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref read)) if read == s)
}

fn is_printable(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{7E}'
            | '\u{85}'
            | '\u{A0}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Characters YAML 1.1 readers treat as line breaks
fn is_break(c: char) -> bool {
    matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if is_printable(c) && !is_break(c) && c != '\u{FEFF}' => out.push(c),
            c if u32::from(c) <= 0xFFFF => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push_str(&format!("\\U{:08X}", u32::from(c))),
        }
    }
    out.push('"');
    out
}
