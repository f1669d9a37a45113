//! Base project records and status metadata

use crate::io::str_field;
use folio_codec::{Mapping, Value};
use serde::{Deserialize, Serialize};

/// Category assigned when a record has none
pub const DEFAULT_CATEGORY: &str = "exploration";

/// Status assigned to new projects without one
pub const DEFAULT_STATUS: &str = "incubate";

/// Keys owned by [`Project`]; everything else is carried in `extra`
const KNOWN_FIELDS: &[&str] = &["id", "title", "category", "status", "jevm", "pivot_cost"];

/// Joy / energy / value / market scores, each 0..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jevm {
    /// How much fun the work is
    pub joy: u8,
    /// How energising it is
    pub energy: u8,
    /// Value produced
    pub value: u8,
    /// Market pull
    pub market: u8,
}

impl Jevm {
    /// Upper bound of every score
    pub const MAX: u8 = 4;

    /// Create scores, rejecting anything above [`Jevm::MAX`]
    ///
    /// # Errors
    /// Returns a message naming the first out-of-range score.
    pub fn new(joy: u8, energy: u8, value: u8, market: u8) -> Result<Self, String> {
        let jevm = Self {
            joy,
            energy,
            value,
            market,
        };
        jevm.validate()?;
        Ok(jevm)
    }

    /// Check every score is within range
    ///
    /// # Errors
    /// Returns a message naming the first out-of-range score.
    pub fn validate(&self) -> Result<(), String> {
        for (name, score) in [
            ("joy", self.joy),
            ("energy", self.energy),
            ("value", self.value),
            ("market", self.market),
        ] {
            if score > Self::MAX {
                return Err(format!("jevm.{name} must be 0..={}, got {score}", Self::MAX));
            }
        }
        Ok(())
    }

    /// Sum of all four scores
    #[must_use]
    pub fn sum(&self) -> u32 {
        u32::from(self.joy) + u32::from(self.energy) + u32::from(self.value) + u32::from(self.market)
    }

    /// Mean score rounded to one decimal
    #[must_use]
    pub fn average(&self) -> f64 {
        (f64::from(self.sum()) / 4.0 * 10.0).round() / 10.0
    }
}

/// Cost of changing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotCost {
    /// Cheap to pivot
    Low,
    /// Moderate
    Medium,
    /// Expensive
    High,
}

/// A tracked project
///
/// `jevm: None` and `pivot_cost: None` mean the field is absent from the
/// record; `pivot_cost: Some(None)` is an explicit `null`. Fields the schema
/// does not know are kept in `extra` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// Unique slug
    pub id: String,
    /// Display name
    pub title: String,
    /// Free-form label
    pub category: String,
    /// Status key, i.e. the partition holding the record
    pub status: String,
    /// Optional scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jevm: Option<Jevm>,
    /// Optional pivot cost, possibly explicit null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_cost: Option<Option<PivotCost>>,
    /// Unknown fields, preserved
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Project {
    /// New project with default category and no optional fields
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: DEFAULT_CATEGORY.to_string(),
            status: status.into(),
            jevm: None,
            pivot_cost: None,
            extra: Mapping::new(),
        }
    }

    /// With category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// With scores
    #[must_use]
    pub fn with_jevm(mut self, jevm: Jevm) -> Self {
        self.jevm = Some(jevm);
        self
    }

    /// With pivot cost (`None` writes an explicit null)
    #[must_use]
    pub fn with_pivot_cost(mut self, pivot_cost: Option<PivotCost>) -> Self {
        self.pivot_cost = Some(pivot_cost);
        self
    }

    /// Parse a partition entry permissively
    ///
    /// Title falls back to the id, category to [`DEFAULT_CATEGORY`], status to
    /// the partition key. A missing id or malformed `jevm` / `pivot_cost`
    /// rejects the entry.
    ///
    /// # Errors
    /// Returns a description of why the entry is unusable.
    pub fn from_entry(entry: &Value, partition: &str) -> Result<Self, String> {
        let map = entry
            .as_mapping()
            .ok_or_else(|| format!("entry is a {}, not a mapping", folio_codec::kind(entry)))?;
        let id = non_empty(str_field(entry, "id")).ok_or("entry has no id")?;
        let title = match entry.get("title") {
            None => id.to_string(),
            Some(Value::String(title)) => title.clone(),
            Some(other) => return Err(format!("title is a {}", folio_codec::kind(other))),
        };
        let status = non_empty(str_field(entry, "status")).unwrap_or(partition);

        Ok(Self {
            id: id.to_string(),
            title,
            category: category_of(entry),
            status: status.to_string(),
            jevm: jevm_of(entry)?,
            pivot_cost: pivot_cost_of(entry)?,
            extra: extra_fields(map),
        })
    }

    /// Parse a legacy single-file entry, which must carry id and title
    ///
    /// # Errors
    /// Returns a description of why the entry is unusable.
    pub fn from_legacy(entry: &Value) -> Result<Self, String> {
        let map = entry
            .as_mapping()
            .ok_or_else(|| format!("entry is a {}, not a mapping", folio_codec::kind(entry)))?;
        let id = str_field(entry, "id").ok_or("entry has no id")?;
        let title = str_field(entry, "title").ok_or("entry has no title")?;
        let status = non_empty(str_field(entry, "status")).unwrap_or(DEFAULT_STATUS);

        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            category: category_of(entry),
            status: status.to_string(),
            jevm: jevm_of(entry)?,
            pivot_cost: pivot_cost_of(entry)?,
            extra: extra_fields(map),
        })
    }

    /// Partition entry for this project
    ///
    /// `status` is omitted because the file implies it; absent optional fields
    /// are omitted, explicit nulls kept.
    #[must_use]
    pub fn to_entry(&self) -> Mapping {
        let mut entry = Mapping::new();
        entry.insert("id".into(), self.id.clone().into());
        entry.insert("title".into(), self.title.clone().into());
        entry.insert("category".into(), self.category.clone().into());
        if let Some(jevm) = &self.jevm {
            entry.insert("jevm".into(), jevm_value(jevm));
        }
        if let Some(pivot_cost) = self.pivot_cost {
            entry.insert("pivot_cost".into(), pivot_cost_value(pivot_cost));
        }
        for (key, value) in &self.extra {
            entry.insert(key.clone(), value.clone());
        }
        entry
    }
}

/// YAML node for scores
#[must_use]
pub fn jevm_value(jevm: &Jevm) -> Value {
    let mut map = Mapping::new();
    map.insert("joy".into(), u64::from(jevm.joy).into());
    map.insert("energy".into(), u64::from(jevm.energy).into());
    map.insert("value".into(), u64::from(jevm.value).into());
    map.insert("market".into(), u64::from(jevm.market).into());
    Value::Mapping(map)
}

/// YAML node for a pivot cost, `null` for `None`
#[must_use]
pub fn pivot_cost_value(pivot_cost: Option<PivotCost>) -> Value {
    match pivot_cost {
        None => Value::Null,
        Some(PivotCost::Low) => "low".into(),
        Some(PivotCost::Medium) => "medium".into(),
        Some(PivotCost::High) => "high".into(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn category_of(entry: &Value) -> String {
    non_empty(str_field(entry, "category"))
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

fn jevm_of(entry: &Value) -> Result<Option<Jevm>, String> {
    let Some(raw) = entry.get("jevm") else {
        return Ok(None);
    };
    let jevm: Jevm =
        folio_codec::from_value(raw.clone()).map_err(|e| format!("invalid jevm: {e}"))?;
    jevm.validate()?;
    Ok(Some(jevm))
}

fn pivot_cost_of(entry: &Value) -> Result<Option<Option<PivotCost>>, String> {
    match entry.get("pivot_cost") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(raw) => folio_codec::from_value(raw.clone())
            .map(|cost| Some(Some(cost)))
            .map_err(|e| format!("invalid pivot_cost: {e}")),
    }
}

fn extra_fields(map: &Mapping) -> Mapping {
    map.iter()
        .filter(|(key, _)| !key.as_str().is_some_and(|k| KNOWN_FIELDS.contains(&k)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Display color of a status column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// Green
    Green,
    /// Yellow
    Yellow,
    /// Blue
    Blue,
    /// Red
    Red,
    /// Neutral, used for unknown values
    #[default]
    Slate,
}

impl StatusColor {
    /// Color by name, `None` outside the palette
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "blue" => Some(Self::Blue),
            "red" => Some(Self::Red),
            "slate" => Some(Self::Slate),
            _ => None,
        }
    }
}

/// Sort key for status keys without an explicit `meta.order`
pub const UNKNOWN_STATUS_ORDER: i64 = 999;

/// Built-in ordering of well-known status keys
#[must_use]
pub fn default_status_order(key: &str) -> i64 {
    match key {
        "active" => 0,
        "incubate" => 1,
        "archive" => 2,
        "graveyard" => 3,
        "hypo" => 4,
        "done" => 5,
        _ => UNKNOWN_STATUS_ORDER,
    }
}

/// Display metadata of one status partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMeta {
    /// Status key (file stem)
    pub key: String,
    /// Column label
    pub label: String,
    /// Column color
    pub color: StatusColor,
    /// Sort key, ascending
    pub order: i64,
}

impl StatusMeta {
    /// Build from a partition's `meta` node, filling defaults
    #[must_use]
    pub fn from_meta(key: &str, meta: Option<&Value>) -> Self {
        let field = |name: &str| meta.and_then(|m| m.get(name));
        let label = field("label")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(key);
        let color = field("color")
            .and_then(Value::as_str)
            .and_then(StatusColor::from_name)
            .unwrap_or_default();
        let order = field("order")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| default_status_order(key));

        Self {
            key: key.to_string(),
            label: label.to_string(),
            color,
            order,
        }
    }
}
