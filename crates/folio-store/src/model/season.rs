//! Seasons: quarterly themes, initiatives and weekly picks

use chrono::NaiveDate;
use folio_codec::{Mapping, Value};
use serde::{Deserialize, Serialize};

/// Outcomes allowed per initiative
pub const MAX_OUTCOMES: usize = 3;

/// Picks allowed per week
pub const MAX_PICKS: usize = 6;

/// Part a project plays in a season
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Main focus; listed first
    Lead,
    /// Secondary
    #[default]
    Supporting,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(Self::Lead),
            "supporting" => Ok(Self::Supporting),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A project's participation in a season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    /// Project id, unique within the season
    pub project_id: String,
    /// Lead or supporting
    #[serde(default)]
    pub role: Role,
    /// At most [`MAX_OUTCOMES`] statements
    #[serde(default)]
    pub outcomes: Vec<String>,
}

impl Initiative {
    /// Initiative without outcomes
    #[must_use]
    pub fn new(project_id: impl Into<String>, role: Role) -> Self {
        Self {
            project_id: project_id.into(),
            role,
            outcomes: Vec::new(),
        }
    }

    /// With outcomes
    #[must_use]
    pub fn with_outcomes(mut self, outcomes: Vec<String>) -> Self {
        self.outcomes = outcomes;
        self
    }
}

/// Picks for one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyLog {
    /// ISO date, conventionally a Monday
    pub week_start: String,
    /// At most [`MAX_PICKS`] entries
    #[serde(default)]
    pub picks: Vec<String>,
}

/// A season document plus its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// Directory name, conventionally `YYYYQn`
    pub id: String,
    /// Free-text label
    #[serde(default)]
    pub theme: String,
    /// ISO start date
    pub start: String,
    /// ISO end date
    pub end: String,
    /// Initiatives, leads first
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    /// Weekly picks sorted by `week_start`
    #[serde(default)]
    pub weekly: Vec<WeeklyLog>,
}

impl Season {
    /// Empty season
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        theme: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            theme: theme.into(),
            start: start.into(),
            end: end.into(),
            initiatives: Vec::new(),
            weekly: Vec::new(),
        }
    }

    /// Parse a season document; the id comes from its directory
    ///
    /// # Errors
    /// Returns a description of the first field that does not fit the schema.
    pub fn from_mapping(id: &str, map: &Mapping) -> Result<Self, String> {
        let mut map = map.clone();
        map.insert("id".into(), id.into());
        let season: Self = folio_codec::from_value(Value::Mapping(map))
            .map_err(|e| format!("invalid season {id}: {e}"))?;
        season.validate()?;
        Ok(season)
    }

    /// Check list limits
    ///
    /// # Errors
    /// Returns a message naming the offending initiative or week.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(i) = self
            .initiatives
            .iter()
            .find(|i| i.outcomes.len() > MAX_OUTCOMES)
        {
            return Err(format!(
                "initiative {} has more than {MAX_OUTCOMES} outcomes",
                i.project_id
            ));
        }
        if let Some(w) = self.weekly.iter().find(|w| w.picks.len() > MAX_PICKS) {
            return Err(format!(
                "week {} has more than {MAX_PICKS} picks",
                w.week_start
            ));
        }
        Ok(())
    }

    /// Document written to `season.yaml` (the id is implied by the folder)
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert("theme".into(), self.theme.clone().into());
        map.insert("start".into(), self.start.clone().into());
        map.insert("end".into(), self.end.clone().into());
        map.insert(
            "initiatives".into(),
            Value::Sequence(self.initiatives.iter().map(initiative_value).collect()),
        );
        map.insert(
            "weekly".into(),
            Value::Sequence(self.weekly.iter().map(weekly_value).collect()),
        );
        map
    }

    /// Initiative of a project
    #[must_use]
    pub fn initiative(&self, project_id: &str) -> Option<&Initiative> {
        self.initiatives.iter().find(|i| i.project_id == project_id)
    }

    /// Whether `day` falls inside `[start, end]`
    ///
    /// Compares ISO strings, which order correctly when zero-padded.
    #[must_use]
    pub fn contains(&self, day: &str) -> bool {
        self.start.as_str() <= day && day <= self.end.as_str()
    }
}

/// YAML node for an initiative
#[must_use]
pub fn initiative_value(initiative: &Initiative) -> Value {
    let mut map = Mapping::new();
    map.insert("project_id".into(), initiative.project_id.clone().into());
    map.insert(
        "role".into(),
        match initiative.role {
            Role::Lead => "lead",
            Role::Supporting => "supporting",
        }
        .into(),
    );
    map.insert("outcomes".into(), string_list(&initiative.outcomes));
    Value::Mapping(map)
}

/// YAML node for a week of picks
#[must_use]
pub fn weekly_value(week: &WeeklyLog) -> Value {
    let mut map = Mapping::new();
    map.insert("week_start".into(), week.week_start.clone().into());
    map.insert("picks".into(), string_list(&week.picks));
    Value::Mapping(map)
}

fn string_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().cloned().map(Value::from).collect())
}

/// Pick the current season when no pointer is set
///
/// Readable seasons are scanned in id order and the first whose range
/// contains `today` wins. Otherwise the last of `ids` wins, which lists every
/// season folder whether or not its document could be read. `None` only when
/// there are no seasons at all.
#[must_use]
pub fn resolve_current_season<'a>(
    ids: &'a [String],
    seasons: &'a [Season],
    today: NaiveDate,
) -> Option<&'a str> {
    let today = today.format("%Y-%m-%d").to_string();
    let mut sorted: Vec<&Season> = seasons.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(season) = sorted.iter().find(|s| s.contains(&today)) {
        return Some(season.id.as_str());
    }
    ids.iter()
        .max()
        .map(String::as_str)
        .or_else(|| sorted.last().map(|s| s.id.as_str()))
}
