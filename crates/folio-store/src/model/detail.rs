//! Project detail document: tasks, links and focus outcomes

use folio_codec::{Mapping, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys owned by [`ProjectDetail`]; everything else is carried in `extra`
const KNOWN_FIELDS: &[&str] = &["tasks", "links", "focus"];

/// Progress of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Not started
    #[default]
    Todo,
    /// In progress
    Doing,
    /// Waiting on something
    Blocked,
    /// Finished
    Done,
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "doing" => Ok(Self::Doing),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown task state: {other}")),
        }
    }
}

/// One unit of work inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the project
    pub id: String,
    /// Non-empty description
    pub title: String,
    /// Progress
    #[serde(default)]
    pub state: TaskState,
    /// Optional size estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    /// Display / execution position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl Task {
    /// New `todo` task
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            state: TaskState::Todo,
            estimate: None,
            order: None,
        }
    }

    /// With position
    #[must_use]
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// With estimate
    #[must_use]
    pub fn with_estimate(mut self, estimate: Option<u32>) -> Self {
        self.estimate = estimate;
        self
    }
}

/// Relationship from one project to another
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// Blocked by the target
    #[default]
    DependsOn,
    /// Loosely related
    RelatesTo,
    /// Target is a sub-project
    PartOf,
}

impl std::str::FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depends_on" => Ok(Self::DependsOn),
            "relates_to" => Ok(Self::RelatesTo),
            "part_of" => Ok(Self::PartOf),
            other => Err(format!("unknown link type: {other}")),
        }
    }
}

/// Directed link, unique per `(to_id, link_type)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Target project id
    pub to_id: String,
    /// Relationship
    #[serde(rename = "type", default)]
    pub link_type: LinkType,
}

impl Link {
    /// New link
    #[must_use]
    pub fn new(to_id: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            to_id: to_id.into(),
            link_type,
        }
    }

    fn key(&self) -> (&str, LinkType) {
        (&self.to_id, self.link_type)
    }
}

/// Fallback outcomes shown when no season outcomes exist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    /// Outcome statements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<Vec<String>>,
}

/// Parsed `project.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectDetail {
    /// Ordered tasks
    pub tasks: Vec<Task>,
    /// Links to other projects
    pub links: Vec<Link>,
    /// Focus outcomes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Focus>,
    /// Other top-level fields, preserved
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ProjectDetail {
    /// Parse a document, defaulting missing lists
    ///
    /// # Errors
    /// Returns a description of the first field that does not fit the schema.
    pub fn from_mapping(map: &Mapping) -> Result<Self, String> {
        let tasks: Vec<Task> = list_field(map, "tasks")?;
        let links: Vec<Link> = list_field(map, "links")?;
        let focus = match map.get("focus") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                folio_codec::from_value::<Focus>(raw.clone())
                    .map_err(|e| format!("invalid focus: {e}"))?,
            ),
        };
        let extra = map
            .iter()
            .filter(|(key, _)| !key.as_str().is_some_and(|k| KNOWN_FIELDS.contains(&k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let detail = Self {
            tasks,
            links,
            focus,
            extra,
        };
        detail.validate()?;
        Ok(detail)
    }

    /// Check invariants that serde cannot express
    ///
    /// # Errors
    /// Returns a description of the first offending task: an empty title or
    /// an id used twice.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if task.title.is_empty() {
                return Err(format!("task {} has an empty title", task.id));
            }
            if !seen.insert(task.id.as_str()) {
                return Err(format!("task id {} is used more than once", task.id));
            }
        }
        Ok(())
    }

    /// Document written to disk: extra fields, then focus, tasks and links
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        let mut map = self.extra.clone();
        for key in KNOWN_FIELDS {
            map.shift_remove(*key);
        }
        if let Some(focus) = &self.focus {
            let mut node = Mapping::new();
            if let Some(outcomes) = &focus.outcomes {
                node.insert("outcomes".into(), string_list(outcomes));
            }
            map.insert("focus".into(), Value::Mapping(node));
        }
        map.insert(
            "tasks".into(),
            Value::Sequence(self.tasks.iter().map(task_value).collect()),
        );
        map.insert(
            "links".into(),
            Value::Sequence(self.links.iter().map(link_value).collect()),
        );
        map
    }

    /// Task by id
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Apply a partial update with upsert semantics
    ///
    /// Tasks upsert by id, links by `(to_id, type)`, focus merges shallowly and
    /// the remaining fields overwrite.
    ///
    /// # Errors
    /// Returns a message when a new task arrives without a title.
    pub fn apply(&mut self, update: DetailUpdate) -> Result<(), String> {
        if let Some(patches) = update.tasks {
            for patch in patches {
                match self.tasks.iter_mut().find(|t| t.id == patch.id) {
                    Some(task) => patch.apply_to(task),
                    None => {
                        let task = patch.into_task()?;
                        self.tasks.push(task);
                    }
                }
            }
        }

        if let Some(links) = update.links {
            for link in links {
                match self.links.iter_mut().find(|l| l.key() == link.key()) {
                    Some(existing) => *existing = link,
                    None => self.links.push(link),
                }
            }
        }

        if let Some(focus) = update.focus {
            let current = self.focus.get_or_insert_with(Focus::default);
            if focus.outcomes.is_some() {
                current.outcomes = focus.outcomes;
            }
        }

        for (key, value) in update.fields {
            if key.as_str().is_some_and(|k| KNOWN_FIELDS.contains(&k)) {
                continue;
            }
            self.extra.insert(key, value);
        }

        self.validate()
    }
}

/// Partial update accepted by [`ProjectDetail::apply`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailUpdate {
    /// Tasks to upsert
    pub tasks: Option<Vec<TaskPatch>>,
    /// Links to upsert
    pub links: Option<Vec<Link>>,
    /// Focus fields to merge
    pub focus: Option<Focus>,
    /// Other top-level fields to overwrite
    pub fields: Mapping,
}

impl DetailUpdate {
    /// Update touching only tasks
    #[must_use]
    pub fn tasks(tasks: Vec<TaskPatch>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Self::default()
        }
    }

    /// Update touching only links
    #[must_use]
    pub fn links(links: Vec<Link>) -> Self {
        Self {
            links: Some(links),
            ..Self::default()
        }
    }

    /// Update setting focus outcomes
    #[must_use]
    pub fn focus_outcomes(outcomes: Vec<String>) -> Self {
        Self {
            focus: Some(Focus {
                outcomes: Some(outcomes),
            }),
            ..Self::default()
        }
    }
}

/// Fields to change on one task; `None` leaves a field untouched
///
/// `estimate: Some(None)` clears the estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Task to change or create
    pub id: String,
    /// New title
    pub title: Option<String>,
    /// New state
    pub state: Option<TaskState>,
    /// New or cleared estimate
    pub estimate: Option<Option<u32>>,
    /// New position
    pub order: Option<u32>,
}

impl TaskPatch {
    /// Empty patch for a task id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Patch that recreates `task` wholesale
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: Some(task.title.clone()),
            state: Some(task.state),
            estimate: Some(task.estimate),
            order: task.order,
        }
    }

    fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(state) = self.state {
            task.state = state;
        }
        if let Some(estimate) = self.estimate {
            task.estimate = estimate;
        }
        if let Some(order) = self.order {
            task.order = Some(order);
        }
    }

    fn into_task(self) -> Result<Task, String> {
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .ok_or_else(|| format!("new task {} needs a title", self.id))?;
        Ok(Task {
            id: self.id,
            title,
            state: self.state.unwrap_or_default(),
            estimate: self.estimate.flatten(),
            order: self.order,
        })
    }
}

fn list_field<T: serde::de::DeserializeOwned>(map: &Mapping, key: &str) -> Result<Vec<T>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(raw) => {
            folio_codec::from_value(raw.clone()).map_err(|e| format!("invalid {key}: {e}"))
        }
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().cloned().map(Value::from).collect())
}

fn task_value(task: &Task) -> Value {
    let mut map = Mapping::new();
    map.insert("id".into(), task.id.clone().into());
    map.insert("title".into(), task.title.clone().into());
    map.insert("state".into(), task_state_name(task.state).into());
    if let Some(estimate) = task.estimate {
        map.insert("estimate".into(), u64::from(estimate).into());
    }
    if let Some(order) = task.order {
        map.insert("order".into(), u64::from(order).into());
    }
    Value::Mapping(map)
}

fn link_value(link: &Link) -> Value {
    let mut map = Mapping::new();
    map.insert("to_id".into(), link.to_id.clone().into());
    map.insert("type".into(), link_type_name(link.link_type).into());
    Value::Mapping(map)
}

/// Wire name of a task state
#[must_use]
pub fn task_state_name(state: TaskState) -> &'static str {
    match state {
        TaskState::Todo => "todo",
        TaskState::Doing => "doing",
        TaskState::Blocked => "blocked",
        TaskState::Done => "done",
    }
}

/// Wire name of a link type
#[must_use]
pub fn link_type_name(link_type: LinkType) -> &'static str {
    match link_type {
        LinkType::DependsOn => "depends_on",
        LinkType::RelatesTo => "relates_to",
        LinkType::PartOf => "part_of",
    }
}
