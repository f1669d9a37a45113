//! High-level actions over the three stores
//!
//! [`Portfolio`] is what a front end calls: it validates input, derives ids,
//! and composes store primitives for flows such as promoting a task to a
//! project. It holds no state beyond the store handles.

use crate::commit::CommitHook;
use crate::config::StoreConfig;
use crate::details::{DetailRecord, DetailStore};
use crate::error::{Entity, StoreError, StoreResult};
use crate::model::{
    DetailUpdate, Initiative, Jevm, Link, LinkType, PivotCost, Project, Role, Season, StatusMeta,
    Task, TaskPatch, DEFAULT_CATEGORY, DEFAULT_STATUS,
};
use crate::paths::PathResolver;
use crate::projects::{ProjectPatch, ProjectStore};
use crate::seasons::SeasonStore;
use crate::slug::{slugify, unique_id, validate_id};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Fallback id when a title has no slug characters
const FALLBACK_PROJECT_ID: &str = "project";

/// Fallback id when a task title has no slug characters
const FALLBACK_TASK_ID: &str = "task";

/// Input of [`Portfolio::create_project`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    /// Required display name
    pub title: String,
    /// Explicit id; derived from the title when `None`
    pub id: Option<String>,
    /// Defaults to `exploration`
    pub category: Option<String>,
    /// Defaults to `incubate`
    pub status: Option<String>,
    /// Written as null when `None`
    pub pivot_cost: Option<PivotCost>,
    /// Optional scores
    pub jevm: Option<Jevm>,
}

impl NewProject {
    /// Project with only a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Options of [`Portfolio::promote_task_to_project`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Promotion {
    /// Title of the new project; the task title when `None`
    pub title: Option<String>,
    /// Status of the new project
    pub status: Option<String>,
    /// Category of the new project
    pub category: Option<String>,
}

/// Input of [`Portfolio::create_season`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSeason {
    /// Folder name, conventionally `YYYYQn`
    pub id: String,
    /// Free-text label
    pub theme: String,
    /// ISO start date
    pub start: String,
    /// ISO end date
    pub end: String,
}

/// One status column with its projects in file order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusColumn {
    /// Column metadata
    pub meta: StatusMeta,
    /// Projects in this status
    pub projects: Vec<Project>,
}

/// Facade over the project, detail and season stores
#[derive(Debug, Clone)]
pub struct Portfolio {
    projects: ProjectStore,
    details: DetailStore,
    seasons: SeasonStore,
}

impl Portfolio {
    /// Open a portfolio with the commit hook the configuration selects
    #[must_use]
    pub fn open(config: &StoreConfig) -> Self {
        Self::with_hook(config, config.commit_hook())
    }

    /// Open a portfolio with an explicit commit hook
    #[must_use]
    pub fn with_hook(config: &StoreConfig, hook: Arc<dyn CommitHook>) -> Self {
        let paths = Arc::new(PathResolver::from_config(config));
        Self {
            projects: ProjectStore::new(paths.clone(), hook.clone()),
            details: DetailStore::new(paths.clone(), hook.clone()),
            seasons: SeasonStore::new(paths, hook),
        }
    }

    /// Project store
    #[must_use]
    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    /// Detail store
    #[must_use]
    pub fn details(&self) -> &DetailStore {
        &self.details
    }

    /// Season store
    #[must_use]
    pub fn seasons(&self) -> &SeasonStore {
        &self.seasons
    }

    // Projects

    /// All projects
    ///
    /// # Errors
    /// Fails when a partition cannot be read.
    pub async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.projects.read_all_projects().await
    }

    /// One project by id
    ///
    /// # Errors
    /// Fails when a partition cannot be read.
    pub async fn project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self
            .list_projects()
            .await?
            .into_iter()
            .find(|p| p.id == id))
    }

    /// Projects grouped into status columns, in column order
    ///
    /// Statuses without a partition file (legacy records) get a column with
    /// default metadata after the known ones.
    ///
    /// # Errors
    /// Fails when a partition cannot be read.
    pub async fn board(&self) -> StoreResult<Vec<StatusColumn>> {
        let mut columns: Vec<StatusColumn> = self
            .projects
            .read_status_meta()
            .await?
            .into_iter()
            .map(|meta| StatusColumn {
                meta,
                projects: Vec::new(),
            })
            .collect();

        for project in self.list_projects().await? {
            let idx = match columns.iter().position(|c| c.meta.key == project.status) {
                Some(idx) => idx,
                None => {
                    columns.push(StatusColumn {
                        meta: StatusMeta::from_meta(&project.status, None),
                        projects: Vec::new(),
                    });
                    columns.len() - 1
                }
            };
            columns[idx].projects.push(project);
        }
        Ok(columns)
    }

    /// Sorted distinct categories
    ///
    /// # Errors
    /// Fails when a partition cannot be read.
    pub async fn categories(&self) -> StoreResult<Vec<String>> {
        self.projects.categories().await
    }

    /// Create a project and return its id
    ///
    /// The id is the slug of the title unless given, suffixed `-2`, `-3`, ...
    /// until unique.
    ///
    /// # Errors
    /// `Validation` for a blank title or out-of-range scores.
    pub async fn create_project(&self, input: NewProject) -> StoreResult<String> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(StoreError::validation("title is required"));
        }
        if let Some(jevm) = &input.jevm {
            jevm.validate().map_err(StoreError::validation)?;
        }

        let desired = match input.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_lowercase(),
            None => slugify(title),
        };
        let desired = if desired.is_empty() {
            FALLBACK_PROJECT_ID.to_string()
        } else {
            desired
        };
        let taken: HashSet<String> = self.list_projects().await?.into_iter().map(|p| p.id).collect();
        let id = unique_id(&desired, |candidate| taken.contains(candidate));

        let status = non_blank(input.status).unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let category = non_blank(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let mut project = Project::new(&id, title, status)
            .with_category(category)
            .with_pivot_cost(input.pivot_cost);
        project.jevm = input.jevm;

        self.projects.upsert(&project).await?;
        tracing::info!(id = %id, status = %project.status, "created project");
        Ok(id)
    }

    /// Move a project to the end of another status
    ///
    /// # Errors
    /// `NotFound` when no partition holds the id.
    pub async fn update_status(&self, id: &str, status: &str) -> StoreResult<()> {
        validate_id(id, "project id")?;
        validate_id(status, "status")?;
        let found = self
            .projects
            .find_raw(id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Project, id))?;
        self.projects.move_status(id, &found.status, status, None).await
    }

    /// Move a project between named statuses, optionally at a position
    ///
    /// # Errors
    /// `NotFound` when `from` does not hold the id.
    pub async fn move_project(
        &self,
        id: &str,
        from: &str,
        to: &str,
        index: Option<usize>,
    ) -> StoreResult<()> {
        validate_id(id, "project id")?;
        validate_id(from, "source status")?;
        validate_id(to, "target status")?;
        self.projects.move_status(id, from, to, index).await
    }

    /// Reorder one status column
    ///
    /// # Errors
    /// `Validation` for a blank status.
    pub async fn reorder_status(&self, status: &str, ordered_ids: &[String]) -> StoreResult<()> {
        validate_id(status, "status")?;
        self.projects.reorder(status, ordered_ids).await
    }

    /// Set scores
    ///
    /// # Errors
    /// `Validation` for out-of-range scores, `NotFound` for unknown ids.
    pub async fn set_jevm(&self, id: &str, jevm: Jevm) -> StoreResult<()> {
        jevm.validate().map_err(StoreError::validation)?;
        self.projects
            .update_fields(id, &ProjectPatch::new().jevm(&jevm))
            .await
    }

    /// Remove scores
    ///
    /// # Errors
    /// `NotFound` for unknown ids.
    pub async fn clear_jevm(&self, id: &str) -> StoreResult<()> {
        self.projects
            .update_fields(id, &ProjectPatch::new().remove("jevm"))
            .await
    }

    /// Patch arbitrary fields of a project
    ///
    /// # Errors
    /// `Validation` for identity fields, `NotFound` for unknown ids.
    pub async fn update_properties(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        validate_id(id, "project id")?;
        self.projects.update_fields(id, patch).await
    }

    /// Give a project a new id and title
    ///
    /// A blank title keeps the current one.
    ///
    /// # Errors
    /// `Validation` for blank or unchanged ids, `NotFound` for an unknown old
    /// id, `AlreadyExists` when the new id is taken.
    pub async fn rename_project(&self, old_id: &str, new_id: &str, new_title: &str) -> StoreResult<()> {
        let (old_id, new_id) = (old_id.trim(), new_id.trim());
        validate_id(old_id, "old id")?;
        validate_id(new_id, "new id")?;
        if old_id == new_id {
            return Err(StoreError::validation("new id must differ from old id"));
        }

        let all = self.list_projects().await?;
        let current = all
            .iter()
            .find(|p| p.id == old_id)
            .ok_or_else(|| StoreError::not_found(Entity::Project, old_id))?;
        if all.iter().any(|p| p.id == new_id) {
            return Err(StoreError::already_exists(Entity::Project, new_id));
        }

        let mut renamed = current.clone();
        renamed.id = new_id.to_string();
        if !new_title.trim().is_empty() {
            renamed.title = new_title.trim().to_string();
        }
        self.projects.rename(old_id, &renamed).await
    }

    /// Delete a project record and its detail directory
    ///
    /// # Errors
    /// `Validation` for a blank id.
    pub async fn delete_project(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "project id")?;
        self.projects.delete(id).await
    }

    // Detail: notes, tasks, links

    /// Detail document and notes
    ///
    /// # Errors
    /// Fails on filesystem errors.
    pub async fn detail(&self, id: &str) -> StoreResult<DetailRecord> {
        self.details.read(id).await
    }

    /// Replace a project's notes
    ///
    /// # Errors
    /// `Validation` for a blank id.
    pub async fn update_notes(&self, id: &str, notes: &str) -> StoreResult<()> {
        validate_id(id, "project id")?;
        self.details.write_notes(id, notes).await
    }

    /// Set fallback focus outcomes
    ///
    /// # Errors
    /// Fails on read or write errors.
    pub async fn set_focus_outcomes(&self, id: &str, outcomes: Vec<String>) -> StoreResult<()> {
        validate_id(id, "project id")?;
        self.details
            .merge_detail(id, DetailUpdate::focus_outcomes(outcomes))
            .await
            .map(drop)
    }

    /// Append a `todo` task and return its id
    ///
    /// # Errors
    /// `Validation` for blank ids or titles.
    pub async fn add_task(
        &self,
        project_id: &str,
        title: &str,
        estimate: Option<u32>,
    ) -> StoreResult<String> {
        validate_id(project_id, "project id")?;
        let title = title.trim();
        require(title, "task title")?;

        let detail = self.details.read(project_id).await?.detail;
        let taken: HashSet<&str> = detail.tasks.iter().map(|t| t.id.as_str()).collect();
        let id = task_id_for(title, |c| taken.contains(c));

        let task = Task::new(&id, title)
            .with_estimate(estimate)
            .with_order(next_order(detail.tasks.len()));
        self.details
            .merge_detail(project_id, DetailUpdate::tasks(vec![TaskPatch::from_task(&task)]))
            .await?;
        Ok(id)
    }

    /// Append one task per non-blank line; returns the new ids
    ///
    /// # Errors
    /// `Validation` for a blank project id.
    pub async fn add_tasks(&self, project_id: &str, titles: &[String]) -> StoreResult<Vec<String>> {
        validate_id(project_id, "project id")?;
        let lines: Vec<&str> = titles.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let detail = self.details.read(project_id).await?.detail;
        let mut taken: HashSet<String> = detail.tasks.iter().map(|t| t.id.clone()).collect();
        let mut patches = Vec::with_capacity(lines.len());
        let mut ids = Vec::with_capacity(lines.len());

        for (offset, title) in lines.into_iter().enumerate() {
            let id = task_id_for(title, |c| taken.contains(c));
            let task = Task::new(&id, title).with_order(next_order(detail.tasks.len() + offset));
            patches.push(TaskPatch::from_task(&task));
            taken.insert(id.clone());
            ids.push(id);
        }

        self.details
            .merge_detail(project_id, DetailUpdate::tasks(patches))
            .await?;
        Ok(ids)
    }

    /// Change title, state or estimate of an existing task
    ///
    /// # Errors
    /// `NotFound` when the task does not exist.
    pub async fn update_task(&self, project_id: &str, patch: TaskPatch) -> StoreResult<()> {
        validate_id(project_id, "project id")?;
        require(&patch.id, "task id")?;
        let detail = self.details.read(project_id).await?.detail;
        if detail.task(&patch.id).is_none() {
            return Err(StoreError::not_found(Entity::Task, &patch.id));
        }
        self.details
            .merge_detail(project_id, DetailUpdate::tasks(vec![patch]))
            .await
            .map(drop)
    }

    /// Drop a task; returns whether it existed
    ///
    /// # Errors
    /// Fails on read or write errors.
    pub async fn remove_task(&self, project_id: &str, task_id: &str) -> StoreResult<bool> {
        validate_id(project_id, "project id")?;
        let mut tasks = self.details.read(project_id).await?.detail.tasks;
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        let removed = tasks.len() != before;
        if removed {
            self.details.replace_tasks(project_id, tasks).await?;
        }
        Ok(removed)
    }

    /// Put tasks in the given order and renumber `order` from 1
    ///
    /// Tasks missing from `ordered_ids` follow in their current order.
    ///
    /// # Errors
    /// Fails on read or write errors.
    pub async fn reorder_tasks(&self, project_id: &str, ordered_ids: &[String]) -> StoreResult<()> {
        validate_id(project_id, "project id")?;
        let current = self.details.read(project_id).await?.detail.tasks;

        let mut next: Vec<Task> = ordered_ids
            .iter()
            .filter_map(|id| current.iter().find(|t| &t.id == id))
            .cloned()
            .collect();
        next.extend(
            current
                .iter()
                .filter(|t| !ordered_ids.contains(&t.id))
                .cloned(),
        );
        for (idx, task) in next.iter_mut().enumerate() {
            task.order = Some(next_order(idx));
        }

        self.details.replace_tasks(project_id, next).await.map(drop)
    }

    /// Link a project to another (default `relates_to`)
    ///
    /// # Errors
    /// `Validation` for blank ids.
    pub async fn add_link(
        &self,
        project_id: &str,
        to_id: &str,
        link_type: Option<LinkType>,
    ) -> StoreResult<()> {
        validate_id(project_id, "project id")?;
        require(to_id, "link target")?;
        let link = Link::new(to_id, link_type.unwrap_or(LinkType::RelatesTo));
        self.details
            .merge_detail(project_id, DetailUpdate::links(vec![link]))
            .await
            .map(drop)
    }

    /// Remove every link to `to_id`, whatever its type
    ///
    /// # Errors
    /// `Validation` for blank ids.
    pub async fn remove_link(&self, project_id: &str, to_id: &str) -> StoreResult<()> {
        validate_id(project_id, "project id")?;
        require(to_id, "link target")?;
        let mut links = self.details.read(project_id).await?.detail.links;
        links.retain(|l| l.to_id != to_id);
        self.details.replace_links(project_id, links).await.map(drop)
    }

    /// Turn a task into its own project, linked from the parent as `part_of`
    ///
    /// # Errors
    /// `NotFound` when the task does not exist.
    pub async fn promote_task_to_project(
        &self,
        parent_id: &str,
        task_id: &str,
        options: Promotion,
    ) -> StoreResult<String> {
        validate_id(parent_id, "parent id")?;
        require(task_id, "task id")?;
        let detail = self.details.read(parent_id).await?.detail;
        let task = detail
            .task(task_id)
            .ok_or_else(|| StoreError::not_found(Entity::Task, task_id))?;

        let title = non_blank(options.title).unwrap_or_else(|| task.title.clone());
        let child_id = self
            .create_project(NewProject {
                title,
                status: options.status,
                category: options.category,
                ..NewProject::default()
            })
            .await?;

        let remaining: Vec<Task> = detail
            .tasks
            .iter()
            .filter(|t| t.id != task_id)
            .cloned()
            .collect();
        self.details.replace_tasks(parent_id, remaining).await?;
        self.details
            .merge_detail(
                parent_id,
                DetailUpdate::links(vec![Link::new(&child_id, LinkType::PartOf)]),
            )
            .await?;

        tracing::info!(parent_id, task_id, child_id = %child_id, "promoted task to project");
        Ok(child_id)
    }

    /// Add a task named after a child project to the parent and drop the
    /// parent's `part_of` link to it; the child project is left in place
    ///
    /// # Errors
    /// `NotFound` when the child project does not exist.
    pub async fn demote_project_to_task(&self, parent_id: &str, child_id: &str) -> StoreResult<String> {
        validate_id(parent_id, "parent id")?;
        validate_id(child_id, "child id")?;
        let child = self
            .project(child_id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Project, child_id))?;

        let detail = self.details.read(parent_id).await?.detail;
        let taken: HashSet<&str> = detail.tasks.iter().map(|t| t.id.as_str()).collect();
        let task_id = task_id_for(&child.title, |c| taken.contains(c));

        let mut tasks = detail.tasks.clone();
        tasks.push(Task::new(&task_id, &child.title).with_order(next_order(detail.tasks.len())));
        let links: Vec<Link> = detail
            .links
            .iter()
            .filter(|l| !(l.to_id == child_id && l.link_type == LinkType::PartOf))
            .cloned()
            .collect();

        self.details.replace_tasks(parent_id, tasks).await?;
        self.details.replace_links(parent_id, links).await?;
        tracing::info!(parent_id, child_id, task_id = %task_id, "demoted project to task");
        Ok(task_id)
    }

    // Seasons

    /// All readable seasons in id order
    ///
    /// # Errors
    /// Fails when a season file is not valid YAML.
    pub async fn list_seasons(&self) -> StoreResult<Vec<Season>> {
        self.seasons.list().await
    }

    /// One season
    ///
    /// # Errors
    /// Fails when the season file is not valid YAML.
    pub async fn season(&self, id: &str) -> StoreResult<Option<Season>> {
        self.seasons.read(id).await
    }

    /// Current season, from the pointer or today's date
    ///
    /// # Errors
    /// Fails when seasons cannot be read.
    pub async fn current_season(&self) -> StoreResult<Option<Season>> {
        self.seasons.read_current().await
    }

    /// Create an empty season and return its id
    ///
    /// # Errors
    /// `Validation` when id, start or end is blank.
    pub async fn create_season(&self, input: NewSeason) -> StoreResult<String> {
        let id = input.id.trim();
        validate_id(id, "season id")?;
        require(&input.start, "season start")?;
        require(&input.end, "season end")?;

        let season = Season::new(id, input.theme.trim(), input.start.trim(), input.end.trim());
        self.seasons.create(&season).await?;
        Ok(season.id)
    }

    /// Mark a season as current
    ///
    /// # Errors
    /// `Validation` for a blank id.
    pub async fn set_current_season(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "season id")?;
        self.seasons.set_current_id(id).await
    }

    /// Add a project to a season or change its role; outcomes are kept
    ///
    /// # Errors
    /// `NotFound` for a missing season.
    pub async fn add_initiative(&self, season_id: &str, project_id: &str, role: Role) -> StoreResult<()> {
        validate_id(project_id, "project id")?;
        if self.seasons.read(season_id).await?.is_none() {
            return Err(StoreError::not_found(Entity::Season, season_id));
        }
        self.seasons
            .upsert_initiative(season_id, project_id, role, None)
            .await
    }

    /// Remove a project from a season
    ///
    /// # Errors
    /// `NotFound` for a missing season.
    pub async fn remove_initiative(&self, season_id: &str, project_id: &str) -> StoreResult<()> {
        self.seasons.remove_initiative(season_id, project_id).await
    }

    /// Replace an initiative's outcomes (first three kept)
    ///
    /// # Errors
    /// `NotFound` for a missing season or initiative.
    pub async fn save_outcomes(
        &self,
        season_id: &str,
        project_id: &str,
        outcomes: &[String],
    ) -> StoreResult<()> {
        let outcomes: Vec<String> = outcomes
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self.seasons.set_outcomes(season_id, project_id, &outcomes).await
    }

    /// Set one week's picks (first six kept)
    ///
    /// # Errors
    /// `Validation` when `week_start` is not an ISO date.
    pub async fn set_weekly_picks(
        &self,
        season_id: &str,
        week_start: &str,
        picks: &[String],
    ) -> StoreResult<()> {
        NaiveDate::parse_from_str(week_start, "%Y-%m-%d").map_err(|e| {
            StoreError::validation(format!("week start {week_start:?} is not a date: {e}"))
        })?;
        self.seasons.set_weekly_picks(season_id, week_start, picks).await
    }

    /// Rename a season when the id changes, then set its theme
    ///
    /// # Errors
    /// `NotFound` / `AlreadyExists` from the rename.
    pub async fn update_season_meta(&self, old_id: &str, new_id: &str, theme: &str) -> StoreResult<()> {
        let (old_id, new_id) = (old_id.trim(), new_id.trim());
        validate_id(old_id, "season id")?;
        validate_id(new_id, "season id")?;

        if old_id != new_id {
            self.seasons.rename(old_id, new_id).await?;
        }
        self.seasons.update_theme(new_id, theme.trim()).await
    }

    /// Delete a season
    ///
    /// # Errors
    /// `Validation` for a blank id.
    pub async fn delete_season(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "season id")?;
        self.seasons.delete(id).await
    }

    /// Initiative of a project in a season, if any
    ///
    /// # Errors
    /// Fails when the season file is not valid YAML.
    pub async fn initiative_for_project(
        &self,
        season_id: &str,
        project_id: &str,
    ) -> StoreResult<Option<Initiative>> {
        Ok(self
            .seasons
            .read(season_id)
            .await?
            .and_then(|s| s.initiative(project_id).cloned()))
    }
}

fn require(value: &str, what: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("missing {what}")));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn task_id_for(title: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let base = slugify(title);
    let base = if base.is_empty() { FALLBACK_TASK_ID } else { &base };
    unique_id(base, is_taken)
}

fn next_order(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |n| n.saturating_add(1))
}
