//! Status-partitioned project store
//!
//! Every status key owns one `<status>.yaml` file holding `meta` and an
//! ordered `projects` list. Operations read the affected file(s) whole, edit
//! the list in memory and write the document back. Entries are handled as raw
//! YAML mappings so fields unknown to [`Project`] survive moves and edits.

use crate::commit::{record, CommitHook};
use crate::error::{Entity, StoreError, StoreResult};
use crate::io::{self, sequence, str_field};
use crate::model::project::{jevm_value, pivot_cost_value};
use crate::model::{Jevm, PivotCost, Project, StatusMeta};
use crate::paths::PathResolver;
use crate::slug::validate_id;
use folio_codec::{Mapping, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

const PROJECTS_KEY: &str = "projects";
const META_KEY: &str = "meta";

/// One partition file split into its project list and everything else
#[derive(Debug, Clone, Default)]
struct StatusDocument {
    projects: Vec<Value>,
    rest: Mapping,
}

impl StatusDocument {
    fn from_mapping(mut map: Mapping) -> Self {
        let projects = sequence(&map, PROJECTS_KEY);
        map.shift_remove(PROJECTS_KEY);
        Self {
            projects,
            rest: map,
        }
    }

    fn into_value(self) -> Value {
        let mut map = self.rest;
        map.insert(PROJECTS_KEY.into(), Value::Sequence(self.projects));
        Value::Mapping(map)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.projects.iter().position(|p| entry_id(p) == Some(id))
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    str_field(entry, "id")
}

/// Unparsed project entry and the partition holding it
#[derive(Debug, Clone, PartialEq)]
pub struct RawProject {
    /// Entry exactly as stored
    pub entry: Mapping,
    /// Status key of the owning partition
    pub status: String,
}

/// Field-level edit of an existing project entry
///
/// Changes apply in insertion order. `id` and `status` cannot be patched;
/// use rename and move for those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    changes: Vec<(String, Option<Value>)>,
}

impl ProjectPatch {
    /// Empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary field
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.push((key.into(), Some(value.into())));
        self
    }

    /// Remove a field
    #[must_use]
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.changes.push((key.into(), None));
        self
    }

    /// Set the title
    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.set("title", title.into())
    }

    /// Set the category
    #[must_use]
    pub fn category(self, category: impl Into<String>) -> Self {
        self.set("category", category.into())
    }

    /// Set the scores
    #[must_use]
    pub fn jevm(self, jevm: &Jevm) -> Self {
        self.set("jevm", jevm_value(jevm))
    }

    /// Set the pivot cost, `None` writing an explicit null
    #[must_use]
    pub fn pivot_cost(self, pivot_cost: Option<PivotCost>) -> Self {
        self.set("pivot_cost", pivot_cost_value(pivot_cost))
    }

    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn validate(&self) -> StoreResult<()> {
        for (key, change) in &self.changes {
            if key == "id" || key == "status" {
                return Err(StoreError::validation(format!(
                    "field `{key}` cannot be patched"
                )));
            }
            if key == "title" && !matches!(change, Some(Value::String(s)) if !s.is_empty()) {
                return Err(StoreError::validation("title must be a non-empty string"));
            }
        }
        Ok(())
    }

    fn apply(&self, entry: &mut Mapping) {
        for (key, change) in &self.changes {
            match change {
                Some(value) => {
                    entry.insert(key.as_str().into(), value.clone());
                }
                None => {
                    entry.shift_remove(key.as_str());
                }
            }
        }
    }
}

/// Project store over the status partition files
#[derive(Clone)]
pub struct ProjectStore {
    paths: Arc<PathResolver>,
    hook: Arc<dyn CommitHook>,
}

impl fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectStore")
            .field("status_dir", &self.paths.status_dir())
            .finish_non_exhaustive()
    }
}

impl ProjectStore {
    /// Create store
    #[must_use]
    pub fn new(paths: Arc<PathResolver>, hook: Arc<dyn CommitHook>) -> Self {
        Self { paths, hook }
    }

    /// Path resolver in use
    #[must_use]
    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Status keys with a partition file on disk, sorted
    ///
    /// # Errors
    /// Fails when the status directory cannot be listed.
    pub async fn list_status_keys(&self) -> StoreResult<Vec<String>> {
        let names = io::list_dir(&self.paths.status_dir(), |kind, name| {
            kind.is_file() && name.ends_with(".yaml")
        })
        .await?;
        Ok(names
            .into_iter()
            .filter_map(|n| n.strip_suffix(".yaml").map(str::to_string))
            .filter(|key| validate_id(key, "status").is_ok())
            .collect())
    }

    /// Display metadata of every partition, ascending by order
    ///
    /// # Errors
    /// Fails when a partition file cannot be read or parsed.
    pub async fn read_status_meta(&self) -> StoreResult<Vec<StatusMeta>> {
        let mut metas = Vec::new();
        for key in self.list_status_keys().await? {
            let doc = self.read_document(&key).await?;
            metas.push(StatusMeta::from_meta(&key, doc.rest.get(META_KEY)));
        }
        metas.sort_by_key(|m| m.order);
        Ok(metas)
    }

    /// All projects: partitions in metadata order, file order within each
    ///
    /// Malformed entries are skipped with a warning. Entries of the legacy
    /// single-file store then replace split entries with the same id or are
    /// appended; nothing is written back.
    ///
    /// # Errors
    /// Fails when a file cannot be read or is not valid YAML.
    pub async fn read_all_projects(&self) -> StoreResult<Vec<Project>> {
        let mut out: Vec<Project> = Vec::new();

        for meta in self.read_status_meta().await? {
            let doc = self.read_document(&meta.key).await?;
            for entry in &doc.projects {
                match Project::from_entry(entry, &meta.key) {
                    Ok(project) => out.push(project),
                    Err(reason) => tracing::warn!(
                        status = %meta.key,
                        id = entry_id(entry).unwrap_or("?"),
                        %reason,
                        "skipping malformed project entry"
                    ),
                }
            }
        }

        let legacy_file = self.paths.legacy_file();
        if let Some(map) = io::read_mapping(&legacy_file).await? {
            for entry in sequence(&map, PROJECTS_KEY) {
                let project = match Project::from_legacy(&entry) {
                    Ok(project) => project,
                    Err(reason) => {
                        tracing::warn!(file = %legacy_file.display(), %reason, "skipping legacy entry");
                        continue;
                    }
                };
                match out.iter_mut().find(|p| p.id == project.id) {
                    Some(existing) => *existing = project,
                    None => out.push(project),
                }
            }
        }

        Ok(out)
    }

    /// Sorted distinct categories of all projects
    ///
    /// # Errors
    /// Same as [`ProjectStore::read_all_projects`].
    pub async fn categories(&self) -> StoreResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .read_all_projects()
            .await?
            .into_iter()
            .map(|p| p.category)
            .collect();
        Ok(categories.into_iter().collect())
    }

    /// Locate the raw entry of a project
    ///
    /// # Errors
    /// Fails when a partition file cannot be read.
    pub async fn find_raw(&self, id: &str) -> StoreResult<Option<RawProject>> {
        for status in self.list_status_keys().await? {
            let doc = self.read_document(&status).await?;
            let hit = doc
                .projects
                .iter()
                .find(|p| entry_id(p) == Some(id))
                .and_then(Value::as_mapping);
            if let Some(entry) = hit {
                return Ok(Some(RawProject {
                    entry: entry.clone(),
                    status,
                }));
            }
        }
        Ok(None)
    }

    /// Insert or replace a project in its status partition
    ///
    /// Replacing merges into the stored entry in place; absent optional
    /// fields keep their stored values. A copy held by another partition is
    /// removed first so ids stay unique.
    ///
    /// # Errors
    /// Fails on unreadable partitions or write errors.
    pub async fn upsert(&self, project: &Project) -> StoreResult<()> {
        validate_id(&project.id, "project id")?;
        validate_id(&project.status, "status")?;
        let mut entry = project.to_entry();
        let mut touched = Vec::new();

        if let Some(found) = self.find_raw(&project.id).await? {
            if found.status != project.status {
                let mut merged = found.entry;
                merged.extend(entry);
                entry = merged;
                let mut doc = self.read_document(&found.status).await?;
                doc.projects.retain(|p| entry_id(p) != Some(&project.id));
                touched.push(self.write_document(&found.status, doc).await?);
            }
        }
        entry.shift_remove("status");

        let mut doc = self.read_document(&project.status).await?;
        match doc.position(&project.id) {
            Some(idx) => {
                let mut merged = doc.projects[idx].as_mapping().cloned().unwrap_or_default();
                merged.extend(entry);
                merged.shift_remove("status");
                doc.projects[idx] = Value::Mapping(merged);
            }
            None => doc.projects.push(Value::Mapping(entry)),
        }
        touched.push(self.write_document(&project.status, doc).await?);

        let message = format!("proj:{} -> {}", project.id, project.status);
        record(self.hook.as_ref(), &touched, &message).await?;
        tracing::info!(id = %project.id, status = %project.status, "upserted project");
        Ok(())
    }

    /// Patch fields of an existing entry in place
    ///
    /// # Errors
    /// `Validation` for patches touching `id`/`status`, `NotFound` when no
    /// partition holds the id.
    pub async fn update_fields(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        patch.validate()?;

        for status in self.list_status_keys().await? {
            let mut doc = self.read_document(&status).await?;
            let Some(idx) = doc.position(id) else {
                continue;
            };
            if let Value::Mapping(entry) = &mut doc.projects[idx] {
                patch.apply(entry);
            }
            let file = self.write_document(&status, doc).await?;
            record(self.hook.as_ref(), &[file], &format!("proj:{id} update")).await?;
            tracing::info!(id, status = %status, "updated project fields");
            return Ok(());
        }

        Err(StoreError::not_found(Entity::Project, id))
    }

    /// Remove an id from one partition; returns whether it was present
    ///
    /// # Errors
    /// Fails on unreadable partitions or write errors.
    pub async fn remove_from_status(&self, status: &str, id: &str) -> StoreResult<bool> {
        let mut doc = self.read_document(status).await?;
        let before = doc.projects.len();
        doc.projects.retain(|p| entry_id(p) != Some(id));
        if doc.projects.len() == before {
            return Ok(false);
        }

        let file = self.write_document(status, doc).await?;
        record(self.hook.as_ref(), &[file], &format!("proj:{status} remove {id}")).await?;
        tracing::info!(id, status, "removed project from partition");
        Ok(true)
    }

    /// Insert a raw entry at `index` (clamped) or at the end
    ///
    /// A stale copy of the same id in the partition is dropped first.
    ///
    /// # Errors
    /// `Validation` when the entry has no string `id`.
    pub async fn insert_raw(
        &self,
        status: &str,
        entry: Mapping,
        index: Option<usize>,
    ) -> StoreResult<()> {
        let id = match entry.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => return Err(StoreError::validation("entry must include a string id")),
        };
        validate_id(&id, "project id")?;

        let mut doc = self.read_document(status).await?;
        doc.projects.retain(|p| entry_id(p) != Some(&id));
        let at = index.map_or(doc.projects.len(), |i| i.min(doc.projects.len()));
        doc.projects.insert(at, Value::Mapping(entry));

        let file = self.write_document(status, doc).await?;
        record(self.hook.as_ref(), &[file], &format!("proj:{status} add {id}")).await?;
        tracing::info!(id = %id, status, index = at, "inserted project");
        Ok(())
    }

    /// Move a project between partitions, keeping unknown fields
    ///
    /// No-op when `from == to`.
    ///
    /// # Errors
    /// `NotFound` when `from` does not hold the id.
    pub async fn move_status(
        &self,
        id: &str,
        from: &str,
        to: &str,
        index: Option<usize>,
    ) -> StoreResult<()> {
        validate_id(id, "project id")?;
        validate_id(from, "status")?;
        validate_id(to, "status")?;
        if from == to {
            return Ok(());
        }

        let mut doc = self.read_document(from).await?;
        let idx = doc
            .position(id)
            .ok_or_else(|| StoreError::not_found(Entity::Project, id))?;
        let mut entry = doc.projects.remove(idx).as_mapping().cloned().unwrap_or_default();
        let file = self.write_document(from, doc).await?;
        record(self.hook.as_ref(), &[file], &format!("proj:{from} remove {id}")).await?;

        entry.insert("status".into(), to.into());
        self.insert_raw(to, entry, index).await?;
        tracing::info!(id, from, to, "moved project");
        Ok(())
    }

    /// Reorder a partition: listed ids first in the given order, then the
    /// remaining entries in their previous relative order
    ///
    /// # Errors
    /// Fails on unreadable partitions or write errors.
    pub async fn reorder(&self, status: &str, ordered_ids: &[String]) -> StoreResult<()> {
        let mut doc = self.read_document(status).await?;
        let mut remaining: Vec<Option<Value>> = doc.projects.drain(..).map(Some).collect();
        let mut next = Vec::with_capacity(remaining.len());

        for id in ordered_ids {
            let hit = remaining
                .iter_mut()
                .find(|slot| slot.as_ref().and_then(entry_id) == Some(id.as_str()));
            if let Some(entry) = hit.and_then(Option::take) {
                next.push(entry);
            }
        }
        next.extend(remaining.into_iter().flatten());
        doc.projects = next;

        let file = self.write_document(status, doc).await?;
        record(self.hook.as_ref(), &[file], &format!("proj:{status} reorder")).await?;
        tracing::info!(status, count = ordered_ids.len(), "reordered partition");
        Ok(())
    }

    /// Give a project a new id
    ///
    /// The detail directory is renamed unless a directory already exists at
    /// the new id, in which case it stays where it is. The record is removed
    /// from its partition and appended to the tail of `new_project.status`.
    ///
    /// # Errors
    /// `NotFound` when no partition holds `old_id`.
    pub async fn rename(&self, old_id: &str, new_project: &Project) -> StoreResult<()> {
        let new_id = new_project.id.as_str();
        validate_id(old_id, "project id")?;
        validate_id(new_id, "project id")?;
        validate_id(&new_project.status, "status")?;
        let found = self
            .find_raw(old_id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Project, old_id))?;

        self.rename_directory(old_id, new_id).await?;

        let mut entry = new_project.to_entry();
        for (key, value) in &found.entry {
            if !entry.contains_key(key) && key.as_str() != Some("status") {
                entry.insert(key.clone(), value.clone());
            }
        }

        let mut touched = Vec::new();
        let mut source = self.read_document(&found.status).await?;
        source.projects.retain(|p| entry_id(p) != Some(old_id));
        if found.status == new_project.status {
            source.projects.push(Value::Mapping(entry));
            touched.push(self.write_document(&found.status, source).await?);
        } else {
            touched.push(self.write_document(&found.status, source).await?);
            let mut target = self.read_document(&new_project.status).await?;
            target.projects.retain(|p| entry_id(p) != Some(new_id));
            target.projects.push(Value::Mapping(entry));
            touched.push(self.write_document(&new_project.status, target).await?);
        }

        record(
            self.hook.as_ref(),
            &touched,
            &format!("proj: rename {old_id} -> {new_id}"),
        )
        .await?;
        tracing::info!(old_id, new_id, "renamed project");
        Ok(())
    }

    /// Remove a project from its partition and delete its detail directory
    ///
    /// # Errors
    /// Fails on unreadable partitions or filesystem errors.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "project id")?;
        if let Some(found) = self.find_raw(id).await? {
            self.remove_from_status(&found.status, id).await?;
        }

        let dir = self.paths.project_dir(id);
        if io::remove_dir_if_exists(&dir).await? {
            record(self.hook.as_ref(), &[dir], &format!("proj: delete {id} directory")).await?;
        }
        tracing::info!(id, "deleted project");
        Ok(())
    }

    async fn rename_directory(&self, old_id: &str, new_id: &str) -> StoreResult<()> {
        let from = self.paths.project_dir(old_id);
        let to = self.paths.project_dir(new_id);
        if !io::exists(&from).await? {
            return Ok(());
        }
        if io::exists(&to).await? {
            tracing::warn!(
                from = %from.display(),
                to = %to.display(),
                "detail directory already exists at new id, leaving old directory in place"
            );
            return Ok(());
        }

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| StoreError::io(&from, e))?;
        record(
            self.hook.as_ref(),
            &[from, to],
            &format!("proj: rename {old_id} -> {new_id}"),
        )
        .await
    }

    async fn read_document(&self, status: &str) -> StoreResult<StatusDocument> {
        validate_id(status, "status")?;
        let map = io::read_mapping(&self.paths.status_file(status))
            .await?
            .unwrap_or_default();
        Ok(StatusDocument::from_mapping(map))
    }

    async fn write_document(&self, status: &str, doc: StatusDocument) -> StoreResult<PathBuf> {
        validate_id(status, "status")?;
        let file = self.paths.status_file(status);
        io::write_document(&file, &doc.into_value()).await?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{MockCommitHook, NoopCommitHook};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ProjectStore {
        ProjectStore::new(
            Arc::new(PathResolver::new(dir.path())),
            Arc::new(NoopCommitHook),
        )
    }

    fn ids(doc: &StatusDocument) -> Vec<&str> {
        doc.projects.iter().filter_map(entry_id).collect()
    }

    #[test]
    fn status_document_keeps_rest_before_projects() {
        let map = folio_codec::parse_mapping("projects: [{id: a}]\nmeta: {label: A}\n").unwrap();
        let doc = StatusDocument::from_mapping(map);
        assert_eq!(ids(&doc), vec!["a"]);
        let text = folio_codec::serialize(&doc.into_value()).unwrap();
        assert!(text.starts_with("meta:"));
    }

    #[test]
    fn patch_rejects_identity_fields() {
        assert!(ProjectPatch::new().set("id", "x").validate().is_err());
        assert!(ProjectPatch::new().remove("status").validate().is_err());
        assert!(ProjectPatch::new().remove("title").validate().is_err());
        assert!(ProjectPatch::new().title("ok").remove("jevm").validate().is_ok());
    }

    #[tokio::test]
    async fn reorder_keeps_unlisted_and_idless_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for id in ["a", "b", "c"] {
            store.upsert(&Project::new(id, id, "active")).await.unwrap();
        }

        store
            .reorder("active", &["c".into(), "c".into(), "a".into(), "zz".into()])
            .await
            .unwrap();
        let doc = store.read_document("active").await.unwrap();
        assert_eq!(ids(&doc), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn insert_raw_requires_string_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut entry = Mapping::new();
        entry.insert("id".into(), 7.into());
        let err = store.insert_raw("active", entry, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn upsert_commits_partition_file() {
        let dir = TempDir::new().unwrap();
        let paths = Arc::new(PathResolver::new(dir.path()));
        let expected = paths.status_file("active");

        let mut hook = MockCommitHook::new();
        hook.expect_commit()
            .withf(move |files, message| files == [expected.clone()] && message == "proj:alpha -> active")
            .times(1)
            .returning(|_, _| Ok(()));

        let store = ProjectStore::new(paths, Arc::new(hook));
        store
            .upsert(&Project::new("alpha", "Alpha", "active"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_commit_surfaces_after_write() {
        let dir = TempDir::new().unwrap();
        let paths = Arc::new(PathResolver::new(dir.path()));
        let mut hook = MockCommitHook::new();
        hook.expect_commit()
            .returning(|_, _| Err(StoreError::Commit("no repo".into())));

        let store = ProjectStore::new(paths.clone(), Arc::new(hook));
        let err = store
            .upsert(&Project::new("alpha", "Alpha", "active"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Commit(_)));
        assert!(paths.status_file("active").exists());
    }
}
