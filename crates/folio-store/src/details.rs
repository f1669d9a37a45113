//! Per-project detail documents and notes

use crate::commit::{record, CommitHook};
use crate::error::{StoreError, StoreResult};
use crate::io;
use crate::model::{DetailUpdate, Link, ProjectDetail, Task};
use crate::paths::PathResolver;
use crate::slug::validate_id;
use folio_codec::Value;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Detail document and notes of one project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailRecord {
    /// Parsed `project.yaml`, defaulted when missing or invalid
    pub detail: ProjectDetail,
    /// Notes body, empty when there are none
    pub notes: String,
}

/// Store for `<id>/project.yaml` and `<id>/notes.md`
#[derive(Clone)]
pub struct DetailStore {
    paths: Arc<PathResolver>,
    hook: Arc<dyn CommitHook>,
}

impl fmt::Debug for DetailStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailStore")
            .field("status_dir", &self.paths.status_dir())
            .finish_non_exhaustive()
    }
}

impl DetailStore {
    /// Create store
    #[must_use]
    pub fn new(paths: Arc<PathResolver>, hook: Arc<dyn CommitHook>) -> Self {
        Self { paths, hook }
    }

    /// Read detail and notes
    ///
    /// An unreadable detail document is logged and replaced by the default.
    /// Notes come from `notes.md` with front matter stripped, else from the
    /// last journal entry by file name.
    ///
    /// # Errors
    /// Fails only on filesystem errors.
    pub async fn read(&self, id: &str) -> StoreResult<DetailRecord> {
        validate_id(id, "project id")?;
        let file = self.paths.detail_file(id);
        let detail = match io::read_mapping(&file).await {
            Ok(Some(map)) => ProjectDetail::from_mapping(&map).unwrap_or_else(|reason| {
                tracing::warn!(id, %reason, "detail document does not match schema");
                ProjectDetail::default()
            }),
            Ok(None) => ProjectDetail::default(),
            Err(StoreError::Parse(e)) => {
                tracing::warn!(id, error = %e, "detail document is not valid yaml");
                ProjectDetail::default()
            }
            Err(e) => return Err(e),
        };

        Ok(DetailRecord {
            detail,
            notes: self.read_notes(id).await?,
        })
    }

    /// Replace the notes file
    ///
    /// # Errors
    /// Fails on write or commit errors.
    pub async fn write_notes(&self, id: &str, text: &str) -> StoreResult<()> {
        validate_id(id, "project id")?;
        let file = self.paths.notes_file(id);
        io::write_text(&file, text).await?;
        record(self.hook.as_ref(), &[file], &format!("proj:{id} notes")).await?;
        tracing::info!(id, bytes = text.len(), "wrote notes");
        Ok(())
    }

    /// Merge a partial update into the stored detail
    ///
    /// # Errors
    /// `Validation` when the merged document is invalid; `Parse` when the
    /// stored document is not valid YAML.
    pub async fn merge_detail(&self, id: &str, update: DetailUpdate) -> StoreResult<ProjectDetail> {
        let mut detail = self.load_for_write(id).await?;
        detail.apply(update).map_err(StoreError::validation)?;
        self.save(id, &detail, &format!("proj:{id} detail update"))
            .await?;
        Ok(detail)
    }

    /// Replace the task list wholesale
    ///
    /// # Errors
    /// `Validation` for tasks with empty titles.
    pub async fn replace_tasks(&self, id: &str, tasks: Vec<Task>) -> StoreResult<ProjectDetail> {
        let mut detail = self.load_for_write(id).await?;
        detail.tasks = tasks;
        detail.validate().map_err(StoreError::validation)?;
        self.save(id, &detail, &format!("proj:{id} tasks reorder"))
            .await?;
        Ok(detail)
    }

    /// Replace the link list wholesale
    ///
    /// # Errors
    /// Fails on read, write or commit errors.
    pub async fn replace_links(&self, id: &str, links: Vec<Link>) -> StoreResult<ProjectDetail> {
        let mut detail = self.load_for_write(id).await?;
        detail.links = links;
        self.save(id, &detail, &format!("proj:{id} links update"))
            .await?;
        Ok(detail)
    }

    async fn read_notes(&self, id: &str) -> StoreResult<String> {
        if let Some(text) = io::read_text(&self.paths.notes_file(id)).await? {
            return Ok(folio_codec::strip_front_matter(&text).trim().to_string());
        }

        let journal = self.paths.journal_dir(id);
        let entries = io::list_dir(&journal, |kind, name| {
            kind.is_file() && name.ends_with(".md") && !name.starts_with('.')
        })
        .await?;
        match entries.last() {
            Some(latest) => Ok(io::read_text(&journal.join(latest))
                .await?
                .unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    async fn load_for_write(&self, id: &str) -> StoreResult<ProjectDetail> {
        validate_id(id, "project id")?;
        let Some(map) = io::read_mapping(&self.paths.detail_file(id)).await? else {
            return Ok(ProjectDetail::default());
        };
        Ok(ProjectDetail::from_mapping(&map).unwrap_or_else(|reason| {
            tracing::warn!(id, %reason, "discarding detail document that does not match schema");
            ProjectDetail::default()
        }))
    }

    async fn save(&self, id: &str, detail: &ProjectDetail, message: &str) -> StoreResult<()> {
        let file = self.paths.detail_file(id);
        io::write_document(&file, &Value::Mapping(detail.to_mapping())).await?;
        record(self.hook.as_ref(), &[file], message).await?;
        tracing::info!(id, tasks = detail.tasks.len(), links = detail.links.len(), "saved detail");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::NoopCommitHook;
    use crate::model::{LinkType, TaskPatch};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> (DetailStore, Arc<PathResolver>) {
        let paths = Arc::new(PathResolver::new(dir.path()));
        (DetailStore::new(paths.clone(), Arc::new(NoopCommitHook)), paths)
    }

    #[tokio::test]
    async fn missing_project_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store(&dir);
        let rec = store.read("ghost").await.unwrap();
        assert_eq!(rec, DetailRecord::default());
    }

    #[tokio::test]
    async fn notes_strip_front_matter() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store(&dir);
        store
            .write_notes("alpha", "---\ntags: [x]\n---\n\n# Alpha\n\n")
            .await
            .unwrap();
        assert_eq!(store.read("alpha").await.unwrap().notes, "# Alpha");
    }

    #[tokio::test]
    async fn journal_fallback_uses_latest_file() {
        let dir = TempDir::new().unwrap();
        let (store, paths) = store(&dir);
        let journal = paths.journal_dir("alpha");
        std::fs::create_dir_all(&journal).unwrap();
        std::fs::write(journal.join("2025-01-01.md"), "old").unwrap();
        std::fs::write(journal.join("2025-03-01.md"), "---\nk: v\n---\nnew\n").unwrap();
        std::fs::write(journal.join("2025-04-01.txt"), "ignored").unwrap();

        // journal entries are returned raw
        assert_eq!(store.read("alpha").await.unwrap().notes, "---\nk: v\n---\nnew\n");
    }

    #[tokio::test]
    async fn invalid_yaml_reads_as_default_but_blocks_merge() {
        let dir = TempDir::new().unwrap();
        let (store, paths) = store(&dir);
        let file = paths.detail_file("alpha");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "tasks: [unclosed\n").unwrap();

        assert_eq!(store.read("alpha").await.unwrap().detail, ProjectDetail::default());
        let err = store
            .merge_detail("alpha", DetailUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[tokio::test]
    async fn merge_then_replace() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store(&dir);
        let mut patch = TaskPatch::new("write");
        patch.title = Some("Write".into());
        store
            .merge_detail("alpha", DetailUpdate::tasks(vec![patch]))
            .await
            .unwrap();
        store
            .merge_detail(
                "alpha",
                DetailUpdate::links(vec![Link::new("beta", LinkType::RelatesTo)]),
            )
            .await
            .unwrap();

        let detail = store.read("alpha").await.unwrap().detail;
        assert_eq!(detail.tasks.len(), 1);
        assert_eq!(detail.links.len(), 1);

        store.replace_links("alpha", Vec::new()).await.unwrap();
        let detail = store.read("alpha").await.unwrap().detail;
        assert_eq!(detail.tasks.len(), 1);
        assert!(detail.links.is_empty());
    }
}
