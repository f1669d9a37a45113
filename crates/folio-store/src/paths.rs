//! On-disk locations
//!
//! Pure functions of configuration: no I/O, existence is the caller's concern.
//!
//! ```text
//! <root>/<projects>/<status>.yaml          status partition
//! <root>/<projects>/<id>/project.yaml      detail document
//! <root>/<projects>/<id>/notes.md          notes
//! <root>/<projects>/<id>/journal/*.md      dated notes (fallback)
//! <root>/<projects>.yaml                   legacy single-file store
//! <root>/<seasons>/<id>/season.yaml        season document
//! <root>/<seasons>/current.txt             current season pointer
//! ```

use crate::config::StoreConfig;
use std::path::{Path, PathBuf};

/// Computes every path the stores touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
    projects_dir: String,
    seasons_dir: String,
}

impl PathResolver {
    /// Resolver with default directory names
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&StoreConfig::new(root))
    }

    /// Resolver for a configuration
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            root: config.data_root.clone(),
            projects_dir: config.projects_dir.clone(),
            seasons_dir: config.seasons_dir.clone(),
        }
    }

    /// Data root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the status partitions and per-project directories
    #[must_use]
    pub fn status_dir(&self) -> PathBuf {
        self.root.join(&self.projects_dir)
    }

    /// Partition file for a status key
    #[must_use]
    pub fn status_file(&self, status: &str) -> PathBuf {
        self.status_dir().join(format!("{status}.yaml"))
    }

    /// Legacy single-file project list
    #[must_use]
    pub fn legacy_file(&self) -> PathBuf {
        self.root.join(format!("{}.yaml", self.projects_dir))
    }

    /// Detail directory of a project
    #[must_use]
    pub fn project_dir(&self, id: &str) -> PathBuf {
        self.status_dir().join(id)
    }

    /// Detail document of a project
    #[must_use]
    pub fn detail_file(&self, id: &str) -> PathBuf {
        self.project_dir(id).join("project.yaml")
    }

    /// Notes of a project
    #[must_use]
    pub fn notes_file(&self, id: &str) -> PathBuf {
        self.project_dir(id).join("notes.md")
    }

    /// Dated notes of a project
    #[must_use]
    pub fn journal_dir(&self, id: &str) -> PathBuf {
        self.project_dir(id).join("journal")
    }

    /// Directory holding all seasons
    #[must_use]
    pub fn seasons_dir(&self) -> PathBuf {
        self.root.join(&self.seasons_dir)
    }

    /// Folder of one season
    #[must_use]
    pub fn season_dir(&self, id: &str) -> PathBuf {
        self.seasons_dir().join(id)
    }

    /// Season document
    #[must_use]
    pub fn season_file(&self, id: &str) -> PathBuf {
        self.season_dir(id).join("season.yaml")
    }

    /// Current season pointer file
    #[must_use]
    pub fn current_season_pointer(&self) -> PathBuf {
        self.seasons_dir().join("current.txt")
    }
}
