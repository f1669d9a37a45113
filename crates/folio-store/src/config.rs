//! Store configuration
//!
//! One data root plus the auto-commit toggle. Loaded from the environment
//! (`DATA_DIR`, `AUTO_COMMIT`), from YAML, or built in code.

use crate::commit::{CommitHook, GitCommitHook, NoopCommitHook};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Data root used when nothing is configured
pub const DEFAULT_DATA_ROOT: &str = "../workspace-data";

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable enabling post-write commits (`1` = on)
pub const AUTO_COMMIT_ENV: &str = "AUTO_COMMIT";

/// Folio store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the projects directory, the legacy file and seasons
    pub data_root: PathBuf,
    /// Name of the status-partition directory under the data root
    pub projects_dir: String,
    /// Name of the seasons directory under the data root
    pub seasons_dir: String,
    /// Commit changed paths to git after every write
    pub auto_commit: bool,
}

impl StoreConfig {
    /// Create configuration for a data root
    #[inline]
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// With auto-commit toggled
    #[inline]
    #[must_use]
    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    /// With a different projects directory name
    #[inline]
    #[must_use]
    pub fn with_projects_dir(mut self, name: impl Into<String>) -> Self {
        self.projects_dir = name.into();
        self
    }

    /// With a different seasons directory name
    #[inline]
    #[must_use]
    pub fn with_seasons_dir(mut self, name: impl Into<String>) -> Self {
        self.seasons_dir = name.into();
        self
    }

    /// Load from process environment
    ///
    /// `DATA_DIR=<dir>` puts the data root at `<dir>/data/projects`;
    /// otherwise [`DEFAULT_DATA_ROOT`] is used. `AUTO_COMMIT=1` enables commits.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_root = match lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir).join("data").join("projects"),
            None => PathBuf::from(DEFAULT_DATA_ROOT),
        };
        let auto_commit = lookup(AUTO_COMMIT_ENV).is_some_and(|v| v == "1");
        Self {
            data_root,
            auto_commit,
            ..Self::default()
        }
    }

    /// Load config from YAML
    ///
    /// # Errors
    /// Returns the `serde_yaml` error for malformed input.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns the `serde_yaml` error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Commit hook matching the auto-commit toggle
    #[must_use]
    pub fn commit_hook(&self) -> Arc<dyn CommitHook> {
        if self.auto_commit {
            Arc::new(GitCommitHook::new(self.data_root.clone()))
        } else {
            Arc::new(NoopCommitHook)
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            projects_dir: "projects".to_string(),
            seasons_dir: "seasons".to_string(),
            auto_commit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config.data_root, PathBuf::from("../workspace-data"));
        assert_eq!(config.projects_dir, "projects");
        assert_eq!(config.seasons_dir, "seasons");
        assert!(!config.auto_commit);
    }

    #[test]
    fn data_dir_nests_under_data_projects() {
        let config = StoreConfig::from_lookup(lookup(&[("DATA_DIR", "/srv/folio")]));
        assert_eq!(config.data_root, PathBuf::from("/srv/folio/data/projects"));
    }

    #[test]
    fn auto_commit_requires_exact_one() {
        assert!(StoreConfig::from_lookup(lookup(&[("AUTO_COMMIT", "1")])).auto_commit);
        assert!(!StoreConfig::from_lookup(lookup(&[("AUTO_COMMIT", "true")])).auto_commit);
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = StoreConfig::from_yaml("data_root: /tmp/folio\nauto_commit: true\n").unwrap();
        assert_eq!(config.data_root, PathBuf::from("/tmp/folio"));
        assert!(config.auto_commit);
        assert_eq!(config.seasons_dir, "seasons");

        let back = StoreConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn builder_methods() {
        let config = StoreConfig::new("/data")
            .with_projects_dir("items")
            .with_seasons_dir("quarters")
            .with_auto_commit(true);
        assert_eq!(config.projects_dir, "items");
        assert_eq!(config.seasons_dir, "quarters");
        assert!(config.auto_commit);
    }
}
