//! Testing utilities for the folio workspace
//!
//! Temporary data roots plus helpers to seed and inspect the YAML files the
//! stores work on.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use folio_codec::Value;
use folio_store::{NoopCommitHook, PathResolver, Portfolio, Project, StoreConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Data root in a temporary directory, removed on drop
#[derive(Debug)]
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::new(self.path())
    }

    pub fn paths(&self) -> PathResolver {
        PathResolver::from_config(&self.config())
    }

    /// Portfolio with commits disabled
    pub fn portfolio(&self) -> Portfolio {
        Portfolio::with_hook(&self.config(), Arc::new(NoopCommitHook))
    }

    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }

    /// Write `projects/<status>.yaml` verbatim
    pub fn write_partition(&self, status: &str, yaml: &str) -> PathBuf {
        let path = self.paths().status_file(status);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, yaml).unwrap();
        path
    }

    /// Partition holding entries `{id, title}` for each id
    pub fn seed_partition(&self, status: &str, ids: &[&str]) -> PathBuf {
        let mut yaml = String::from("projects:\n");
        for id in ids {
            yaml.push_str(&format!("  - id: {id}\n    title: {id}\n    category: test\n"));
        }
        self.write_partition(status, &yaml)
    }

    /// Ids in a partition file, in file order
    pub fn partition_ids(&self, status: &str) -> Vec<String> {
        self.partition_entries(status)
            .iter()
            .filter_map(|e| e.get("id").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Raw entries in a partition file
    pub fn partition_entries(&self, status: &str) -> Vec<Value> {
        let path = self.paths().status_file(status);
        let Ok(text) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        folio_codec::parse_mapping(&text)
            .unwrap()
            .get("projects")
            .and_then(Value::as_sequence)
            .cloned()
            .unwrap_or_default()
    }

    /// Season folder with a minimal `season.yaml`
    pub fn seed_season(&self, id: &str, start: &str, end: &str) -> PathBuf {
        let path = self.paths().season_file(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            format!("theme: {id}\nstart: {start}\nend: {end}\ninitiatives: []\nweekly: []\n"),
        )
        .unwrap();
        path
    }

    /// Write `project.yaml` for a project
    pub fn write_detail(&self, id: &str, yaml: &str) -> PathBuf {
        let path = self.paths().detail_file(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, yaml).unwrap();
        path
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids of projects, in order
pub fn ids(projects: &[Project]) -> Vec<&str> {
    projects.iter().map(|p| p.id.as_str()).collect()
}

/// `String` vector from literals
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
