//! Post-write version-control side effect
//!
//! Every store write ends with `CommitHook::commit(paths, message)`. The
//! default hook does nothing; [`GitCommitHook`] stages and commits the touched
//! paths in the repository enclosing the data root.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Called after each successful write with the paths it changed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitHook: Send + Sync {
    /// Record a change
    ///
    /// # Errors
    /// Returns `StoreError::Commit` when the change cannot be recorded.
    async fn commit(&self, paths: &[PathBuf], message: &str) -> StoreResult<()>;
}

/// Hook used when auto-commit is off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommitHook;

#[async_trait]
impl CommitHook for NoopCommitHook {
    async fn commit(&self, _paths: &[PathBuf], _message: &str) -> StoreResult<()> {
        Ok(())
    }
}

/// Stages and commits through the `git` executable
#[derive(Debug, Clone)]
pub struct GitCommitHook {
    repo_dir: PathBuf,
}

impl GitCommitHook {
    /// Hook running git inside `repo_dir`
    #[must_use]
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    /// Directory git runs in
    #[must_use]
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    async fn stage(&self, paths: &[PathBuf]) -> StoreResult<()> {
        let output = Command::new("git")
            .args(["add", "-A", "--"])
            .args(paths)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| StoreError::Commit(format!("git add failed: {e}")))?;

        if !output.status.success() {
            return Err(StoreError::Commit(format!(
                "git add failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn has_staged_changes(&self) -> StoreResult<bool> {
        let status = Command::new("git")
            .args(["diff", "--cached", "--quiet"])
            .current_dir(&self.repo_dir)
            .status()
            .await
            .map_err(|e| StoreError::Commit(format!("git diff failed: {e}")))?;

        // exit code 1 = differences staged
        Ok(!status.success())
    }

    async fn commit_staged(&self, message: &str) -> StoreResult<()> {
        let output = Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| StoreError::Commit(format!("git commit failed: {e}")))?;

        if !output.status.success() {
            return Err(StoreError::Commit(format!(
                "git commit failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CommitHook for GitCommitHook {
    async fn commit(&self, paths: &[PathBuf], message: &str) -> StoreResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        self.stage(paths).await?;
        if !self.has_staged_changes().await? {
            tracing::debug!(message, "nothing staged, skipping commit");
            return Ok(());
        }
        self.commit_staged(message).await?;

        tracing::info!(message, files = paths.len(), "committed data change");
        Ok(())
    }
}

/// Run the hook, logging failures before returning them
pub(crate) async fn record(
    hook: &dyn CommitHook,
    paths: &[PathBuf],
    message: &str,
) -> StoreResult<()> {
    if let Err(e) = hook.commit(paths, message).await {
        tracing::warn!(message, error = %e, "commit hook failed");
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_hook_accepts_anything() {
        let hook = NoopCommitHook;
        hook.commit(&[PathBuf::from("/nowhere")], "msg").await.unwrap();
    }

    #[tokio::test]
    async fn git_hook_skips_empty_path_list() {
        let hook = GitCommitHook::new("/definitely/not/a/repo");
        hook.commit(&[], "msg").await.unwrap();
    }

    #[tokio::test]
    async fn record_passes_paths_and_message() {
        let mut hook = MockCommitHook::new();
        hook.expect_commit()
            .withf(|paths, message| paths == [PathBuf::from("a.yaml")] && message == "proj:a update")
            .times(1)
            .returning(|_, _| Ok(()));

        record(&hook, &[PathBuf::from("a.yaml")], "proj:a update")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn record_propagates_failure() {
        let mut hook = MockCommitHook::new();
        hook.expect_commit()
            .returning(|_, _| Err(StoreError::Commit("locked".into())));

        let err = record(&hook, &[PathBuf::from("a.yaml")], "m").await.unwrap_err();
        assert!(matches!(err, StoreError::Commit(_)));
    }

    #[tokio::test]
    async fn git_hook_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.yaml");
        std::fs::write(&file, "a: 1\n").unwrap();

        let hook = GitCommitHook::new(dir.path());
        let result = hook.commit(&[file], "proj: test").await;
        assert!(matches!(result, Err(StoreError::Commit(_))));
    }
}
