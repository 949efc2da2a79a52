use async_trait::async_trait;
use runhook_core::{Result, RunhookError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output of a successful sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Trimmed stdout of the underlying command, if any.
    pub output: String,
}

/// Brings the service's working copy of the source repository up to date.
#[async_trait]
pub trait RepoSync: Send + Sync {
    /// Short name for logs, e.g. "git-pull".
    fn name(&self) -> &str;

    /// Run the sync to completion. No timeout is applied here.
    async fn sync(&self) -> Result<SyncReport>;
}

/// `git pull [remote [branch]]` in a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitPull {
    repo_dir: PathBuf,
    remote: Option<String>,
    branch: Option<String>,
}

impl GitPull {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            remote: None,
            branch: None,
        }
    }

    /// Pull from `remote`, optionally a specific `branch` of it.
    pub fn with_remote(mut self, remote: impl Into<String>, branch: Option<String>) -> Self {
        self.remote = Some(remote.into());
        self.branch = branch;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Arguments passed to `git`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["pull".to_string()];
        if let Some(ref remote) = self.remote {
            args.push(remote.clone());
            if let Some(ref branch) = self.branch {
                args.push(branch.clone());
            }
        }
        args
    }
}

#[async_trait]
impl RepoSync for GitPull {
    fn name(&self) -> &str {
        "git-pull"
    }

    async fn sync(&self) -> Result<SyncReport> {
        let args = self.args();
        debug!(repo_dir = %self.repo_dir.display(), ?args, "running git");

        let output = tokio::process::Command::new("git")
            .args(&args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| RunhookError::Sync(format!("failed to execute git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), stderr = %stderr, "git pull failed");
            return Err(RunhookError::Sync(format!(
                "git pull exited with {:?}: {}",
                output.status.code(),
                stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(repo_dir = %self.repo_dir.display(), output = %stdout, "git pull completed");
        Ok(SyncReport { output: stdout })
    }
}
