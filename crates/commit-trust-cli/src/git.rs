//! Commit retrieval from a local clone through the `git` binary.

use std::path::PathBuf;
use std::process::Command;

use commit_trust_core::{CommitRecord, CommitSource, TrustError, TrustResult};
use tracing::debug;

/// Reads commits from the repository at `repo_path`.
#[derive(Debug, Clone)]
pub struct GitCommitSource {
    repo_path: PathBuf,
}

impl GitCommitSource {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn git(&self, args: &[&str]) -> TrustResult<Vec<u8>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .map_err(|e| TrustError::CommitAccess {
                message: format!("failed to run git: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => output.status.to_string(),
                text => text.to_string(),
            };
            return Err(TrustError::CommitAccess {
                message: format!(
                    "git {} failed: {}",
                    args.first().copied().unwrap_or_default(),
                    detail
                ),
            });
        }
        Ok(output.stdout)
    }

    fn resolve(&self, reference: &str) -> TrustResult<String> {
        if reference.is_empty() || reference.starts_with('-') {
            return Err(TrustError::CommitAccess {
                message: format!("invalid commit reference: {:?}", reference),
            });
        }

        let spec = format!("{}^{{commit}}", reference);
        let stdout = self.git(&["rev-parse", "--verify", "--quiet", &spec])?;
        let hash = String::from_utf8_lossy(&stdout).trim().to_string();
        if hash.is_empty() {
            return Err(TrustError::CommitAccess {
                message: format!("reference {:?} did not resolve to a commit", reference),
            });
        }
        Ok(hash)
    }
}

impl CommitSource for GitCommitSource {
    fn get_commit(&self, reference: &str) -> TrustResult<CommitRecord> {
        let hash = self.resolve(reference)?;
        debug!(reference, %hash, path = %self.repo_path.display(), "reading commit");

        let raw = self.git(&["cat-file", "commit", &hash])?;
        CommitRecord::from_raw_object(&hash, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=Dev One",
                "-c",
                "user.email=dev@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_reads_head_commit() {
        if !git_available() {
            eprintln!("skipping: git not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "first"]);

        let commit = GitCommitSource::new(dir.path()).get_commit("HEAD").unwrap();

        assert_eq!(commit.hash.len(), 40);
        assert_eq!(commit.committer.email, "dev@example.com");
        assert_eq!(commit.committer.name, "Dev One");
        assert_eq!(commit.message, "first\n");
        assert!(!commit.is_signed());
        assert!(commit.parent_hashes.is_empty());
    }

    #[test]
    fn test_unknown_ref_is_commit_access_error() {
        if !git_available() {
            eprintln!("skipping: git not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "first"]);

        let result = GitCommitSource::new(dir.path()).get_commit("does-not-exist");
        assert!(matches!(result, Err(TrustError::CommitAccess { .. })));
    }

    #[test]
    fn test_option_like_ref_rejected() {
        let result = GitCommitSource::new(".").get_commit("--output=/tmp/x");
        assert!(matches!(result, Err(TrustError::CommitAccess { .. })));
    }
}
