//! Version-control port and its git adapter.
//!
//! The orchestrator only talks to [`VcsPort`]. [`GitCli`] implements it by
//! reading status through git2 and shelling out to the system `git` binary
//! for the staged diff and the commit, so the user's own git config, hooks
//! and signing setup apply exactly as they would on the command line.

pub mod commit;
pub mod diff;
pub mod status;

mod cli;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::commit::CommitMessage;
use crate::error::{CommitError, DiffError, StatusError};

pub use cli::check_git_installed;
pub use commit::commit_staged;
pub use diff::staged_diff;
pub use status::{ChangeStatus, FileChange, RepoSnapshot, read_snapshot};

/// Identity of a repository: the root of its working tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(PathBuf);

impl RepoId {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    pub fn root(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// The capability set the orchestrator needs from version control.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsPort: Send + Sync {
    /// Staged and unstaged change lists of the working tree at `root`.
    async fn snapshot(&self, root: &Path) -> Result<RepoSnapshot, StatusError>;

    /// Textual diff of the index against HEAD.
    async fn staged_diff(&self, root: &Path) -> Result<String, DiffError>;

    /// Commit everything currently staged with `message`.
    async fn commit(&self, root: &Path, message: CommitMessage) -> Result<(), CommitError>;
}

/// [`VcsPort`] backed by git2 and the system `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

#[async_trait]
impl VcsPort for GitCli {
    async fn snapshot(&self, root: &Path) -> Result<RepoSnapshot, StatusError> {
        read_snapshot(root)
    }

    async fn staged_diff(&self, root: &Path) -> Result<String, DiffError> {
        staged_diff(root).await
    }

    async fn commit(&self, root: &Path, message: CommitMessage) -> Result<(), CommitError> {
        commit_staged(root, message).await
    }
}
