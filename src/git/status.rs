//! Staged and unstaged change lists read through git2.

use std::fmt;
use std::path::Path;

use git2::{Repository, Status, StatusOptions};

use crate::error::StatusError;

/// Kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeStatus::Added => write!(f, "A"),
            ChangeStatus::Modified => write!(f, "M"),
            ChangeStatus::Deleted => write!(f, "D"),
            ChangeStatus::Renamed => write!(f, "R"),
            ChangeStatus::TypeChange => write!(f, "T"),
        }
    }
}

/// A changed path and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
}

/// Point-in-time view of a working tree's pending changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub staged: Vec<FileChange>,
    pub unstaged: Vec<FileChange>,
}

impl RepoSnapshot {
    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }
}

/// Read the staged (index vs HEAD) and unstaged (workdir vs index, including
/// untracked) changes of the repository whose working tree is `root`.
pub fn read_snapshot(root: &Path) -> Result<RepoSnapshot, StatusError> {
    let repo = Repository::open(root).map_err(|source| StatusError::OpenRepository {
        path: root.to_path_buf(),
        source,
    })?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo
        .statuses(Some(&mut opts))
        .map_err(|source| StatusError::ReadStatus {
            path: root.to_path_buf(),
            source,
        })?;

    let mut snapshot = RepoSnapshot::default();

    for entry in statuses.iter() {
        let status = entry.status();

        if let Some(kind) = staged_kind(status) {
            let path = entry
                .head_to_index()
                .and_then(|d| d.new_file().path().or(d.old_file().path()))
                .map(|p| p.to_string_lossy().to_string())
                .or_else(|| entry.path().map(str::to_string));
            if let Some(path) = path {
                snapshot.staged.push(FileChange { path, status: kind });
            }
        }

        if let Some(kind) = unstaged_kind(status)
            && let Some(path) = entry.path()
        {
            snapshot.unstaged.push(FileChange {
                path: path.to_string(),
                status: kind,
            });
        }
    }

    Ok(snapshot)
}

fn staged_kind(status: Status) -> Option<ChangeStatus> {
    if status.is_index_new() {
        Some(ChangeStatus::Added)
    } else if status.is_index_renamed() {
        Some(ChangeStatus::Renamed)
    } else if status.is_index_deleted() {
        Some(ChangeStatus::Deleted)
    } else if status.is_index_typechange() {
        Some(ChangeStatus::TypeChange)
    } else if status.is_index_modified() {
        Some(ChangeStatus::Modified)
    } else {
        None
    }
}

fn unstaged_kind(status: Status) -> Option<ChangeStatus> {
    if status.is_wt_new() {
        Some(ChangeStatus::Added)
    } else if status.is_wt_renamed() {
        Some(ChangeStatus::Renamed)
    } else if status.is_wt_deleted() {
        Some(ChangeStatus::Deleted)
    } else if status.is_wt_typechange() {
        Some(ChangeStatus::TypeChange)
    } else if status.is_wt_modified() {
        Some(ChangeStatus::Modified)
    } else {
        None
    }
}
