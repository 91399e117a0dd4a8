//! The set of repositories being watched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::error::WatchError;
use crate::git::RepoId;

/// A watched working tree and the index file whose changes signal staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRepo {
    pub id: RepoId,
    pub index_path: PathBuf,
}

/// Repositories keyed by working tree root. Adding the same repository twice,
/// through any path inside it, keeps one entry.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    repos: BTreeMap<RepoId, WatchedRepo>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every repository containing one of `paths`. Paths that are
    /// not inside a usable repository are returned as errors and skipped.
    pub fn discover(paths: &[PathBuf]) -> (Self, Vec<WatchError>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();
        for path in paths {
            if let Err(e) = registry.add(path) {
                errors.push(e);
            }
        }
        (registry, errors)
    }

    /// Register the repository that contains `path`.
    pub fn add(&mut self, path: &Path) -> Result<RepoId, WatchError> {
        let watched = resolve(path)?;
        let id = watched.id.clone();
        debug!("Watching {} (index {})", id, watched.index_path.display());
        self.repos.entry(id.clone()).or_insert(watched);
        Ok(id)
    }

    pub fn get(&self, id: &RepoId) -> Option<&WatchedRepo> {
        self.repos.get(id)
    }

    pub fn repos(&self) -> impl Iterator<Item = &WatchedRepo> {
        self.repos.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RepoId> {
        self.repos.keys()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Find the repository containing `path` and describe how to watch it.
pub fn resolve(path: &Path) -> Result<WatchedRepo, WatchError> {
    let repo = Repository::discover(path).map_err(|source| WatchError::NotARepository {
        path: path.to_path_buf(),
        source,
    })?;

    let workdir = repo.workdir().ok_or_else(|| WatchError::BareRepository {
        path: path.to_path_buf(),
    })?;
    // git2 reports the working tree with a trailing separator.
    let root = workdir
        .canonicalize()
        .unwrap_or_else(|_| workdir.to_path_buf());

    Ok(WatchedRepo {
        id: RepoId::new(root),
        index_path: repo.path().join("index"),
    })
}
