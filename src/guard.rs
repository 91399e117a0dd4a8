//! Per-repository single-flight latch.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::git::RepoId;

/// One latch per repository, set while a generation/commit cycle runs.
///
/// Latches exist from the first time a repository is observed and are never
/// persisted. Acquisition is a test-and-set under one lock, so two cycles for
/// the same repository cannot both get through.
#[derive(Debug, Default)]
pub struct ProcessingGuard {
    latches: Mutex<HashMap<RepoId, bool>>,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `repo` with an unheld latch. No effect if already known.
    pub fn observe(&self, repo: &RepoId) {
        self.lock().entry(repo.clone()).or_insert(false);
    }

    /// Take the latch for `repo`. Returns `false`, changing nothing, if a
    /// cycle already holds it.
    pub fn try_acquire(&self, repo: &RepoId) -> bool {
        let mut latches = self.lock();
        let held = latches.entry(repo.clone()).or_insert(false);
        if *held {
            return false;
        }
        *held = true;
        true
    }

    /// Clear the latch for `repo`. Releasing a free latch is a no-op.
    pub fn release(&self, repo: &RepoId) {
        if let Some(held) = self.lock().get_mut(repo) {
            *held = false;
        }
    }

    pub fn is_held(&self, repo: &RepoId) -> bool {
        self.lock().get(repo).copied().unwrap_or(false)
    }

    // A panic while holding the lock cannot leave the map inconsistent, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<RepoId, bool>> {
        self.latches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
