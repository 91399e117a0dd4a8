//! Change detection by polling each repository's index file.
//!
//! Staging, unstaging and committing all rewrite `.git/index`, so a change
//! in its modification time or size is the notification that the staged set
//! may have changed. Whether anything is actually staged is decided later by
//! the orchestrator.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::git::RepoId;

use super::RepositoryRegistry;

/// Default time between polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// A repository whose state may have changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub repo: RepoId,
}

/// What the index file looked like at the last poll. `None` fields mean the
/// file did not exist (a fresh repository before its first `git add`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexStamp {
    modified: Option<SystemTime>,
    len: Option<u64>,
}

impl IndexStamp {
    fn read(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) => Self {
                modified: meta.modified().ok(),
                len: Some(meta.len()),
            },
            Err(_) => Self {
                modified: None,
                len: None,
            },
        }
    }
}

/// Polls index files and reports the repositories whose index changed.
#[derive(Debug)]
pub struct IndexWatcher {
    interval: Duration,
    baselines: HashMap<RepoId, IndexStamp>,
}

impl Default for IndexWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl IndexWatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            baselines: HashMap::new(),
        }
    }

    /// Compare every index with its last stamp. The first poll of a
    /// repository only records the baseline.
    pub fn poll(&mut self, registry: &RepositoryRegistry) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for watched in registry.repos() {
            let stamp = IndexStamp::read(&watched.index_path);
            match self.baselines.insert(watched.id.clone(), stamp) {
                Some(previous) if previous != stamp => {
                    debug!("Index changed in {}", watched.id);
                    events.push(ChangeEvent {
                        repo: watched.id.clone(),
                    });
                }
                Some(_) => {}
                None => trace!("Baseline recorded for {}", watched.id),
            }
        }
        events
    }

    /// Poll until the receiving side of `events` is dropped.
    pub async fn run(mut self, registry: RepositoryRegistry, events: mpsc::Sender<ChangeEvent>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            for event in self.poll(&registry) {
                if events.send(event).await.is_err() {
                    debug!("Change receiver closed, stopping watcher");
                    return;
                }
            }
        }
    }
}
