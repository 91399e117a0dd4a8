//! Repository watching: which repositories, when they change, and handing
//! each change to the orchestrator.

mod index;
mod registry;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::gemini::MessageGenerator;
use crate::git::VcsPort;
use crate::orchestrator::{Approver, ChangeOrchestrator, CycleOutcome};

pub use index::{ChangeEvent, DEFAULT_INTERVAL, IndexWatcher};
pub use registry::{RepositoryRegistry, WatchedRepo, resolve};

/// Run one cycle per received event until the channel closes.
///
/// Each cycle runs on its own task so a repository waiting on generation or
/// on the user never delays events for the others. Events for a repository
/// that is still busy end immediately as [`CycleOutcome::Busy`].
pub async fn dispatch<V, G, A>(
    orchestrator: Arc<ChangeOrchestrator<V, G, A>>,
    mut events: mpsc::Receiver<ChangeEvent>,
) where
    V: VcsPort + 'static,
    G: MessageGenerator + 'static,
    A: Approver + 'static,
{
    while let Some(event) = events.recv().await {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            let outcome = orchestrator.handle_change(&event.repo).await;
            report(&outcome);
        });
    }
    debug!("Change stream closed");
}

/// Print the user-facing line for `outcome`, errors to stderr.
pub fn report(outcome: &CycleOutcome) {
    if let Some(message) = outcome.user_message() {
        if outcome.is_failure() {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }
}
