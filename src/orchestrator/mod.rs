//! The change-to-commit cycle.
//!
//! One call to [`ChangeOrchestrator::handle_change`] is one reaction to a
//! repository change notification:
//!
//! 1. Read the staged list; nothing staged ends the cycle silently.
//! 2. Take the repository's processing latch, or drop the notification.
//! 3. Snapshot the settings, fetch the staged diff and build the prompt.
//! 4. Generate, sanitize, then commit directly or after the user approves.
//!
//! The latch is released however the cycle ends, and every end is reported
//! as exactly one [`CycleOutcome`].

pub mod approval;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::commit::{CommitMessage, build_prompt, clean};
use crate::config::{ConfigStore, GenerationConfig, SecretStore};
use crate::error::CycleError;
use crate::gemini::MessageGenerator;
use crate::git::{RepoId, VcsPort};
use crate::guard::ProcessingGuard;

pub use approval::{Approval, Approver, PromptApprover};

/// Where a repository currently is in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// The latch is held and the message is being produced or committed.
    Guarded,
    /// A message is waiting for the user's answer. The latch stays held.
    AwaitingApproval,
}

/// How one cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Another cycle for the repository was in flight; nothing was done.
    Busy,
    NothingStaged,
    /// Staged entries existed but their diff was blank.
    EmptyDiff,
    /// A commit was created with this message.
    Committed(String),
    /// The user declined or dismissed the proposed message.
    Declined,
    Failed(CycleError),
}

impl CycleOutcome {
    /// The one line to show the user, if the outcome warrants one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CycleOutcome::Busy | CycleOutcome::NothingStaged | CycleOutcome::EmptyDiff => None,
            CycleOutcome::Committed(message) => Some(format!(
                "Committed: {}",
                message.lines().next().unwrap_or_default()
            )),
            CycleOutcome::Declined => Some("Commit cancelled.".to_string()),
            CycleOutcome::Failed(err) => Some(format!("aac: {}", err)),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed(_))
    }
}

/// Drives generation/commit cycles for any number of repositories.
pub struct ChangeOrchestrator<V, G, A> {
    vcs: V,
    generator: G,
    approver: A,
    config: Arc<dyn ConfigStore>,
    secrets: Arc<dyn SecretStore>,
    guard: ProcessingGuard,
    phases: Mutex<HashMap<RepoId, Phase>>,
}

impl<V, G, A> ChangeOrchestrator<V, G, A>
where
    V: VcsPort,
    G: MessageGenerator,
    A: Approver,
{
    pub fn new(
        vcs: V,
        generator: G,
        approver: A,
        config: Arc<dyn ConfigStore>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            vcs,
            generator,
            approver,
            config,
            secrets,
            guard: ProcessingGuard::new(),
            phases: Mutex::new(HashMap::new()),
        }
    }

    /// Register a repository so it starts out `Idle`.
    pub fn observe(&self, repo: &RepoId) {
        self.guard.observe(repo);
        self.set_phase(repo, Phase::Idle);
    }

    pub fn phase(&self, repo: &RepoId) -> Phase {
        self.lock_phases()
            .get(repo)
            .copied()
            .unwrap_or(Phase::Idle)
    }

    /// React to a change notification for `repo`.
    pub async fn handle_change(&self, repo: &RepoId) -> CycleOutcome {
        self.guard.observe(repo);

        let snapshot = match self.vcs.snapshot(repo.root()).await {
            Ok(snapshot) => snapshot,
            Err(e) => return CycleOutcome::Failed(e.into()),
        };
        if !snapshot.has_staged() {
            return CycleOutcome::NothingStaged;
        }

        if !self.guard.try_acquire(repo) {
            debug!("{} is already being processed, dropping notification", repo);
            return CycleOutcome::Busy;
        }
        let _lease = Lease { owner: self, repo };
        self.set_phase(repo, Phase::Guarded);
        debug!("{}: {} staged file(s)", repo, snapshot.staged.len());

        let outcome = match self.run_cycle(repo).await {
            Ok(outcome) => outcome,
            Err(e) => CycleOutcome::Failed(e),
        };

        match &outcome {
            CycleOutcome::Failed(e) => warn!("{}: cycle failed: {}", repo, e),
            other => debug!("{}: cycle finished: {:?}", repo, other),
        }
        outcome
    }

    async fn run_cycle(&self, repo: &RepoId) -> Result<CycleOutcome, CycleError> {
        let config = GenerationConfig::load(self.config.as_ref(), self.secrets.as_ref())?;
        let api_key = config.api_key.ok_or(CycleError::NoApiKeyConfigured)?;

        let diff = self.vcs.staged_diff(repo.root()).await?;
        if diff.trim().is_empty() {
            return Ok(CycleOutcome::EmptyDiff);
        }

        let prompt = build_prompt(&config.custom_prompt, &diff);
        let raw = self.generator.generate(api_key.expose(), &prompt).await?;
        let message = clean(&raw).map_err(|_| CycleError::SanitizeRejected)?;
        debug!("{}: generated subject: {}", repo, message.subject());

        if !config.auto_commit_enabled {
            self.set_phase(repo, Phase::AwaitingApproval);
            let approval = self.approver.confirm(repo, &message).await;
            self.set_phase(repo, Phase::Guarded);
            if approval == Approval::Decline {
                info!("{}: commit declined", repo);
                return Ok(CycleOutcome::Declined);
            }
        }

        self.commit(repo, message).await
    }

    async fn commit(&self, repo: &RepoId, message: CommitMessage) -> Result<CycleOutcome, CycleError> {
        let text = message.as_str().to_string();
        self.vcs.commit(repo.root(), message).await?;
        Ok(CycleOutcome::Committed(text))
    }

    fn set_phase(&self, repo: &RepoId, phase: Phase) {
        self.lock_phases().insert(repo.clone(), phase);
    }

    fn lock_phases(&self) -> std::sync::MutexGuard<'_, HashMap<RepoId, Phase>> {
        self.phases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held for the duration of a guarded cycle. Dropping it releases the latch
/// and returns the repository to `Idle`, including when the cycle future is
/// dropped part way.
struct Lease<'a, V, G, A>
where
    V: VcsPort,
    G: MessageGenerator,
    A: Approver,
{
    owner: &'a ChangeOrchestrator<V, G, A>,
    repo: &'a RepoId,
}

impl<V, G, A> Drop for Lease<'_, V, G, A>
where
    V: VcsPort,
    G: MessageGenerator,
    A: Approver,
{
    fn drop(&mut self) {
        self.owner.set_phase(self.repo, Phase::Idle);
        self.owner.guard.release(self.repo);
    }
}
