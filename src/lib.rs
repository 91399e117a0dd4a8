//! aac - watches git repositories and turns staged changes into commits with
//! messages drafted by Gemini.
//!
//! # Overview
//!
//! A change to a repository's index starts a cycle in
//! [`orchestrator::ChangeOrchestrator`]: the staged diff is sent to Gemini
//! with a prompt template, the answer is reduced to a commit message by
//! [`commit::clean`], and the staged changes are committed either right away
//! or after the user confirms.

pub mod commands;
pub mod commit;
pub mod config;
pub mod error;
pub mod gemini;
pub mod git;
pub mod guard;
pub mod orchestrator;
pub mod watch;

// Re-export commonly used types
pub use commit::CommitMessage;
pub use config::{FileSettings, GenerationConfig};
pub use error::{CommitError, ConfigError, CycleError, DiffError, GenerateError, StatusError, WatchError};
pub use gemini::{GeminiClient, MessageGenerator};
pub use git::{GitCli, RepoId, VcsPort};
pub use guard::ProcessingGuard;
pub use orchestrator::{Approval, Approver, ChangeOrchestrator, CycleOutcome, Phase, PromptApprover};
