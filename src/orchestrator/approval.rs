//! Asking the user whether to commit a generated message.

use async_trait::async_trait;
use dialoguer::Confirm;
use tokio::sync::Mutex;
use tracing::warn;

use crate::commit::CommitMessage;
use crate::git::RepoId;

/// The user's answer to a proposed commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approve,
    /// Declined or dismissed; both end the cycle without a commit.
    Decline,
}

/// Presents a generated message and waits for the user's answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Approver: Send + Sync {
    async fn confirm(&self, repo: &RepoId, message: &CommitMessage) -> Approval;
}

/// Terminal confirmation prompt.
///
/// Cycles for different repositories can finish generation at the same time;
/// the lock keeps their prompts from interleaving on the terminal.
#[derive(Debug, Default)]
pub struct PromptApprover {
    terminal: Mutex<()>,
}

impl PromptApprover {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Approver for PromptApprover {
    async fn confirm(&self, repo: &RepoId, message: &CommitMessage) -> Approval {
        let _terminal = self.terminal.lock().await;

        let repo = repo.to_string();
        let text = message.as_str().to_string();
        let answer = tokio::task::spawn_blocking(move || {
            println!();
            println!("Generated commit message for {}:", repo);
            println!();
            for line in text.lines() {
                println!("    {}", line);
            }
            println!();

            Confirm::new()
                .with_prompt("Commit with this message?")
                .default(true)
                .interact_opt()
        })
        .await;

        match answer {
            Ok(Ok(Some(true))) => Approval::Approve,
            Ok(Ok(_)) => Approval::Decline,
            Ok(Err(e)) => {
                warn!("Confirmation prompt failed, treating as declined: {}", e);
                Approval::Decline
            }
            Err(e) => {
                warn!("Confirmation prompt task failed, treating as declined: {}", e);
                Approval::Decline
            }
        }
    }
}
