//! Creating the commit from the staged changes.

use std::path::Path;

use tracing::info;

use crate::commit::CommitMessage;
use crate::error::CommitError;

use super::cli::run_git;

/// Commit everything currently staged in `repo_path` with `message`.
///
/// The message goes to `git commit -F -` on stdin rather than through a shell
/// string, so quotes, backslashes and `$` reach git verbatim. `--cleanup=strip`
/// is explicit so a user `commit.cleanup` setting cannot keep comment lines.
pub async fn commit_staged(repo_path: &Path, message: CommitMessage) -> Result<(), CommitError> {
    run_git(
        repo_path,
        &["commit", "--cleanup=strip", "-F", "-"],
        Some(message.as_str()),
    )
    .await
    .map_err(|reason| CommitError::Failed {
        path: repo_path.to_path_buf(),
        reason,
    })?;

    info!("Committed in {}: {}", repo_path.display(), message.subject());
    Ok(())
}
