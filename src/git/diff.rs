//! Staged diff retrieval.

use std::path::Path;

use crate::error::DiffError;

use super::cli::run_git;

/// Return the diff of the index against HEAD for the working tree at `repo_path`.
///
/// `--no-color` and `--no-ext-diff` keep user configuration from leaking
/// escape sequences or external diff tool output into the text. An empty
/// string is a valid result and means nothing is staged.
pub async fn staged_diff(repo_path: &Path) -> Result<String, DiffError> {
    run_git(
        repo_path,
        &["diff", "--staged", "--no-color", "--no-ext-diff"],
        None,
    )
    .await
    .map_err(|reason| DiffError::Unavailable {
        path: repo_path.to_path_buf(),
        reason,
    })
}
