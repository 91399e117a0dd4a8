//! Invocation of the system `git` binary.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::WatchError;

/// Check that `git` is installed and runs.
pub async fn check_git_installed() -> Result<(), WatchError> {
    if which::which("git").is_err() {
        return Err(WatchError::GitNotInstalled);
    }

    let version_check = Command::new("git")
        .arg("--version")
        .output()
        .await
        .map_err(|_| WatchError::GitNotInstalled)?;

    if !version_check.status.success() {
        return Err(WatchError::GitNotInstalled);
    }

    Ok(())
}

/// Run git in `dir`, optionally feeding `input` on stdin.
///
/// Returns stdout on success, or a one-line description of the failure
/// (spawn error, or exit code plus trimmed stderr).
pub(crate) async fn run_git(
    dir: &Path,
    args: &[&str],
    input: Option<&str>,
) -> Result<String, String> {
    debug!("git {} (in {})", args.join(" "), dir.display());

    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to run git: {e}"))?;

    if let Some(input) = input
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin
            .write_all(input.as_bytes())
            .await
            .map_err(|e| format!("failed to write to git stdin: {e}"))?;
        // Dropping stdin closes the pipe so git sees EOF.
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("failed to wait for git: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map_or("a signal".to_string(), |c| format!("code {c}"));
        return Err(format!("git exited with {}: {}", code, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
