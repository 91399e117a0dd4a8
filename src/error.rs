//! Error types for aac modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading the staged/unstaged change lists.
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read status of {path}: {source}")]
    ReadStatus {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },
}

/// Errors from the staged-diff query.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Could not read staged diff in {}: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },
}

/// Errors from applying a commit.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("git commit failed in {}: {reason}", path.display())]
    Failed { path: PathBuf, reason: String },
}

/// Errors from the generation service, already mapped to the three
/// categories the orchestrator reports on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Gemini rejected the API key: {0}")]
    Auth(String),

    #[error("Gemini quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("Gemini request failed: {0}")]
    Unavailable(String),
}

/// Errors from the settings and credential files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available; set AAC_CONFIG_DIR")]
    NoConfigDir,

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Errors from the repository watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("git was not found on PATH")]
    GitNotInstalled,

    #[error("{} is not inside a git repository: {source}", path.display())]
    NotARepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("{} is a bare repository; a working tree is required", path.display())]
    BareRepository { path: PathBuf },
}

/// Every way a single generation/commit cycle can end in failure.
///
/// All variants are terminal for the cycle and none is fatal to the process.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    StatusUnavailable(#[from] StatusError),

    #[error(transparent)]
    DiffUnavailable(#[from] DiffError),

    #[error("Gemini API key is not configured. Run `aac set-api-key` or set GEMINI_API_KEY.")]
    NoApiKeyConfigured,

    #[error("Invalid Gemini API key. Check the configured key. ({0})")]
    GenAuth(String),

    #[error("Gemini usage limit reached. Wait a while and try again. ({0})")]
    GenQuota(String),

    #[error("Could not reach the generation service: {0}")]
    GenUnavailable(String),

    #[error("The model produced no usable commit message")]
    SanitizeRejected,

    #[error(transparent)]
    CommitFailed(#[from] CommitError),

    #[error("Failed to load settings: {0}")]
    Config(#[from] ConfigError),
}

impl From<GenerateError> for CycleError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Auth(msg) => CycleError::GenAuth(msg),
            GenerateError::Quota(msg) => CycleError::GenQuota(msg),
            GenerateError::Unavailable(msg) => CycleError::GenUnavailable(msg),
        }
    }
}
