//! Turning a staged diff into a commit message: prompt in, sanitized text out.

pub mod message;
pub mod prompt;
pub mod sanitize;

pub use message::CommitMessage;
pub use prompt::{DEFAULT_PROMPT, build_prompt};
pub use sanitize::{Rejected, clean};
