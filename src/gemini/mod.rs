//! Commit message generation through Google Gemini.

mod client;

use async_trait::async_trait;

use crate::error::GenerateError;

pub use client::{DEFAULT_BASE_URL, GeminiClient, MODEL};

/// A text generation service that drafts commit messages.
///
/// The returned text is untrusted model output and must go through
/// [`crate::commit::clean`] before it is used.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError>;
}
