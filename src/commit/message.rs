//! The validated commit message type.

use std::fmt;

/// A sanitized commit message.
///
/// Only [`crate::commit::clean`] constructs one, so holding a `CommitMessage`
/// means the text is non-empty and its subject line is at least three
/// characters and not a formatting artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    text: String,
}

impl CommitMessage {
    pub(crate) fn new(text: String) -> Self {
        Self { text }
    }

    /// The first line.
    pub fn subject(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }

    /// Everything after the subject, with the separating blank line removed.
    pub fn body(&self) -> Option<&str> {
        let (_, rest) = self.text.split_once('\n')?;
        let rest = rest.trim_start_matches('\n');
        (!rest.is_empty()).then_some(rest)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
