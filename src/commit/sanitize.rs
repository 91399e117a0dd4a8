//! Reduction of free-form model output to a commit message.
//!
//! The model is told to answer with the message only, but answers still
//! arrive wrapped in code fences, decorated with markdown, or framed by a
//! sentence about the message. [`clean`] strips all of that line by line and
//! rejects whatever is left if it cannot stand as a commit message.
//!
//! Blank lines in the model output are kept as paragraph separators (at most
//! one in a row). Lines that are removed, or that become empty once their
//! decoration is stripped, disappear without leaving a blank behind.

use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

use super::message::CommitMessage;

/// Minimum length, in characters, of both the message and its subject.
const MIN_LENGTH: usize = 3;

/// Tokens that are formatting residue when they make up a whole line.
const FENCE_TOKENS: &[&str] = &["```", "'''", "`"];

/// Line openings the model uses when talking about the message instead of
/// writing it ("以下が…", "この変更は…", "Here is…").
const PREAMBLE_PREFIXES: &[&str] = &[
    "以下",
    "上記",
    "この",
    "コミットメッセージ",
    "生成",
    "作成",
    "変更",
    "について",
];

const PREAMBLE_PREFIXES_EN: &[&str] = &[
    "below",
    "above",
    "here is",
    "here's",
    "this commit message",
    "the commit message",
    "commit message",
    "generated commit message",
    "explanation",
];

/// Tokens that mark an aside anywhere in a line ("説明: …").
const ASIDE_TOKENS: &[&str] = &["説明", "について"];

const ASIDE_TOKENS_EN: &[&str] = &["explanation:"];

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*").expect("Invalid regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(.+)\*\*$").expect("Invalid regex"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*(.+)\*$").expect("Invalid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`(.+)`$").expect("Invalid regex"));
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:コミットメッセージ|メッセージ|commit message|message)\s*[:：]\s*")
        .expect("Invalid regex")
});

/// The model output contained no usable commit message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no usable commit message in model output")]
pub struct Rejected;

enum Line {
    Blank,
    Text(String),
}

/// Sanitize raw model output into a [`CommitMessage`].
///
/// Deterministic and idempotent: cleaning the text of an accepted message
/// yields the same message.
pub fn clean(raw: &str) -> Result<CommitMessage, Rejected> {
    let mut lines: Vec<String> = Vec::new();

    for raw_line in raw.trim().lines() {
        match clean_line(raw_line) {
            Some(Line::Text(text)) => lines.push(text),
            Some(Line::Blank) => {
                if lines.last().is_some_and(|l| !l.is_empty()) {
                    lines.push(String::new());
                }
            }
            None => {}
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let text = lines.join("\n");
    if text.chars().count() < MIN_LENGTH {
        return Err(Rejected);
    }

    let subject = lines.first().map(|s| s.trim()).unwrap_or_default();
    if subject.chars().count() < MIN_LENGTH || FENCE_TOKENS.contains(&subject) {
        return Err(Rejected);
    }

    Ok(CommitMessage::new(text))
}

/// Clean one line. `None` drops it entirely.
fn clean_line(raw: &str) -> Option<Line> {
    let mut line = raw.trim().to_string();
    if line.is_empty() {
        return Some(Line::Blank);
    }

    // Unwrapping can expose another layer ("`**x**`") or turn the line into
    // a preamble, so repeat until nothing changes.
    loop {
        if is_fence(&line) {
            return None;
        }
        // A label ("コミットメッセージ：…") carries the message after it, so it
        // must come off before the line is judged as a preamble.
        let unlabelled = strip_label(&line);
        if is_preamble(&unlabelled) {
            return None;
        }
        let next = strip_label(&unwrap_markdown(&unlabelled));
        if next == line {
            break;
        }
        line = next;
    }

    (!line.is_empty()).then_some(Line::Text(line))
}

fn is_fence(line: &str) -> bool {
    FENCE_TOKENS.contains(&line) || line.starts_with("```") || line.starts_with("'''")
}

fn is_preamble(line: &str) -> bool {
    if PREAMBLE_PREFIXES.iter().any(|p| line.starts_with(p))
        || ASIDE_TOKENS.iter().any(|t| line.contains(t))
    {
        return true;
    }

    let lower = line.to_lowercase();
    PREAMBLE_PREFIXES_EN
        .iter()
        .any(|p| starts_with_word(&lower, p))
        || ASIDE_TOKENS_EN.iter().any(|t| lower.contains(t))
}

/// `text` starts with `word` and the word ends there (not "belowground").
fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
}

fn unwrap_markdown(line: &str) -> String {
    let line = HEADING.replace(line, "");
    let line = BOLD.replace(&line, "$1");
    let line = ITALIC.replace(&line, "$1");
    let line = INLINE_CODE.replace(&line, "$1");
    line.trim().to_string()
}

/// Drop a "Commit message:" style label, keeping what follows it.
fn strip_label(line: &str) -> String {
    LABEL.replace(line, "").trim().to_string()
}
