//! Gemini `generateContent` REST client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GenerateError;

use super::MessageGenerator;

/// Model used for every request.
pub const MODEL: &str = "gemini-2.0-flash-001";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default deadline for one generation request.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the deadline (seconds).
const TIMEOUT_ENV_VAR: &str = "AAC_GENERATE_TIMEOUT";

/// Get the generation deadline from the environment or the default.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// [`MessageGenerator`] backed by the Gemini API. No retries: every failure
/// is reported to the caller as-is.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: get_timeout(),
        }
    }

    /// Point the client at another endpoint (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, MODEL)
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_response(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Unavailable(format!("Malformed response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerateError::Unavailable(
                "Response contained no text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl MessageGenerator for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        debug!("Requesting commit message from {} ({} bytes)", MODEL, prompt.len());

        match tokio::time::timeout(self.timeout, self.request(api_key, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Unavailable(format!(
                "No response within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Classify a non-success response into auth, quota or anything else.
fn parse_error_response(status: StatusCode, body: &str) -> GenerateError {
    let detail = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => ErrorBody::default(),
    };
    let message = if detail.message.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        detail.message.clone()
    };

    let reasons: Vec<&str> = detail
        .details
        .iter()
        .filter_map(|d| d.reason.as_deref())
        .collect();
    let has = |token: &str| {
        detail.status.as_deref() == Some(token)
            || reasons.contains(&token)
            || body.contains(token)
    };

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || has("UNAUTHENTICATED")
        || has("PERMISSION_DENIED")
        || has("API_KEY_INVALID")
    {
        return GenerateError::Auth(message);
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || has("RESOURCE_EXHAUSTED")
        || has("QUOTA_EXCEEDED")
    {
        return GenerateError::Quota(message);
    }

    GenerateError::Unavailable(message)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}
