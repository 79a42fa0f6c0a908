//! HTTP client for the external summarization collaborator.
//!
//! One call per summarization round: POST `{base}/summarize` with the recent
//! conversation and the previous memory folded into the instruction prompt.
//! The credential travels in a `Proxy-Authorization` bearer header; the
//! collaborator owns the actual model call.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use tether_core::message::Role;

use crate::errors::{Result, SummaryError};

/// Upper bound requested for the generated summary, in tokens.
const MAX_SUMMARY_LENGTH: u32 = 1024;

/// Request timeout. Summarization is a slow model call, not a health check.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How much of an error body to keep for logging.
const ERROR_BODY_LIMIT: usize = 500;

/// One conversation turn as presented to the collaborator.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryTurn {
    /// Turn attribution.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    conversation_history: &'a [HistoryTurn],
    parameters: SummarizeParameters,
}

#[derive(Serialize)]
struct SummarizeParameters {
    max_length: u32,
    summarize_prompt: String,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    #[serde(default)]
    summary: Vec<String>,
}

/// Client for the summarization endpoint.
#[derive(Clone)]
pub struct SummarizeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SummarizeClient {
    /// Create a client against `base_url` (scheme included, no trailing
    /// slash) using `api_key` as the bearer credential.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Summarize `history` (oldest-first) given the previous memory.
    ///
    /// Returns the summary parts joined with single spaces. An empty or
    /// whitespace-only result is an error: the caller stores nothing.
    pub async fn summarize(&self, history: &[HistoryTurn], last_memory: &str) -> Result<String> {
        let request = SummarizeRequest {
            conversation_history: history,
            parameters: SummarizeParameters {
                max_length: MAX_SUMMARY_LENGTH,
                summarize_prompt: summarize_prompt(last_memory),
            },
        };

        let response = self
            .http
            .post(format!("{}/summarize", self.base_url))
            .header("Proxy-Authorization", format!("Bearer {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SummarizeResponse = response.json().await?;
        let summary = parsed.summary.join(" ");
        if summary.trim().is_empty() {
            return Err(SummaryError::EmptySummary);
        }
        debug!(chars = summary.len(), "summary generated");
        Ok(summary)
    }
}

/// The fixed instruction, carrying the previous memory for continuity.
fn summarize_prompt(last_memory: &str) -> String {
    format!(
        "Previous memory: {last_memory}. Summarize the conversation above \
         into a long-term memory for the client to keep."
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn history() -> Vec<HistoryTurn> {
        vec![
            HistoryTurn {
                role: Role::User,
                content: "hello there".into(),
            },
            HistoryTurn {
                role: Role::Assistant,
                content: "hi, how can I help?".into(),
            },
        ]
    }

    #[tokio::test]
    async fn joins_summary_parts_with_spaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .and(header("Proxy-Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "conversation_history": [
                    {"role": "user", "content": "hello there"},
                    {"role": "assistant", "content": "hi, how can I help?"}
                ],
                "parameters": {"max_length": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": ["User greeted the agent.", "Agent offered help."]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SummarizeClient::new(server.uri(), "sk-test");
        let summary = client.summarize(&history(), "").await.unwrap();
        assert_eq!(summary, "User greeted the agent. Agent offered help.");
    }

    #[tokio::test]
    async fn previous_memory_is_folded_into_the_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .and(body_partial_json(json!({
                "parameters": {
                    "summarize_prompt": summarize_prompt("they like tea")
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"summary": ["ok"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SummarizeClient::new(server.uri(), "sk-test");
        client.summarize(&history(), "they like tea").await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = SummarizeClient::new(server.uri(), "sk-test");
        let err = client.summarize(&history(), "").await.unwrap_err();
        match err {
            SummaryError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Status, got {other}"),
        }
    }

    #[tokio::test]
    async fn empty_summary_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": []})))
            .mount(&server)
            .await;

        let client = SummarizeClient::new(server.uri(), "sk-test");
        let err = client.summarize(&history(), "").await.unwrap_err();
        assert!(matches!(err, SummaryError::EmptySummary));
    }

    #[tokio::test]
    async fn missing_summary_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = SummarizeClient::new(server.uri(), "sk-test");
        let err = client.summarize(&history(), "").await.unwrap_err();
        assert!(matches!(err, SummaryError::EmptySummary));
    }
}
