//! Synchronous client for an OpenAI-compatible chat completions endpoint.
//!
//! One call sends a single exchange (one system message, one user message)
//! and returns the completion text. Failures are retried up to the configured
//! limit with no backoff; the final failure is returned to the caller.

use crate::config::ApiSettings;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const BODY_EXCERPT_LEN: usize = 200;

/// Client for the remote completion endpoint.
pub struct ChatClient {
    settings: ApiSettings,
    client: Client,
}

impl ChatClient {
    /// Creates a client from endpoint settings.
    #[must_use]
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    /// Returns the settings this client was built with.
    #[must_use]
    pub const fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Sends one (system, user) exchange and returns the completion text.
    ///
    /// On failure the call is repeated up to `retry_limit` additional times,
    /// each retry logged with its attempt number. No delay between attempts.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error once the retry budget is exhausted:
    /// transport failure, non-success status, or a malformed response body.
    pub fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let limit = self.settings.retry_limit;
        let mut attempt = 0;

        loop {
            match self.request(system_prompt, user_prompt) {
                Ok(content) => return Ok(content),
                Err(e) if attempt < limit => {
                    attempt += 1;
                    warn!("Retrying API call ({attempt}/{limit}) due to error: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Performs a single request attempt.
    fn request(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
        };

        debug!(
            "Sending completion request to {} for model {}",
            self.settings.base_url, self.settings.model
        );

        let response = self
            .client
            .post(&self.settings.base_url)
            .bearer_auth(&self.settings.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return match status.as_u16() {
                401 => Err(Error::Auth),
                code => Err(Error::api(code, excerpt(&body))),
            };
        }

        let completion: ChatResponse = response
            .json()
            .map_err(|e| Error::malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .ok_or_else(|| Error::malformed("response contains no message content"))
    }
}

/// Truncates a response body for error messages.
fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < BODY_EXCERPT_LEN)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &body[..cut])
    }
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

/// A single role-tagged message.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_client(server: &mockito::Server, retry_limit: usize) -> ChatClient {
        let settings = ApiSettings::new("sk-test")
            .with_base_url(format!("{}/v1/chat/completions", server.url()))
            .with_model("test-model")
            .with_retry_limit(retry_limit);
        ChatClient::new(settings)
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_complete_returns_content() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"},
                ],
            })))
            .with_status(200)
            .with_body(completion_body("severity: low"))
            .expect(1)
            .create();

        let client = test_client(&server, 3);
        let content = client.complete("sys", "usr").unwrap();

        assert_eq!(content, "severity: low");
        mock.assert();
    }

    #[test]
    fn test_failing_endpoint_exhausts_retry_budget() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("server exploded")
            .expect(4) // initial attempt + 3 retries
            .create();

        let client = test_client(&server, 3);
        let err = client.complete("sys", "usr").unwrap_err();

        assert!(matches!(err, Error::Api { status: 500, .. }));
        mock.assert();
    }

    #[test]
    fn test_success_on_second_attempt_stops_retrying() {
        let mut server = mockito::Server::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_for_body = Arc::clone(&calls);

        // First attempt gets an unparseable body, second a valid completion.
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body_from_request(move |_| {
                if calls_for_body.fetch_add(1, Ordering::SeqCst) == 0 {
                    b"not json at all".to_vec()
                } else {
                    completion_body("ok: true").into_bytes()
                }
            })
            .expect(2)
            .create();

        let client = test_client(&server, 3);
        let content = client.complete("sys", "usr").unwrap();

        assert_eq!(content, "ok: true");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        mock.assert();
    }

    #[test]
    fn test_unauthorized_maps_to_auth_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .expect(1)
            .create();

        let client = test_client(&server, 0);
        let err = client.complete("sys", "usr").unwrap_err();

        assert!(matches!(err, Error::Auth));
        mock.assert();
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create();

        let client = test_client(&server, 0);
        let err = client.complete("sys", "usr").unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let short = excerpt("tiny");
        assert_eq!(short, "tiny");

        let long = excerpt(&"x".repeat(500));
        assert!(long.len() < 500);
        assert!(long.ends_with("..."));
    }
}
