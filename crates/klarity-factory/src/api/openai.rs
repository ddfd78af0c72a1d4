//! Async client for the OpenAI chat completions API.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::usage::TokenUsage;
use super::{ModelFuture, ModelReply, SectionModel};
use crate::error::ModelError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for section generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body.
#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// A single-user-message request constrained to a JSON object reply.
    pub fn json_object(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature,
            response_format: Some(ResponseFormat {
                fmt_type: ResponseFormatType::JsonObject,
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_object")]
    JsonObject,
}

#[derive(Serialize, Debug, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorBody>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
}

#[derive(Deserialize, Debug, Clone)]
struct UsageInfo {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// Parsed result of [`OpenAiClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// The reply hit the token limit, so its JSON is likely cut off.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// Map a non-success HTTP status onto a [`ModelError`].
///
/// Uses the API's `error.message` when the body carries one.
pub fn error_for_status(status: u16, body: &str) -> ModelError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    match status {
        401 => ModelError::Authentication(message),
        429 => ModelError::RateLimited(message),
        _ => ModelError::Api { status, message },
    }
}

fn parse_completion(text: &str) -> Result<ChatCompletion, ModelError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(ModelError::Api {
            status: 200,
            message: err.message,
        });
    }

    let usage = parsed.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens.unwrap_or(0),
        completion_tokens: u.completion_tokens.unwrap_or(0),
    });

    let choice = parsed.choices.and_then(|c| c.into_iter().next());
    Ok(match choice {
        Some(c) => ChatCompletion {
            content: c.message.content,
            usage,
            finish_reason: c.finish_reason,
        },
        None => ChatCompletion {
            content: None,
            usage,
            finish_reason: None,
        },
    })
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for OpenAI-compatible chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Create a client for [`DEFAULT_MODEL`] on the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("klarity-factory/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ModelError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, ModelError> {
        debug!(
            "LLM request: model={}, messages={}, temp={}",
            body.model,
            body.messages.len(),
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ModelError::Request(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            let err = error_for_status(status.as_u16(), &text);
            warn!("LLM request failed: {err}");
            return Err(err);
        }

        let completion = parse_completion(&text)?;
        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage: prompt={}, completion={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(completion)
    }

    /// Ask for a JSON object reply to a single user prompt.
    pub async fn complete(&self, prompt: &str) -> Result<ModelReply, ModelError> {
        let body = ChatRequest::json_object(&self.model, prompt, self.temperature);
        let completion = self.chat(&body).await?;
        if completion.is_truncated() {
            warn!("Model {} stopped at the token limit; the JSON reply may be cut off", self.model);
        }
        match completion.content {
            Some(content) if !content.trim().is_empty() => Ok(ModelReply {
                content,
                usage: completion.usage,
            }),
            _ => Err(ModelError::EmptyResponse),
        }
    }
}

impl SectionModel for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete_json(&self, prompt: &str) -> ModelFuture<'_> {
        let prompt = prompt.to_string();
        Box::pin(async move { self.complete(&prompt).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_request_shape() {
        let req = ChatRequest::json_object(DEFAULT_MODEL, "hello", DEFAULT_TEMPERATURE);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn status_401_is_authentication() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        match error_for_status(401, body) {
            ModelError::Authentication(msg) => assert_eq!(msg, "Incorrect API key provided"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_429_is_rate_limit() {
        assert!(matches!(
            error_for_status(429, "slow down"),
            ModelError::RateLimited(msg) if msg == "slow down"
        ));
    }

    #[test]
    fn other_status_keeps_code_and_body() {
        match error_for_status(503, "  upstream unavailable \n") {
            ModelError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_first_choice_and_usage() {
        let text = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"type\":\"text\"}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 1200, "completion_tokens": 300, "total_tokens": 1500}
        }"#;
        let completion = parse_completion(text).unwrap();
        assert_eq!(completion.content.as_deref(), Some("{\"type\":\"text\"}"));
        assert!(!completion.is_truncated());
        let usage = completion.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 1200);
        assert_eq!(usage.completion_tokens, 300);
    }

    #[test]
    fn length_finish_reason_marks_truncation() {
        let text = r#"{"choices": [{"message": {"content": "{\"type\": \"te"}, "finish_reason": "length"}]}"#;
        assert!(parse_completion(text).unwrap().is_truncated());
    }

    #[test]
    fn error_envelope_in_success_body() {
        let err = parse_completion(r#"{"error": {"message": "model overloaded"}}"#).unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn unparseable_body_is_malformed() {
        assert!(matches!(
            parse_completion("<html>"),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn builder_overrides() {
        let client = OpenAiClient::new("sk-test")
            .unwrap()
            .with_model("gpt-4o")
            .with_temperature(0.2)
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.model_name(), "gpt-4o");
        assert!((client.temperature() - 0.2).abs() < f32::EPSILON);
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/chat/completions");
    }
}
