//! Minimal OpenAI Responses API client.
//!
//! This crate provides a focused client for the `/responses` endpoint:
//! - A single free-text input per request
//! - An output token cap
//! - Access to both the top-level `output_text` convenience field and the
//!   structured `output` list

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_OUTPUT_TOKENS: usize = 400;

/// Errors that can occur when using the OpenAI client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAi {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    ///
    /// `OPENAI_BASE_URL` overrides the endpoint when set.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            client = client.with_base_url(base_url);
        }
        Ok(client)
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different API base (proxies, compatible servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The model used when a request does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request);
        let headers = self.build_headers()?;

        tracing::debug!(
            model = %api_request.model,
            input_chars = api_request.input.chars().count(),
            max_output_tokens = api_request.max_output_tokens,
            "sending responses request"
        );

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(api_response.into())
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            input: request.input.clone(),
            max_output_tokens: request.max_output_tokens,
            temperature: request.temperature,
        }
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A request to the Responses endpoint.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub input: String,
    pub max_output_tokens: usize,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with a free-text input.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            model: None,
            input: input.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }
}

/// A response from the Responses endpoint.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    /// Aggregated text, when the server provides it.
    pub output_text: Option<String>,
    pub output: Vec<OutputItem>,
    pub usage: Option<Usage>,
}

impl Response {
    /// The top-level `output_text` field, trimmed. Empty when absent.
    pub fn output_text(&self) -> &str {
        self.output_text.as_deref().map(str::trim).unwrap_or("")
    }

    /// The first text part found in the structured output list, trimmed.
    pub fn first_output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .find_map(|part| part.text.as_deref())
            .map(str::trim)
    }
}

/// One item of the structured output list.
#[derive(Debug, Clone)]
pub struct OutputItem {
    /// Item type, e.g. `message` or `reasoning`.
    pub kind: String,
    pub content: Vec<ContentPart>,
}

/// A typed part inside an output item.
#[derive(Debug, Clone)]
pub struct ContentPart {
    /// Part type, e.g. `output_text` or `refusal`.
    pub kind: String,
    pub text: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    input: String,
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ApiOutputItem>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiOutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<ApiContentPart>,
}

#[derive(Debug, Deserialize)]
struct ApiContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: usize,
    #[serde(default)]
    output_tokens: usize,
}

impl From<ApiResponse> for Response {
    fn from(api: ApiResponse) -> Self {
        Self {
            id: api.id,
            model: api.model,
            output_text: api.output_text,
            output: api
                .output
                .into_iter()
                .map(|item| OutputItem {
                    kind: item.kind,
                    content: item
                        .content
                        .into_iter()
                        .map(|part| ContentPart {
                            kind: part.kind,
                            text: part.text,
                        })
                        .collect(),
                })
                .collect(),
            usage: api.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Response {
        let api: ApiResponse = serde_json::from_str(body).unwrap();
        api.into()
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAi::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);
    }

    #[test]
    fn test_client_with_model_and_base_url() {
        let client = OpenAi::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new("안녕")
            .with_max_output_tokens(300)
            .with_temperature(3.5);

        assert_eq!(request.input, "안녕");
        assert_eq!(request.max_output_tokens, 300);
        assert_eq!(request.temperature, Some(2.0));
        assert!(request.model.is_none());
    }

    #[test]
    fn test_api_request_uses_client_model_by_default() {
        let client = OpenAi::new("k").with_model("gpt-4o");
        let api = client.build_api_request(&Request::new("hi"));
        assert_eq!(api.model, "gpt-4o");

        let api = client.build_api_request(&Request::new("hi").with_model("o3"));
        assert_eq!(api.model, "o3");
    }

    #[test]
    fn test_api_request_serialization() {
        let client = OpenAi::new("k");
        let api = client.build_api_request(&Request::new("hello").with_max_output_tokens(300));
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["input"], "hello");
        assert_eq!(json["max_output_tokens"], 300);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_headers_carry_bearer_token() {
        let client = OpenAi::new("sk-test");
        let headers = client.build_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let client = OpenAi::new("bad\nkey");
        assert!(matches!(client.build_headers(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_structured_output() {
        let response = parse(
            r#"{
                "id": "resp_1",
                "model": "gpt-4o-mini",
                "output": [
                    {"type": "message", "role": "assistant", "content": [
                        {"type": "output_text", "text": "  옛날에 토끼가 살았어요.  ", "annotations": []}
                    ]}
                ],
                "usage": {"input_tokens": 10, "output_tokens": 20, "total_tokens": 30}
            }"#,
        );

        assert_eq!(response.id, "resp_1");
        assert_eq!(response.output_text(), "");
        assert_eq!(response.first_output_text(), Some("옛날에 토끼가 살았어요."));
        assert_eq!(response.usage.unwrap().output_tokens, 20);
    }

    #[test]
    fn test_output_text_wins_when_present() {
        let response = parse(
            r#"{
                "id": "resp_2",
                "model": "gpt-4o-mini",
                "output_text": "primary",
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "secondary"}]}]
            }"#,
        );
        assert_eq!(response.output_text(), "primary");
        assert_eq!(response.first_output_text(), Some("secondary"));
    }

    #[test]
    fn test_skips_items_without_text() {
        let response = parse(
            r#"{
                "output": [
                    {"type": "reasoning", "summary": []},
                    {"type": "message", "content": [{"type": "output_text", "text": "found"}]}
                ]
            }"#,
        );
        assert_eq!(response.first_output_text(), Some("found"));
    }

    #[test]
    fn test_empty_response() {
        let response = parse(r#"{"id": "resp_3", "output": []}"#);
        assert_eq!(response.output_text(), "");
        assert!(response.first_output_text().is_none());
    }
}
