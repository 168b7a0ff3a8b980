//! OpenAI HTTP client for chat completions and realtime sessions.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::prompts::{VISION_SYSTEM_PROMPT, VISION_USER_PROMPT};
use super::provider::{ChatMessage, ChatResponder, SessionBroker, SessionRequest, VisionAnalyzer};
use crate::config::OpenAiSettings;
use crate::error::LlmError;

const PROVIDER: &str = "openai";

/// Upper bound on tokens for the card completion.
const VISION_MAX_TOKENS: u32 = 500;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Thin client over the OpenAI REST API.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    vision_model: String,
    chat_model: String,
    request_timeout: Option<Duration>,
    session_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings, session_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            vision_model: settings.vision_model.clone(),
            chat_model: settings.chat_model.clone(),
            request_timeout: settings.request_timeout,
            session_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or_else(|| LlmError::MissingCredentials {
                provider: PROVIDER.to_string(),
            })
    }

    /// POST `body` to `path` and return the decoded JSON response.
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value, LlmError> {
        let mut request: RequestBuilder = self
            .client
            .post(self.url(path))
            .bearer_auth(self.api_key()?)
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| transport_error(e, timeout))?;
        let response = check_status(response).await?;
        response.json::<Value>().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: format!("response body is not JSON: {e}"),
        })
    }

    async fn chat_completion(&self, body: Value) -> Result<Option<String>, LlmError> {
        let response = self
            .post_json("chat/completions", &body, self.request_timeout)
            .await?;
        Ok(response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string))
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiClient {
    async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<String, LlmError> {
        info!(
            model = %self.vision_model,
            bytes = image.len(),
            "Sending snapshot for analysis"
        );
        let data_url = format!("data:{mime_type};base64,{}", BASE64.encode(image));
        let body = json!({
            "model": self.vision_model,
            "max_tokens": VISION_MAX_TOKENS,
            "messages": [
                { "role": "system", "content": VISION_SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": VISION_USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        });

        // Empty content is left for the normalizer's fallback card.
        let content = self.chat_completion(body).await?.unwrap_or_default();
        debug!(chars = content.len(), "Vision completion received");
        Ok(content)
    }
}

#[async_trait]
impl ChatResponder for OpenAiClient {
    async fn respond(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let body = json!({
            "model": self.chat_model,
            "messages": messages,
        });
        self.chat_completion(body)
            .await?
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "completion has no message content".to_string(),
            })
    }
}

#[async_trait]
impl SessionBroker for OpenAiClient {
    async fn create_session(&self, request: SessionRequest) -> Result<Value, LlmError> {
        info!(
            model = %request.model,
            voice = %request.voice,
            "Creating realtime session"
        );
        let body = serde_json::to_value(&request)?;
        self.post_json("realtime/sessions", &body, Some(self.session_timeout))
            .await
    }
}

fn transport_error(e: reqwest::Error, timeout: Option<Duration>) -> LlmError {
    match timeout {
        Some(timeout) if e.is_timeout() => LlmError::Timeout {
            provider: PROVIDER.to_string(),
            timeout,
        },
        _ => LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        },
    }
}

async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::RequestFailed {
        provider: PROVIDER.to_string(),
        reason: format!("HTTP {status}: {}", truncate(&body, MAX_ERROR_BODY)),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}…")
    }
}
