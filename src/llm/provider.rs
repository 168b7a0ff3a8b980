//! Collaborator traits for the external model services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A plain-text chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of a realtime session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    pub model: String,
    pub voice: String,
    pub instructions: String,
}

/// Describes a site photo. Returns the raw completion text.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<String, LlmError>;
}

/// Produces a conversational reply.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError>;
}

/// Mints ephemeral realtime voice sessions.
#[async_trait]
pub trait SessionBroker: Send + Sync {
    /// Returns the provider's session JSON untouched.
    async fn create_session(&self, request: SessionRequest) -> Result<serde_json::Value, LlmError>;
}
