//! LLM integration for Site Analyst.
//!
//! Three collaborators sit behind traits so handlers never talk HTTP
//! directly:
//! - **VisionAnalyzer**: site photo in, raw completion text out
//! - **ChatResponder**: typed voice prompts
//! - **SessionBroker**: ephemeral realtime voice sessions
//!
//! `OpenAiClient` implements all three over reqwest. `StubVisionAnalyzer`
//! stands in for vision when no API key is set.

pub mod openai;
pub mod prompts;
pub mod provider;
mod stub;

pub use openai::OpenAiClient;
pub use provider::*;
pub use stub::StubVisionAnalyzer;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::LlmError;

/// Collaborators wired from configuration.
pub struct Collaborators {
    pub vision: Arc<dyn VisionAnalyzer>,
    pub chat: Arc<dyn ChatResponder>,
    pub sessions: Arc<dyn SessionBroker>,
}

/// Build the collaborators for `config`.
pub fn create_collaborators(config: &AppConfig) -> Result<Collaborators, LlmError> {
    let client = Arc::new(OpenAiClient::new(
        &config.openai,
        config.realtime.session_timeout,
    ));

    let vision: Arc<dyn VisionAnalyzer> = if config.openai.api_key.is_some() {
        tracing::info!("Using OpenAI vision (model: {})", config.openai.vision_model);
        client.clone()
    } else {
        tracing::warn!("OPENAI_API_KEY not set, snapshot analysis returns stub cards");
        Arc::new(StubVisionAnalyzer::new(&config.stub_run)?)
    };

    Ok(Collaborators {
        vision,
        chat: client.clone(),
        sessions: client,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn without_key_vision_is_stubbed() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let collaborators = create_collaborators(&config).unwrap();
        let text = collaborators.vision.analyze(b"img", "image/jpeg").await.unwrap();
        assert_eq!(crate::cards::normalize(&text), config.stub_run);
    }
}
