//! Offline vision analyzer used when no API key is configured.

use async_trait::async_trait;
use tracing::warn;

use super::provider::VisionAnalyzer;
use crate::cards::model::Run;
use crate::error::LlmError;

/// Answers every snapshot with a fixed run serialized as completion text.
pub struct StubVisionAnalyzer {
    completion: String,
}

impl StubVisionAnalyzer {
    pub fn new(run: &Run) -> Result<Self, LlmError> {
        Ok(Self {
            completion: serde_json::to_string(run)?,
        })
    }
}

#[async_trait]
impl VisionAnalyzer for StubVisionAnalyzer {
    async fn analyze(&self, image: &[u8], _mime_type: &str) -> Result<String, LlmError> {
        warn!(bytes = image.len(), "No vision model configured, returning stub analysis");
        Ok(self.completion.clone())
    }
}
