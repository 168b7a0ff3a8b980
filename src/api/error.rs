//! Mapping of handler failures onto HTTP responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{ConfigError, LlmError, ReportError};

/// Every failure a route can return. Bodies are always `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// A required request field is missing (400).
    Validation(&'static str),
    /// The upload body could not be read (status from the multipart layer).
    Upload(MultipartError),
    /// Settings needed for this route are absent (500, specific message).
    Config(ConfigError),
    /// An upstream collaborator failed (502, generic message).
    Upstream {
        message: &'static str,
        source: LlmError,
    },
    /// The PDF could not be produced (500).
    Report(ReportError),
}

impl ApiError {
    /// Map a collaborator failure; missing credentials count as configuration.
    pub fn upstream(message: &'static str, source: LlmError) -> Self {
        match source {
            LlmError::MissingCredentials { .. } => Self::Config(ConfigError::MissingRequired {
                key: "OPENAI_API_KEY".to_string(),
                hint: "Set it to an OpenAI API key.".to_string(),
            }),
            source => Self::Upstream { message, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upload(e) => e.status(),
            Self::Config(_) | Self::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Validation(message) => message.to_string(),
            Self::Upload(e) => {
                warn!(error = %e, "Rejected upload");
                e.body_text()
            }
            Self::Config(e) => {
                error!(error = %e, "Route is missing configuration");
                e.to_string()
            }
            Self::Upstream { message, source } => {
                error!(error = %source, "Upstream call failed");
                message.to_string()
            }
            Self::Report(e) => {
                error!(error = %e, "Report generation failed");
                "PDF generation failed".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
