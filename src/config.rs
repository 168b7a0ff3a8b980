//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::cards::model::{Run, stub_run};
use crate::error::ConfigError;
use crate::report::MergeMode;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// Port the server listens on.
    pub port: u16,
    /// Port the service is reachable on from outside a container (banner only).
    pub host_port: u16,
    /// Run history file.
    pub history_path: PathBuf,
    /// Skeleton PDF the report is appended to, when the file exists.
    pub template_path: PathBuf,
    pub merge_mode: MergeMode,
    /// Directory holding `index.html` and frontend assets.
    pub static_dir: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Cards served before any analysis exists.
    pub stub_run: Run,
    pub openai: OpenAiSettings,
    pub realtime: RealtimeSettings,
    /// Directory for rolling log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
}

/// Settings for the chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub vision_model: String,
    pub chat_model: String,
    /// Applied to vision and chat calls when set.
    pub request_timeout: Option<Duration>,
}

/// Settings for realtime voice sessions.
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    pub model: Option<String>,
    pub voice: Option<String>,
    pub session_timeout: Duration,
}

/// Validated realtime settings for one session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeTarget {
    pub model: String,
    pub voice: String,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let host_port = parse_or(get("HOST_PORT"), "HOST_PORT", port)?;
        let merge_all = parse_bool(get("REPORT_MERGE_ALL_PAGES"), "REPORT_MERGE_ALL_PAGES")?;
        let request_timeout = get("OPENAI_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_secs(&v, "OPENAI_REQUEST_TIMEOUT_SECS"))
            .transpose()?;
        let session_timeout = match get("REALTIME_SESSION_TIMEOUT_SECS") {
            Some(v) => parse_secs(&v, "REALTIME_SESSION_TIMEOUT_SECS")?,
            None => Duration::from_secs(10),
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            host_port,
            history_path: get("HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/analysis_history.json")),
            template_path: get("TEMPLATE_PDF_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("skeleton.pdf")),
            merge_mode: if merge_all {
                MergeMode::AllPages
            } else {
                MergeMode::FirstPageOnly
            },
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            max_upload_bytes: parse_or(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            stub_run: stub_run(),
            openai: OpenAiSettings {
                api_key: get("OPENAI_API_KEY").map(SecretString::from),
                base_url: get("OPENAI_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                vision_model: get("OPENAI_VISION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                chat_model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                request_timeout,
            },
            realtime: RealtimeSettings {
                model: get("OPENAI_REALTIME_MODEL"),
                voice: get("OPENAI_REALTIME_VOICE"),
                session_timeout,
            },
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}

impl RealtimeSettings {
    /// Check that a session can be requested. `has_api_key` comes from
    /// [`OpenAiSettings::api_key`].
    pub fn require(&self, has_api_key: bool) -> Result<RealtimeTarget, ConfigError> {
        if !has_api_key {
            return Err(missing("OPENAI_API_KEY", "Set it to an OpenAI API key."));
        }
        let model = self.model.clone().ok_or_else(|| {
            missing(
                "OPENAI_REALTIME_MODEL",
                "Set it to a realtime model id, e.g. gpt-4o-realtime-preview.",
            )
        })?;
        let voice = self.voice.clone().ok_or_else(|| {
            missing(
                "OPENAI_REALTIME_VOICE",
                "Set it to a realtime voice, e.g. alloy.",
            )
        })?;
        Ok(RealtimeTarget { model, voice })
    }
}

fn missing(key: &str, hint: &str) -> ConfigError {
    ConfigError::MissingRequired {
        key: key.to_string(),
        hint: hint.to_string(),
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{v:?}: {e}"),
        }),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{other:?} is not a boolean"),
        }),
    }
}

fn parse_secs(value: &str, key: &str) -> Result<Duration, ConfigError> {
    parse_or(Some(value.to_string()), key, 0u64).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host_port, 5000);
        assert_eq!(config.history_path, PathBuf::from("data/analysis_history.json"));
        assert_eq!(config.merge_mode, MergeMode::FirstPageOnly);
        assert_eq!(config.stub_run, stub_run());
        assert!(config.openai.api_key.is_none());
        assert!(config.openai.request_timeout.is_none());
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.realtime.session_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("PORT", "8081"),
            ("HOST_PORT", "18081"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1/"),
            ("REPORT_MERGE_ALL_PAGES", "true"),
            ("OPENAI_REQUEST_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.host_port, 18081);
        assert_eq!(config.merge_mode, MergeMode::AllPages);
        assert_eq!(config.openai.base_url, "http://localhost:9999/v1");
        assert_eq!(config.openai.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            config.openai.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-test".to_string())
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("OPENAI_API_KEY", "  "), ("PORT", "")]).unwrap();
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn invalid_bool_is_rejected() {
        assert!(load(&[("REPORT_MERGE_ALL_PAGES", "maybe")]).is_err());
    }

    #[test]
    fn realtime_requires_key_model_and_voice() {
        let config = load(&[("OPENAI_REALTIME_MODEL", "gpt-4o-realtime-preview")]).unwrap();

        let err = config.realtime.require(false).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let err = config.realtime.require(true).unwrap_err();
        assert!(err.to_string().contains("OPENAI_REALTIME_VOICE"));

        let config = load(&[
            ("OPENAI_REALTIME_MODEL", "gpt-4o-realtime-preview"),
            ("OPENAI_REALTIME_VOICE", "alloy"),
        ])
        .unwrap();
        assert_eq!(
            config.realtime.require(true).unwrap(),
            RealtimeTarget {
                model: "gpt-4o-realtime-preview".to_string(),
                voice: "alloy".to_string(),
            }
        );
    }
}
