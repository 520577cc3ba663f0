//! Environment-driven service configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `PROMPTCANVAS_PROVIDER` | `openai` if `OPENAI_API_KEY` is set, else `dry-run` |
//! | `OPENAI_API_KEY` | none |
//! | `OPENAI_BASE_URL` | `https://api.openai.com` |
//! | `PROMPTCANVAS_IMAGE_MODEL` | adapter default (`dall-e-3`) |
//! | `PROMPTCANVAS_IMAGE_SIZE` | `1024x1024` |
//! | `PROMPTCANVAS_TIMEOUT_SECS` | `60` |
//! | `PROMPTCANVAS_MAX_PROMPT_CHARS` | `1000` |
//! | `PROMPTCANVAS_CLEAR_ON_SUCCESS` | `false` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use promptcanvas_types::{CanvasError, PromptPolicy, Result};

use crate::{DryRunAdapter, ImageClient, LoggingMiddleware, OpenAiImageAdapter, DEFAULT_TIMEOUT};

pub const ENV_PROVIDER: &str = "PROMPTCANVAS_PROVIDER";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_IMAGE_MODEL: &str = "PROMPTCANVAS_IMAGE_MODEL";
pub const ENV_IMAGE_SIZE: &str = "PROMPTCANVAS_IMAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "PROMPTCANVAS_TIMEOUT_SECS";
pub const ENV_MAX_PROMPT_CHARS: &str = "PROMPTCANVAS_MAX_PROMPT_CHARS";
pub const ENV_CLEAR_ON_SUCCESS: &str = "PROMPTCANVAS_CLEAR_ON_SUCCESS";

const DEFAULT_SIZE: &str = "1024x1024";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    DryRun,
}

impl FromStr for ProviderKind {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "dry-run" | "dry_run" | "dryrun" => Ok(ProviderKind::DryRun),
            other => Err(CanvasError::Config(format!(
                "unknown provider '{other}' (expected 'openai' or 'dry-run')"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => f.write_str("openai"),
            ProviderKind::DryRun => f.write_str("dry-run"),
        }
    }
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: Option<String>,
    pub size: String,
    pub timeout: Duration,
    pub policy: PromptPolicy,
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("provider", &self.provider)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::DryRun,
            openai_api_key: None,
            openai_base_url: None,
            model: None,
            size: DEFAULT_SIZE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            policy: PromptPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get(ENV_OPENAI_API_KEY);
        let provider = match get(ENV_PROVIDER) {
            Some(raw) => raw.parse()?,
            None if openai_api_key.is_some() => ProviderKind::OpenAi,
            None => ProviderKind::DryRun,
        };
        if provider == ProviderKind::OpenAi && openai_api_key.is_none() {
            return Err(CanvasError::Config(format!(
                "{ENV_OPENAI_API_KEY} must be set when the provider is openai"
            )));
        }

        let defaults = PromptPolicy::default();
        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_positive(ENV_TIMEOUT_SECS, &raw)?),
            None => DEFAULT_TIMEOUT,
        };
        let max_chars = match get(ENV_MAX_PROMPT_CHARS) {
            Some(raw) => parse_positive(ENV_MAX_PROMPT_CHARS, &raw)? as usize,
            None => defaults.max_chars,
        };
        let clear_on_success = match get(ENV_CLEAR_ON_SUCCESS) {
            Some(raw) => parse_bool(ENV_CLEAR_ON_SUCCESS, &raw)?,
            None => defaults.clear_on_success,
        };

        Ok(Self {
            provider,
            openai_api_key,
            openai_base_url: get(ENV_OPENAI_BASE_URL),
            model: get(ENV_IMAGE_MODEL),
            size: get(ENV_IMAGE_SIZE).unwrap_or_else(|| DEFAULT_SIZE.to_string()),
            timeout,
            policy: PromptPolicy {
                max_chars,
                clear_on_success,
            },
        })
    }

    /// Build an `ImageClient` with the configured adapter, defaults, timeout,
    /// and request logging.
    pub fn build_client(&self) -> Result<ImageClient> {
        let mut client = ImageClient::new()
            .with_middleware(LoggingMiddleware)
            .with_timeout(self.timeout)
            .with_default_size(self.size.clone());
        if let Some(ref model) = self.model {
            client = client.with_default_model(model.clone());
        }

        match self.provider {
            ProviderKind::OpenAi => {
                let key = self.openai_api_key.clone().ok_or_else(|| {
                    CanvasError::Config(format!("{ENV_OPENAI_API_KEY} is not set"))
                })?;
                let mut adapter = OpenAiImageAdapter::new(key);
                if let Some(ref url) = self.openai_base_url {
                    adapter = adapter.with_base_url(url.clone());
                }
                client.register_provider(adapter);
            }
            ProviderKind::DryRun => {
                tracing::warn!("no image provider configured, using the dry-run adapter");
                client.register_provider(DryRunAdapter::new());
            }
        }

        Ok(client)
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(CanvasError::Config(format!("{key} must be greater than zero"))),
        Ok(n) => Ok(n),
        Err(_) => Err(CanvasError::Config(format!(
            "{key} must be a whole number, got '{raw}'"
        ))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CanvasError::Config(format!(
            "{key} must be true or false, got '{raw}'"
        ))),
    }
}
