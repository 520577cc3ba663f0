//! Shared types, errors, and prompt submission state for promptcanvas.
//!
//! This crate provides the foundational types used across all other promptcanvas crates:
//! - `CanvasError`: unified error taxonomy
//! - `Artifact`: reference to a generated image
//! - `GenerationStatus`: lifecycle of a single generation request
//! - `PageState`: per-page prompt draft and single-flight submission machine

mod page_state;

pub use page_state::{PageState, PromptDraft, PromptPolicy, Submission, DEFAULT_MAX_PROMPT_CHARS};

use serde::{Deserialize, Serialize};

/// Unified error type for all promptcanvas subsystems.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    // === Image Service Errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    RequestTimeout {
        provider: String,
        timeout_ms: u64,
    },

    #[error("Prompt rejected by {provider} content policy: {message}")]
    ContentPolicy { provider: String, message: String },

    // === Submission Errors ===
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Prompt is {len} characters long, the limit is {max}")]
    PromptTooLong { len: usize, max: usize },

    #[error("A generation request is already in flight")]
    ConcurrentSubmit,

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl CanvasError {
    /// Returns `true` if the error is transient and the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CanvasError::RateLimited { .. }
                | CanvasError::RequestTimeout { .. }
                | CanvasError::ProviderError { retryable: true, .. }
        )
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanvasError::AuthError { .. }
                | CanvasError::ContentPolicy { .. }
                | CanvasError::EmptyPrompt
                | CanvasError::PromptTooLong { .. }
                | CanvasError::Config(_)
        )
    }

    /// Maps the error to an HTTP status code for server mode.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CanvasError::RateLimited { .. } => Some(429),
            CanvasError::AuthError { .. } => Some(401),
            CanvasError::ProviderError { status, .. } => Some(*status),
            CanvasError::RequestTimeout { .. } => Some(504),
            CanvasError::EmptyPrompt | CanvasError::ContentPolicy { .. } => Some(400),
            CanvasError::PromptTooLong { .. } => Some(413),
            CanvasError::ConcurrentSubmit => Some(409),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, CanvasError>`.
pub type Result<T> = std::result::Result<T, CanvasError>;

// ---------------------------------------------------------------------------
// Artifact: a generated image
// ---------------------------------------------------------------------------

/// Reference to an image produced by the external image service.
///
/// `url` is either a remote URL or a `data:` URL when the provider returned
/// inline bytes. Dry-run artifacts have no URL at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub url: Option<String>,
    pub revised_prompt: Option<String>,
    pub model: String,
    pub provider: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// GenerationFailure: failure descriptor recorded on a request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub message: String,
    pub retryable: bool,
}

impl GenerationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<&CanvasError> for GenerationFailure {
    fn from(err: &CanvasError) -> Self {
        Self {
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<CanvasError> for GenerationFailure {
    fn from(err: CanvasError) -> Self {
        Self::from(&err)
    }
}

// ---------------------------------------------------------------------------
// GenerationStatus: lifecycle of a generation request
// ---------------------------------------------------------------------------

/// Status of the page's generation request.
///
/// Only `Submitting` represents an outstanding service call, so "submitting
/// and succeeded at once" cannot be expressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Submitting {
        ticket: u64,
        prompt: String,
    },
    Succeeded {
        artifact: Artifact,
    },
    Failed {
        error: GenerationFailure,
    },
    Cancelled,
}

impl GenerationStatus {
    pub fn is_submitting(&self) -> bool {
        matches!(self, GenerationStatus::Submitting { .. })
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            GenerationStatus::Succeeded { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            GenerationStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Short machine-friendly name, used in logs and CSS classes.
    pub fn label(&self) -> &'static str {
        match self {
            GenerationStatus::Idle => "idle",
            GenerationStatus::Submitting { .. } => "submitting",
            GenerationStatus::Succeeded { .. } => "succeeded",
            GenerationStatus::Failed { .. } => "failed",
            GenerationStatus::Cancelled => "cancelled",
        }
    }
}
