use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use promptcanvas_types::{Artifact, CanvasError};

use crate::{DynImageService, ImageRequest, ImageService};

/// Upper bound on a single generation when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

pub trait Middleware: Send + Sync {
    fn before(&self, _request: &mut ImageRequest) {}
    fn after(&self, _request: &ImageRequest, _artifact: &mut Artifact) {}
    fn on_error(&self, _request: &ImageRequest, _error: &CanvasError) {}
}

// ---------------------------------------------------------------------------
// Built-in middleware: LoggingMiddleware
// ---------------------------------------------------------------------------

pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(&self, request: &mut ImageRequest) {
        tracing::info!(
            model = request.model.as_deref().unwrap_or("(default)"),
            size = request.size.as_deref().unwrap_or("(default)"),
            prompt_chars = request.prompt.chars().count(),
            "image request"
        );
    }

    fn after(&self, _request: &ImageRequest, artifact: &mut Artifact) {
        tracing::info!(
            id = %artifact.id,
            provider = %artifact.provider,
            model = %artifact.model,
            has_url = artifact.url.is_some(),
            "image generated"
        );
    }

    fn on_error(&self, _request: &ImageRequest, error: &CanvasError) {
        tracing::warn!(
            error = %error,
            retryable = error.is_retryable(),
            "image generation failed"
        );
    }
}

// ---------------------------------------------------------------------------
// Built-in middleware: UsageMiddleware
// ---------------------------------------------------------------------------

/// Counts generations. Clones share the same counters.
#[derive(Clone)]
pub struct UsageMiddleware {
    succeeded: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl UsageMiddleware {
    pub fn new() -> Self {
        Self {
            succeeded: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Default for UsageMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for UsageMiddleware {
    fn after(&self, _request: &ImageRequest, _artifact: &mut Artifact) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, _request: &ImageRequest, _error: &CanvasError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// ImageClient
// ---------------------------------------------------------------------------

pub struct ImageClient {
    providers: HashMap<String, DynImageService>,
    default_provider: Option<String>,
    middleware: Vec<Box<dyn Middleware>>,
    default_model: Option<String>,
    default_size: Option<String>,
    timeout: Duration,
}

impl ImageClient {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
            middleware: Vec::new(),
            default_model: None,
            default_size: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Register an adapter under its own name. The first one registered
    /// becomes the default.
    pub fn register_provider(&mut self, provider: impl ImageService + 'static) {
        let name = provider.name().to_string();
        if self.default_provider.is_none() {
            self.default_provider = Some(name.clone());
        }
        self.providers.insert(name, DynImageService::new(provider));
    }

    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(m));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_default_size(mut self, size: impl Into<String>) -> Self {
        self.default_size = Some(size.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError> {
        let provider = self.resolve_provider(request)?;
        let mut req = request.clone();
        if req.model.is_none() {
            req.model = self.default_model.clone();
        }
        if req.size.is_none() {
            req.size = self.default_size.clone();
        }

        for m in &self.middleware {
            m.before(&mut req);
        }

        let result = match tokio::time::timeout(self.timeout, provider.generate(&req)).await {
            Ok(result) => result,
            Err(_) => Err(CanvasError::RequestTimeout {
                provider: provider.name().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(mut artifact) => {
                for m in &self.middleware {
                    m.after(&req, &mut artifact);
                }
                Ok(artifact)
            }
            Err(err) => {
                for m in &self.middleware {
                    m.on_error(&req, &err);
                }
                Err(err)
            }
        }
    }

    fn resolve_provider(&self, request: &ImageRequest) -> Result<&DynImageService, CanvasError> {
        // 1. Explicit provider field
        if let Some(ref provider_name) = request.provider {
            return self.providers.get(provider_name).ok_or_else(|| {
                CanvasError::Other(format!("Provider '{}' not registered", provider_name))
            });
        }

        // 2. First registered provider
        self.default_provider
            .as_ref()
            .and_then(|name| self.providers.get(name))
            .ok_or_else(|| CanvasError::Other("No image providers registered".to_string()))
    }
}

impl Default for ImageClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
