use std::time::Duration;

use async_trait::async_trait;

use crate::{ImageRequest, ImageService};
use promptcanvas_types::{Artifact, CanvasError};

/// Offline adapter that never touches the network. It answers every request
/// with a synthetic artifact after `delay`, which is enough to exercise the
/// submit/disable/re-enable cycle locally.
#[derive(Debug, Clone, Default)]
pub struct DryRunAdapter {
    delay: Duration,
}

impl DryRunAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ImageService for DryRunAdapter {
    async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(prompt = %request.prompt, "dry run: skipping image service");

        Ok(Artifact {
            id: format!("dry-run-{}", uuid::Uuid::new_v4()),
            url: None,
            revised_prompt: None,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_string()),
            provider: self.name().to_string(),
            created_at: chrono::Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "dry-run"
    }

    fn default_model(&self) -> &str {
        "dry-run"
    }
}
