use async_trait::async_trait;

use crate::ImageRequest;
use promptcanvas_types::{Artifact, CanvasError};

// ---------------------------------------------------------------------------
// ImageService
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError>;
    fn name(&self) -> &str;
    fn default_model(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynImageService
// ---------------------------------------------------------------------------

pub struct DynImageService(Box<dyn ImageService>);

impl DynImageService {
    pub fn new(service: impl ImageService + 'static) -> Self {
        Self(Box::new(service))
    }

    pub async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError> {
        self.0.generate(request).await
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn default_model(&self) -> &str {
        self.0.default_model()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
