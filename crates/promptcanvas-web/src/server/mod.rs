pub mod generate;

#[cfg(feature = "ssr")]
use std::sync::Arc;

#[cfg(feature = "ssr")]
use promptcanvas_image::{ImageClient, ServiceConfig};
#[cfg(feature = "ssr")]
use promptcanvas_types::{CanvasError, PromptPolicy};

/// Shared server state, provided to server functions as Leptos context.
#[cfg(feature = "ssr")]
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ImageClient>,
    pub policy: PromptPolicy,
}

#[cfg(feature = "ssr")]
impl AppState {
    pub fn new(client: ImageClient, policy: PromptPolicy) -> Self {
        Self {
            client: Arc::new(client),
            policy,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, CanvasError> {
        Ok(Self::new(config.build_client()?, config.policy.clone()))
    }
}
