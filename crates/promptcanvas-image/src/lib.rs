//! Image service boundary for promptcanvas.
//!
//! Provides the `ImageService` adapter trait, the `DynImageService` wrapper,
//! a middleware chain and timeout in `ImageClient`, env-driven
//! `ServiceConfig`, and `Session`, the async coordinator that drives a
//! `PageState` against a client.

mod client;
mod config;
mod dry_run;
mod openai;
mod provider;
mod session;
mod types;

pub use client::*;
pub use config::{ProviderKind, ServiceConfig};
pub use dry_run::DryRunAdapter;
pub use openai::OpenAiImageAdapter;
pub use provider::*;
pub use session::{Session, SubmitOutcome};
pub use types::*;
