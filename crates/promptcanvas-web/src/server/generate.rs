use leptos::prelude::*;
use leptos::server_fn::error::NoCustomError;
use promptcanvas_types::{Artifact, GenerationFailure, PromptPolicy};

#[cfg(feature = "ssr")]
use promptcanvas_types::CanvasError;

/// What the page receives for one generation. Service and prompt failures
/// arrive as `Err(GenerationFailure)`; `ServerFnError` is reserved for
/// transport and server setup problems.
pub type GenerationResult = Result<Artifact, GenerationFailure>;

#[cfg(feature = "ssr")]
fn app_state() -> Result<super::AppState, ServerFnError<NoCustomError>> {
    use_context::<super::AppState>().ok_or_else(|| {
        ServerFnError::<NoCustomError>::ServerError("Image service is not configured".into())
    })
}

/// Prompt limits the server enforces, so the form can mirror them.
#[server(GetPromptPolicy)]
pub async fn prompt_policy() -> Result<PromptPolicy, ServerFnError<NoCustomError>> {
    Ok(app_state()?.policy)
}

#[server(GenerateImage)]
pub async fn generate_image(
    prompt: String,
) -> Result<GenerationResult, ServerFnError<NoCustomError>> {
    let state = app_state()?;
    Ok(run_generation(&state, prompt).await)
}

/// Validate `prompt` against the server policy and run it through the
/// image client.
#[cfg(feature = "ssr")]
pub async fn run_generation(state: &super::AppState, prompt: String) -> GenerationResult {
    use promptcanvas_image::ImageRequest;

    if let Err(e) = state.policy.validate(&prompt) {
        return Err(report_failure(&e));
    }

    tracing::info!(prompt_chars = prompt.chars().count(), "generating image");
    let artifact = state
        .client
        .generate(&ImageRequest::new(prompt))
        .await
        .map_err(|e| report_failure(&e))?;

    tracing::info!(id = %artifact.id, "image generated");
    Ok(artifact)
}

#[cfg(feature = "ssr")]
fn report_failure(err: &CanvasError) -> GenerationFailure {
    let status = err.http_status().unwrap_or(500);
    if err.is_terminal() {
        tracing::warn!(error = %err, status, "generation rejected");
    } else {
        tracing::error!(
            error = %err,
            status,
            retryable = err.is_retryable(),
            "image generation failed"
        );
    }
    GenerationFailure::from(err)
}
