use leptos::prelude::*;
use promptcanvas_types::GenerationStatus;

use crate::state::PageStateHandle;

#[component]
pub fn GenerationStatusLine(state: PageStateHandle) -> impl IntoView {
    let dismiss = move || {
        view! {
            <button
                class="dismiss"
                type="button"
                aria-label="Dismiss"
                on:click=move |_| state.acknowledge()
            >
                "×"
            </button>
        }
    };

    view! {
        {move || match state.status() {
            GenerationStatus::Idle | GenerationStatus::Cancelled => ().into_any(),
            GenerationStatus::Submitting { .. } => view! {
                <p class="generation-status pending" role="status">
                    <span class="spinner-sm"></span>
                    "Generating…"
                </p>
            }.into_any(),
            GenerationStatus::Succeeded { artifact } => {
                let body = match artifact.url {
                    Some(url) => view! {
                        <a href=url target="_blank" rel="noopener noreferrer">
                            "Open generated image"
                        </a>
                    }.into_any(),
                    None => format!("Image {} generated", artifact.id).into_any(),
                };
                view! {
                    <p class="generation-status done" role="status">{body} {dismiss()}</p>
                }.into_any()
            }
            GenerationStatus::Failed { error } => view! {
                <p class="generation-status error" role="alert">{error.message} {dismiss()}</p>
            }.into_any(),
        }}
    }
}
