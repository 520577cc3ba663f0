use leptos::prelude::*;
use promptcanvas_types::PromptPolicy;

use crate::components::footer::Footer;
use crate::components::prompt_form::PromptForm;
use crate::components::status_line::GenerationStatusLine;
use crate::server::generate::prompt_policy;
use crate::state::PageStateHandle;

#[component]
pub fn HomePage() -> impl IntoView {
    let policy = Resource::new(|| (), |_| prompt_policy());

    view! {
        <main class="home-page">
            <Suspense fallback=|| view! { <p class="loading">"Loading..."</p> }>
                {move || policy.get().map(|result| {
                    let policy = result.unwrap_or_else(|e| {
                        tracing::warn!("falling back to default prompt policy: {e}");
                        PromptPolicy::default()
                    });
                    view! { <PromptPanel policy=policy/> }
                })}
            </Suspense>
            <Footer/>
        </main>
    }
}

/// Owns the page state for one visit and wires it into the views.
#[component]
fn PromptPanel(policy: PromptPolicy) -> impl IntoView {
    let state = PageStateHandle::new(policy);

    view! {
        <section class="prompt-panel">
            <PromptForm state=state/>
            <GenerationStatusLine state=state/>
        </section>
    }
}
