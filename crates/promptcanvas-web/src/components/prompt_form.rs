use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use crate::state::PageStateHandle;

pub const PROMPT_PLACEHOLDER: &str =
    "Both Angel and Evil are inside us. It is up to us which one to let out!";

/// Two-row prompt textarea and the Generate button.
///
/// The button stays disabled for as long as a generation is in flight.
/// Browsers count `maxlength` in UTF-16 code units while the policy counts
/// characters, so the attribute is never looser than the policy but cuts
/// prompts full of astral-plane characters (emoji) short of the limit.
/// `PageState` remains the authoritative check.
#[component]
pub fn PromptForm(state: PageStateHandle) -> impl IntoView {
    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        state.generate_image();
    };

    view! {
        <div class="prompt-form">
            <form class="form" on:submit=on_submit>
                <textarea
                    class="prompt-textarea"
                    rows="2"
                    placeholder=PROMPT_PLACEHOLDER
                    required=true
                    maxlength=state.max_chars().to_string()
                    prop:value=move || state.prompt()
                    on:input=move |ev| {
                        state.set_prompt(event_target_value(&ev));
                    }
                />
                <button
                    class="generate-button"
                    type="submit"
                    disabled=move || state.is_submitting()
                >
                    "Generate"
                </button>
            </form>
        </div>
    }
}

#[cfg(all(test, feature = "ssr"))]
mod tests {
    use super::*;
    use promptcanvas_types::{GenerationFailure, PromptPolicy};

    fn render(policy: PromptPolicy) -> String {
        let owner = Owner::new();
        owner.set();
        let state = PageStateHandle::new(policy);
        view! { <PromptForm state=state/> }.to_html()
    }

    #[test]
    fn renders_two_row_textarea_with_placeholder() {
        let html = render(PromptPolicy::default());

        assert!(html.contains("<textarea"));
        assert!(html.contains(r#"rows="2""#));
        assert!(html.contains(PROMPT_PLACEHOLDER));
        assert!(html.contains("required"));
        assert!(html.contains(r#"maxlength="1000""#));
    }

    #[test]
    fn renders_enabled_submit_button_on_load() {
        let html = render(PromptPolicy::default());

        assert!(html.contains(r#"type="submit""#));
        assert!(html.contains("Generate"));
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn button_is_disabled_exactly_while_submitting() {
        let owner = Owner::new();
        owner.set();
        let state = PageStateHandle::new(PromptPolicy::default());
        state.set_prompt("sunset".into());

        let submission = state.begin().unwrap();
        let html = view! { <PromptForm state=state/> }.to_html();
        assert!(html.contains("disabled"));

        state.finish(
            submission.ticket,
            Err(GenerationFailure::new("upstream unavailable")),
        );
        let html = view! { <PromptForm state=state/> }.to_html();
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn maxlength_follows_policy() {
        let html = render(PromptPolicy {
            max_chars: 250,
            ..PromptPolicy::default()
        });
        assert!(html.contains(r#"maxlength="250""#));
    }
}
