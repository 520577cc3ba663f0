//! Browser-side handle over the page's prompt and generation state.

use leptos::prelude::*;
use leptos::server_fn::error::NoCustomError;
use leptos::task::spawn_local;
use promptcanvas_types::{GenerationFailure, GenerationStatus, PageState, PromptPolicy, Submission};

use crate::server::generate::{generate_image, GenerationResult};

/// Copyable handle to one page's [`PageState`]. Views receive it as a prop.
#[derive(Clone, Copy)]
pub struct PageStateHandle {
    state: RwSignal<PageState>,
}

impl PageStateHandle {
    /// Create fresh state owned by the current reactive scope. Leaving the
    /// scope cancels any request still in flight.
    pub fn new(policy: PromptPolicy) -> Self {
        let handle = Self {
            state: RwSignal::new(PageState::new(policy)),
        };
        on_cleanup(move || {
            handle.state.try_update(|state| state.cancel());
        });
        handle
    }

    pub fn prompt(&self) -> String {
        self.state.with(|state| state.prompt().to_owned())
    }

    pub fn set_prompt(&self, next: String) {
        self.state.update(|state| state.set_prompt(next));
    }

    pub fn is_submitting(&self) -> bool {
        self.state.with(PageState::is_submitting)
    }

    pub fn status(&self) -> GenerationStatus {
        self.state.with(|state| state.status().clone())
    }

    pub fn max_chars(&self) -> usize {
        self.state.with_untracked(|state| state.policy().max_chars)
    }

    /// Move to `Submitting` for the current prompt. `None` while a request is
    /// in flight or when the prompt is not acceptable.
    pub fn begin(&self) -> Option<Submission> {
        match self.state.try_update(PageState::begin_generate)? {
            Ok(submission) => Some(submission),
            Err(err) => {
                tracing::debug!(error = %err, "generation not started");
                None
            }
        }
    }

    /// Submit the current prompt and record the server's answer when it
    /// arrives.
    pub fn generate_image(&self) {
        let Some(submission) = self.begin() else {
            return;
        };

        let handle = *self;
        spawn_local(async move {
            let result = settle(generate_image(submission.prompt).await);
            handle.finish(submission.ticket, result);
        });
    }

    /// Record the answer for `ticket`. Ignored when the page has been torn
    /// down or `ticket` is no longer in flight.
    pub fn finish(&self, ticket: u64, result: GenerationResult) -> bool {
        self.state
            .try_update(|page| page.complete(ticket, result))
            .unwrap_or(false)
    }

    pub fn acknowledge(&self) {
        self.state.update(|state| {
            state.acknowledge();
        });
    }
}

/// Collapse a server-function response into the result recorded on the page.
pub fn settle(
    response: Result<GenerationResult, ServerFnError<NoCustomError>>,
) -> GenerationResult {
    response.unwrap_or_else(|err| Err(failure_from_server_error(&err)))
}

/// Failure for a call that never produced a generation result. Only
/// transport problems are worth retrying.
pub fn failure_from_server_error(err: &ServerFnError<NoCustomError>) -> GenerationFailure {
    let (message, retryable) = match err {
        ServerFnError::Request(message) | ServerFnError::Response(message) => {
            (format!("Could not reach the server: {message}"), true)
        }
        ServerFnError::ServerError(message) => (message.clone(), false),
        other => (other.to_string(), false),
    };
    GenerationFailure { message, retryable }
}
