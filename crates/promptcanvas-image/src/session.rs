//! Async coordinator that drives a `PageState` against an `ImageClient`.

use std::sync::Arc;

use tokio::sync::RwLock;

use promptcanvas_types::{
    CanvasError, GenerationFailure, GenerationStatus, PageState, PromptPolicy,
};

use crate::{ImageClient, ImageRequest};

/// What happened to a `generate_image` call.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing was sent: empty or overlong prompt, or a request already in flight.
    Rejected(CanvasError),
    /// The service answered and the page now shows this status.
    Finished(GenerationStatus),
    /// The service answered but the request had been cancelled in the meantime.
    Discarded,
}

/// Per-session prompt state plus the service it submits to.
///
/// Cloning a `Session` yields another handle to the **same** state, so one
/// handle can keep editing the prompt while another awaits a generation.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<PageState>>,
    client: Arc<ImageClient>,
}

impl Session {
    pub fn new(client: ImageClient, policy: PromptPolicy) -> Self {
        Self::with_shared_client(Arc::new(client), policy)
    }

    pub fn with_shared_client(client: Arc<ImageClient>, policy: PromptPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(PageState::new(policy))),
            client,
        }
    }

    pub async fn prompt(&self) -> String {
        self.state.read().await.prompt().to_owned()
    }

    pub async fn set_prompt(&self, next: impl Into<String>) {
        self.state.write().await.set_prompt(next);
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.read().await.is_submitting()
    }

    pub async fn status(&self) -> GenerationStatus {
        self.state.read().await.status().clone()
    }

    /// Submit the current prompt and wait for the service to answer.
    ///
    /// Single-flight: while a request is in flight, further calls return
    /// `Rejected(ConcurrentSubmit)` without contacting the service. Service
    /// failures are recorded on the page state, never returned as errors.
    pub async fn generate_image(&self) -> SubmitOutcome {
        let submission = match self.state.write().await.begin_generate() {
            Ok(submission) => submission,
            Err(err) => {
                tracing::debug!(error = %err, "generation not started");
                return SubmitOutcome::Rejected(err);
            }
        };

        let mut pending = PendingSubmission {
            state: Arc::clone(&self.state),
            ticket: submission.ticket,
            settled: false,
        };

        let request = ImageRequest::new(submission.prompt);
        let result = self
            .client
            .generate(&request)
            .await
            .map_err(|err| GenerationFailure::from(&err));

        let mut state = self.state.write().await;
        pending.settled = true;
        if state.complete(submission.ticket, result) {
            tracing::info!(
                ticket = submission.ticket,
                status = state.status().label(),
                "generation finished"
            );
            SubmitOutcome::Finished(state.status().clone())
        } else {
            SubmitOutcome::Discarded
        }
    }

    /// Abandon the in-flight request, if any.
    pub async fn cancel(&self) -> bool {
        let cancelled = self.state.write().await.cancel();
        if cancelled {
            tracing::info!("generation cancelled");
        }
        cancelled
    }

    pub async fn acknowledge(&self) -> bool {
        self.state.write().await.acknowledge()
    }
}

/// Cancels its ticket when dropped before the answer was recorded, so a
/// caller that stops waiting (timeout, `select!`, task abort) does not leave
/// the session stuck in `Submitting`.
struct PendingSubmission {
    state: Arc<RwLock<PageState>>,
    ticket: u64,
    settled: bool,
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let ticket = self.ticket;
        if let Ok(mut state) = self.state.try_write() {
            if state.abandon(ticket) {
                tracing::info!(ticket, "generation abandoned by caller");
            }
            return;
        }

        // Someone holds the lock right now; finish the cancel on the runtime.
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if state.write().await.abandon(ticket) {
                        tracing::info!(ticket, "generation abandoned by caller");
                    }
                });
            }
            Err(_) => tracing::warn!(ticket, "could not release abandoned generation"),
        }
    }
}
