//! End-to-end tests for the prompt session: prompt edits, single-flight
//! submission, failure recording, and cancellation against controllable
//! image services.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use promptcanvas_image::{
    DryRunAdapter, ImageClient, ImageRequest, ImageService, Session, SubmitOutcome,
    UsageMiddleware,
};
use promptcanvas_types::{Artifact, CanvasError, GenerationStatus, PromptPolicy};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every prompt it receives, signals `started`, then blocks until the
/// test hands out a permit on `release`. Prompts equal to `"nonsense"` fail.
#[derive(Clone)]
struct GatedService {
    calls: Arc<Mutex<Vec<String>>>,
    started: Arc<Notify>,
    release: Arc<Semaphore>,
}

impl GatedService {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn release_one(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl ImageService for GatedService {
    async fn generate(&self, request: &ImageRequest) -> Result<Artifact, CanvasError> {
        self.calls.lock().unwrap().push(request.prompt.clone());
        self.started.notify_one();
        self.release
            .acquire()
            .await
            .expect("semaphore closed")
            .forget();

        if request.prompt == "nonsense" {
            return Err(CanvasError::ProviderError {
                provider: "gated".into(),
                status: 500,
                message: "model crashed".into(),
                retryable: true,
            });
        }
        Ok(Artifact {
            id: format!("img-{}", self.calls.lock().unwrap().len()),
            url: Some("https://images.example/out.png".into()),
            revised_prompt: None,
            model: "gated-model".into(),
            provider: "gated".into(),
            created_at: chrono::Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "gated"
    }

    fn default_model(&self) -> &str {
        "gated-model"
    }
}

fn session_with(service: impl ImageService + 'static) -> Session {
    let mut client = ImageClient::new();
    client.register_provider(service);
    Session::new(client, PromptPolicy::default())
}

fn spawn_generate(session: &Session) -> tokio::task::JoinHandle<SubmitOutcome> {
    let session = session.clone();
    tokio::spawn(async move { session.generate_image().await })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn happy_path_submits_once_and_re_enables() {
    let service = GatedService::new();
    let session = session_with(service.clone());

    session.set_prompt("a cat riding a bicycle").await;
    assert_eq!(session.prompt().await, "a cat riding a bicycle");

    let pending = spawn_generate(&session);
    service.started.notified().await;

    assert!(session.is_submitting().await);
    assert_eq!(service.calls(), vec!["a cat riding a bicycle"]);

    service.release_one();
    let outcome = pending.await.unwrap();

    match outcome {
        SubmitOutcome::Finished(GenerationStatus::Succeeded { artifact }) => {
            assert_eq!(artifact.provider, "gated");
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert!(!session.is_submitting().await);
    assert_eq!(service.calls().len(), 1);
}

// ---------------------------------------------------------------------------
// Empty prompt
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_prompt_never_reaches_the_service() {
    let service = GatedService::new();
    let session = session_with(service.clone());

    let outcome = session.generate_image().await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected(CanvasError::EmptyPrompt)
    ));
    assert!(service.calls().is_empty());
    assert_eq!(session.status().await, GenerationStatus::Idle);
}

// ---------------------------------------------------------------------------
// Double-click dedupe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_click_during_flight_is_ignored() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("sunset").await;

    let first = spawn_generate(&session);
    service.started.notified().await;

    let second = session.generate_image().await;
    assert!(matches!(
        second,
        SubmitOutcome::Rejected(CanvasError::ConcurrentSubmit)
    ));
    assert_eq!(service.calls(), vec!["sunset"]);

    service.release_one();
    assert!(matches!(
        first.await.unwrap(),
        SubmitOutcome::Finished(GenerationStatus::Succeeded { .. })
    ));

    // After resolution a third click goes through again.
    let third = spawn_generate(&session);
    service.started.notified().await;
    service.release_one();
    assert!(matches!(
        third.await.unwrap(),
        SubmitOutcome::Finished(GenerationStatus::Succeeded { .. })
    ));
    assert_eq!(service.calls(), vec!["sunset", "sunset"]);
}

// ---------------------------------------------------------------------------
// Service failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_failure_is_recorded_and_retry_works() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("nonsense").await;

    service.release_one();
    let outcome = session.generate_image().await;

    match outcome {
        SubmitOutcome::Finished(GenerationStatus::Failed { error }) => {
            assert!(error.message.contains("model crashed"));
            assert!(error.retryable);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!session.is_submitting().await);

    // Retrying is just clicking again.
    service.release_one();
    session.generate_image().await;
    assert_eq!(service.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_recorded_as_retryable_failure() {
    let service = GatedService::new();
    let mut client = ImageClient::new().with_timeout(Duration::from_secs(10));
    client.register_provider(service.clone());
    let session = Session::new(client, PromptPolicy::default());
    session.set_prompt("sunset").await;

    // Never released: the client timeout fires instead.
    let outcome = session.generate_image().await;

    match outcome {
        SubmitOutcome::Finished(GenerationStatus::Failed { error }) => {
            assert!(error.message.contains("timed out after 10000ms"));
            assert!(error.retryable);
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Typing during submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn typing_during_flight_updates_draft_but_not_request() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("prompt A").await;

    let pending = spawn_generate(&session);
    service.started.notified().await;

    session.set_prompt("prompt A, now with more detail").await;
    assert_eq!(session.prompt().await, "prompt A, now with more detail");

    service.release_one();
    pending.await.unwrap();

    assert_eq!(service.calls(), vec!["prompt A"]);
    assert_eq!(session.prompt().await, "prompt A, now with more detail");
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_request_discards_late_answer() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("sunset").await;

    let pending = spawn_generate(&session);
    service.started.notified().await;

    assert!(session.cancel().await);
    assert_eq!(session.status().await, GenerationStatus::Cancelled);
    assert!(!session.is_submitting().await);

    service.release_one();
    assert!(matches!(pending.await.unwrap(), SubmitOutcome::Discarded));
    assert_eq!(session.status().await, GenerationStatus::Cancelled);

    assert!(session.acknowledge().await);
    assert_eq!(session.status().await, GenerationStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn caller_giving_up_leaves_session_ready() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("sunset").await;

    // The service never answers; the caller stops waiting first.
    let waited = tokio::time::timeout(Duration::from_millis(100), session.generate_image()).await;
    assert!(waited.is_err());

    assert!(!session.is_submitting().await);
    assert_eq!(session.status().await, GenerationStatus::Cancelled);

    service.release_one();
    assert!(matches!(
        session.generate_image().await,
        SubmitOutcome::Finished(GenerationStatus::Succeeded { .. })
    ));
    assert_eq!(service.calls(), vec!["sunset", "sunset"]);
}

#[tokio::test]
async fn aborted_task_leaves_session_ready() {
    let service = GatedService::new();
    let session = session_with(service.clone());
    session.set_prompt("sunset").await;

    let pending = spawn_generate(&session);
    service.started.notified().await;
    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());

    assert!(!session.is_submitting().await);
    service.release_one();
    assert!(matches!(
        session.generate_image().await,
        SubmitOutcome::Finished(GenerationStatus::Succeeded { .. })
    ));
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_session_round_trip() {
    let usage = UsageMiddleware::new();
    let mut client = ImageClient::new().with_middleware(usage.clone());
    client.register_provider(DryRunAdapter::new());
    let session = Session::new(
        client,
        PromptPolicy {
            clear_on_success: true,
            ..PromptPolicy::default()
        },
    );

    session.set_prompt("Both Angel and Evil").await;
    let outcome = session.generate_image().await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Finished(GenerationStatus::Succeeded { .. })
    ));
    assert_eq!(session.prompt().await, "");
    assert_eq!(usage.succeeded(), 1);
}
