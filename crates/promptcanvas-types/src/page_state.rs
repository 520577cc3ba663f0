//! Prompt draft plus the single-flight generation state machine.
//!
//! `PageState` is synchronous and free of I/O: callers begin a
//! submission, perform the service call themselves, and feed the result back
//! through [`PageState::complete`]. The browser handle and the native
//! `Session` both drive the same machine.

use serde::{Deserialize, Serialize};

use crate::{Artifact, CanvasError, GenerationFailure, GenerationStatus, Result};

/// Default upper bound on prompt length, in Unicode scalar values.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 1000;

// ---------------------------------------------------------------------------
// PromptPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPolicy {
    pub max_chars: usize,
    /// Clear the draft once a generation succeeds.
    pub clear_on_success: bool,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_PROMPT_CHARS,
            clear_on_success: false,
        }
    }
}

impl PromptPolicy {
    /// Check that `text` may be submitted. Whitespace-only text counts as empty.
    pub fn validate(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(CanvasError::EmptyPrompt);
        }
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(CanvasError::PromptTooLong {
                len,
                max: self.max_chars,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PromptDraft
// ---------------------------------------------------------------------------

/// The prompt currently being edited. Its text is what the input displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDraft {
    text: String,
}

impl PromptDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Handed out by [`PageState::begin_generate`]. The prompt is a snapshot taken
/// at submit time, so edits made while the request is in flight do not leak
/// into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: u64,
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// PageState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PageState {
    draft: PromptDraft,
    status: GenerationStatus,
    policy: PromptPolicy,
    next_ticket: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(PromptPolicy::default())
    }
}

impl PageState {
    pub fn new(policy: PromptPolicy) -> Self {
        Self {
            draft: PromptDraft::new(),
            status: GenerationStatus::Idle,
            policy,
            next_ticket: 0,
        }
    }

    pub fn prompt(&self) -> &str {
        self.draft.text()
    }

    pub fn draft(&self) -> &PromptDraft {
        &self.draft
    }

    /// Replace the draft text. No validation happens here.
    pub fn set_prompt(&mut self, next: impl Into<String>) {
        self.draft.set(next);
    }

    pub fn is_submitting(&self) -> bool {
        self.status.is_submitting()
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn policy(&self) -> &PromptPolicy {
        &self.policy
    }

    /// Start a generation for the current draft.
    ///
    /// Fails with `ConcurrentSubmit` while a request is in flight, and with
    /// `EmptyPrompt` / `PromptTooLong` when the draft violates the policy. A
    /// rejected call leaves the state untouched.
    pub fn begin_generate(&mut self) -> Result<Submission> {
        if self.status.is_submitting() {
            return Err(CanvasError::ConcurrentSubmit);
        }
        self.policy.validate(self.draft.text())?;

        self.next_ticket += 1;
        let submission = Submission {
            ticket: self.next_ticket,
            prompt: self.draft.text().to_owned(),
        };
        tracing::debug!(
            ticket = submission.ticket,
            chars = self.draft.char_count(),
            "generation submitted"
        );
        self.status = GenerationStatus::Submitting {
            ticket: submission.ticket,
            prompt: submission.prompt.clone(),
        };
        Ok(submission)
    }

    /// Record the service's answer for `ticket`.
    ///
    /// Returns `false` and changes nothing when `ticket` is not the request
    /// currently in flight (cancelled, superseded, or never issued).
    pub fn complete(
        &mut self,
        ticket: u64,
        result: std::result::Result<Artifact, GenerationFailure>,
    ) -> bool {
        match self.status {
            GenerationStatus::Submitting { ticket: current, .. } if current == ticket => {}
            _ => {
                tracing::debug!(
                    ticket,
                    status = self.status.label(),
                    "ignoring completion for a request that is no longer in flight"
                );
                return false;
            }
        }

        self.status = match result {
            Ok(artifact) => {
                if self.policy.clear_on_success {
                    self.draft.clear();
                }
                GenerationStatus::Succeeded { artifact }
            }
            Err(error) => GenerationStatus::Failed { error },
        };
        true
    }

    /// Abandon the in-flight request. Its completion will be ignored.
    pub fn cancel(&mut self) -> bool {
        if !self.status.is_submitting() {
            return false;
        }
        self.status = GenerationStatus::Cancelled;
        true
    }

    /// Cancel the request for `ticket` if it is still the one in flight.
    /// Used when whoever was waiting on that request has gone away.
    pub fn abandon(&mut self, ticket: u64) -> bool {
        match self.status {
            GenerationStatus::Submitting { ticket: current, .. } if current == ticket => {
                self.status = GenerationStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Return a finished request to `Idle`.
    pub fn acknowledge(&mut self) -> bool {
        match self.status {
            GenerationStatus::Succeeded { .. }
            | GenerationStatus::Failed { .. }
            | GenerationStatus::Cancelled => {
                self.status = GenerationStatus::Idle;
                true
            }
            GenerationStatus::Idle | GenerationStatus::Submitting { .. } => false,
        }
    }
}
