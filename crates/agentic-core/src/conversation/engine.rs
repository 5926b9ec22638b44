//! Four-step conversation engine
//!
//! The engine owns the ordering rules and the artifact pipeline; a
//! [`ConversationFlow`] supplies the questions, the answer parsing and the
//! final document.

use super::state::{ConversationKind, ConversationState, ConversationStep};
use super::store::ConversationStore;
use crate::error::{Error, Result};
use crate::janitor::{ArtifactJanitor, DEFAULT_ARTIFACT_TTL};
use agentic_tools::{DocumentRenderer, ObjectStorage};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// What a concrete conversation asks, parses and produces
#[async_trait]
pub trait ConversationFlow: Send + Sync {
    /// Which conversation this is
    fn kind(&self) -> ConversationKind;

    /// The question answered by the caller's `step`
    fn question(&self, step: ConversationStep) -> Option<&'static str>;

    /// Turn a free-text answer into fields; never fails
    async fn parse_answer(&self, step: ConversationStep, answer: &str) -> Map<String, Value>;

    /// Assemble the collected fields into an HTML document
    async fn compose(&self, fields: &Map<String, Value>) -> Result<String>;
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A question was asked; the caller must answer with `next_step`
    Asked {
        /// Step the caller sends next
        next_step: ConversationStep,
        /// Question text
        question: String,
    },
    /// The document was delivered and the conversation removed
    Completed {
        /// Public link to the artifact
        download_url: String,
    },
}

/// Drives a [`ConversationFlow`] over the conversation store
pub struct ConversationEngine<F: ConversationFlow> {
    flow: F,
    store: Arc<dyn ConversationStore>,
    renderer: Arc<dyn DocumentRenderer>,
    storage: Arc<dyn ObjectStorage>,
    janitor: Arc<ArtifactJanitor>,
    artifact_ttl: Duration,
}

impl<F: ConversationFlow> ConversationEngine<F> {
    /// Create an engine
    pub fn new(
        flow: F,
        store: Arc<dyn ConversationStore>,
        renderer: Arc<dyn DocumentRenderer>,
        storage: Arc<dyn ObjectStorage>,
        janitor: Arc<ArtifactJanitor>,
    ) -> Self {
        Self {
            flow,
            store,
            renderer,
            storage,
            janitor,
            artifact_ttl: DEFAULT_ARTIFACT_TTL,
        }
    }

    /// How long uploaded artifacts stay available
    #[must_use]
    pub fn with_artifact_ttl(mut self, ttl: Duration) -> Self {
        self.artifact_ttl = ttl;
        self
    }

    /// The flow's conversation kind
    pub fn kind(&self) -> ConversationKind {
        self.flow.kind()
    }

    fn ask(&self, next_step: ConversationStep) -> Result<TurnOutcome> {
        let question = self.flow.question(next_step).ok_or_else(|| {
            Error::Internal(format!("{} flow has no question for {next_step}", self.kind()))
        })?;
        Ok(TurnOutcome::Asked {
            next_step,
            question: question.to_string(),
        })
    }

    fn not_found(&self, user_id: &str) -> Error {
        Error::ConversationNotFound {
            user_id: user_id.to_string(),
            kind: self.kind(),
        }
    }

    fn active(&self, user_id: &str) -> Error {
        Error::ConversationActive {
            user_id: user_id.to_string(),
            kind: self.kind(),
        }
    }

    /// Start a conversation and ask the first question
    ///
    /// Repeating the start before any answer re-asks the first question.
    /// A conversation that has recorded answers is never replaced.
    #[instrument(skip(self), fields(kind = %self.kind()))]
    pub async fn start(&self, user_id: &str) -> Result<TurnOutcome> {
        let kind = self.kind();
        let first_answer = kind
            .next(ConversationStep::First)
            .ok_or_else(|| Error::Internal(format!("{kind} flow cannot start")))?;

        if let Some(existing) = self.store.get(user_id, kind).await? {
            if existing.is_active() && existing.step == first_answer && existing.is_untouched() {
                debug!(user_id, "Conversation already started, repeating first question");
                return self.ask(first_answer);
            }
            if existing.is_active() {
                return Err(self.active(user_id));
            }
            self.store.delete(user_id, kind).await?;
        }

        let state = ConversationState::new(user_id, kind, first_answer);
        if !self.store.create_if_absent(&state).await? {
            return Err(self.active(user_id));
        }

        info!(user_id, "Conversation started");
        self.ask(first_answer)
    }

    /// Accept the caller's answer for `caller_step`
    ///
    /// One turn per conversation runs at a time; a request arriving while
    /// another holds the turn fails with `InvalidState`.
    #[instrument(skip(self, answer), fields(kind = %self.kind()))]
    pub async fn respond(
        &self,
        user_id: &str,
        caller_step: ConversationStep,
        answer: &str,
    ) -> Result<TurnOutcome> {
        if caller_step == ConversationStep::First {
            return self.start(user_id).await;
        }

        let kind = self.kind();
        if !self.store.claim_turn(user_id, kind).await? {
            warn!(user_id, step = %caller_step, "Concurrent turn rejected");
            return Err(Error::InvalidState(format!(
                "another {kind} turn is already in progress"
            )));
        }

        let outcome = self.respond_claimed(user_id, caller_step, answer).await;
        if let Err(e) = self.store.release_turn(user_id, kind).await {
            warn!(user_id, error = %e, "Failed to release conversation turn");
        }
        outcome
    }

    async fn respond_claimed(
        &self,
        user_id: &str,
        caller_step: ConversationStep,
        answer: &str,
    ) -> Result<TurnOutcome> {
        let kind = self.kind();
        let mut state = self
            .store
            .get(user_id, kind)
            .await?
            .filter(ConversationState::is_active)
            .ok_or_else(|| self.not_found(user_id))?;

        if state.step != caller_step {
            return Err(Error::InvalidState(format!(
                "expected {}, got {caller_step}",
                state.step
            )));
        }

        let next = kind.next(caller_step).ok_or_else(|| {
            Error::InvalidState(format!("{caller_step} is not a {kind} step"))
        })?;

        let fields = self.flow.parse_answer(caller_step, answer).await;
        debug!(user_id, step = %caller_step, fields = fields.len(), "Answer parsed");
        state.merge_fields(fields);

        if next == ConversationStep::Completed {
            return self.complete(state).await;
        }

        state.advance(next);
        self.store.put(&state).await?;
        self.ask(next)
    }

    /// Current state of the user's conversation
    pub async fn status(&self, user_id: &str) -> Result<ConversationState> {
        self.store
            .get(user_id, self.kind())
            .await?
            .ok_or_else(|| self.not_found(user_id))
    }

    /// Build, publish and forget; the state is removed whether or not
    /// delivery succeeds
    async fn complete(&self, mut state: ConversationState) -> Result<TurnOutcome> {
        let delivered = self.deliver(&state).await;

        state.advance(ConversationStep::Completed);
        if let Err(e) = self.store.delete(&state.user_id, state.kind).await {
            warn!(user_id = %state.user_id, error = %e, "Failed to remove completed conversation");
        }

        match delivered {
            Ok(download_url) => {
                info!(user_id = %state.user_id, "Conversation completed");
                Ok(TurnOutcome::Completed { download_url })
            }
            Err(e) => {
                error!(user_id = %state.user_id, error = %e, "Document delivery failed");
                Err(e)
            }
        }
    }

    async fn deliver(&self, state: &ConversationState) -> Result<String> {
        let html = self.flow.compose(&state.collected_fields).await?;
        let pdf = self.renderer.render_to_pdf(&html).await?;

        let key = artifact_key(state.kind, &state.user_id);
        let uploaded = self.storage.upload(&pdf, &key).await;
        if let Err(e) = tokio::fs::remove_file(&pdf).await {
            debug!(path = %pdf.display(), error = %e, "Could not remove rendered file");
        }
        let url = uploaded?;

        self.janitor.schedule_deletion(key, self.artifact_ttl);
        Ok(url)
    }
}

/// `{kind}/{user}/{uuid}.pdf` with the user id reduced to a safe charset
fn artifact_key(kind: ConversationKind, user_id: &str) -> String {
    let user: String = user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}/{}/{}.pdf", kind.as_str(), user, Uuid::new_v4())
}
