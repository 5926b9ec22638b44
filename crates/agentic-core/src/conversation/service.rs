//! Résumé conversation surface independent of `/agentic`
//!
//! The server keeps the ordering token here: callers only send answers.

use super::engine::{ConversationEngine, TurnOutcome};
use super::flows::ResumeFlow;
use super::state::{ConversationState, ConversationStep};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// One turn as seen by an API caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnView {
    /// Step the conversation is waiting for, or `first` once completed
    pub state: String,
    /// Next question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Link to the finished document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// The document was delivered
    pub is_completed: bool,
}

impl From<TurnOutcome> for TurnView {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Asked {
                next_step,
                question,
            } => Self {
                state: next_step.as_str().to_string(),
                question: Some(question),
                download_url: None,
                is_completed: false,
            },
            TurnOutcome::Completed { download_url } => Self {
                state: ConversationStep::First.as_str().to_string(),
                question: None,
                download_url: Some(download_url),
                is_completed: true,
            },
        }
    }
}

/// `start` / `respond` / `status` over the shared résumé engine
#[derive(Clone)]
pub struct ResumeConversationService {
    engine: Arc<ConversationEngine<ResumeFlow>>,
}

impl ResumeConversationService {
    /// Create the service over an engine shared with the résumé agent
    #[must_use]
    pub fn new(engine: Arc<ConversationEngine<ResumeFlow>>) -> Self {
        Self { engine }
    }

    /// Start a conversation and return the first question
    #[instrument(skip(self))]
    pub async fn start(&self, user_id: &str) -> Result<TurnView> {
        self.engine.start(user_id).await.map(TurnView::from)
    }

    /// Answer the pending question
    #[instrument(skip(self, answer))]
    pub async fn respond(&self, user_id: &str, answer: &str) -> Result<TurnView> {
        let state = self.engine.status(user_id).await?;
        self.engine
            .respond(user_id, state.step, answer)
            .await
            .map(TurnView::from)
    }

    /// Current state of the user's résumé conversation
    pub async fn status(&self, user_id: &str) -> Result<ConversationState> {
        self.engine.status(user_id).await
    }
}
