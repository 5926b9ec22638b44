//! Résumé and cover-letter agents
//!
//! Both drive a [`ConversationEngine`] with the caller state as the
//! ordering token.

use super::{failure, AgentHandler};
use crate::conversation::{
    ConversationEngine, ConversationFlow, ConversationStep, CoverLetterFlow, ResumeFlow,
    TurnOutcome,
};
use crate::error::Result;
use crate::types::{AgentRequest, AgentResponse, AgentType};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Four-step document conversation behind `/agentic`
pub struct DocumentAgent<F: ConversationFlow> {
    engine: Arc<ConversationEngine<F>>,
}

/// Résumé conversation
pub type ResumeAgent = DocumentAgent<ResumeFlow>;

/// Cover-letter conversation
pub type CoverLetterAgent = DocumentAgent<CoverLetterFlow>;

impl<F: ConversationFlow> DocumentAgent<F> {
    /// Create the agent over a shared engine
    #[must_use]
    pub fn new(engine: Arc<ConversationEngine<F>>) -> Self {
        Self { engine }
    }

    async fn turn(&self, request: &AgentRequest) -> Result<TurnOutcome> {
        match ConversationStep::parse(&request.state)? {
            ConversationStep::First => self.engine.start(&request.uid).await,
            step => {
                self.engine
                    .respond(&request.uid, step, &request.query)
                    .await
            }
        }
    }
}

#[async_trait]
impl<F: ConversationFlow + 'static> AgentHandler for DocumentAgent<F> {
    fn agent_type(&self) -> AgentType {
        self.engine.kind().agent_type()
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let kind = self.engine.kind();
        Ok(match self.turn(request).await {
            Ok(TurnOutcome::Asked {
                next_step,
                question,
            }) => AgentResponse::text(question)
                .with_state(next_step.as_str())
                .with_metadata("conversation", kind.as_str()),
            Ok(TurnOutcome::Completed { download_url }) => {
                info!(uid = %request.uid, kind = %kind.as_str(), "Document delivered");
                AgentResponse::text(format!(
                    "Your {} is ready. Download it here: {download_url}",
                    kind.display_name()
                ))
                .with_state(ConversationStep::First.as_str())
                .with_metadata("conversation", kind.as_str())
                .with_metadata("is_completed", true)
                .with_metadata("download_url", download_url.clone())
                .with_url(download_url)
            }
            Err(e) => {
                warn!(uid = %request.uid, kind = %kind.as_str(), error = %e, "Conversation turn failed");
                failure(&e).with_metadata("conversation", kind.as_str())
            }
        })
    }
}
