//! Community post agent
//!
//! Turn one classifies the request and asks for a title; turn two composes
//! and publishes. The classification waits in the conversation store in
//! between.

use super::{failure, AgentHandler};
use crate::conversation::{ConversationKind, ConversationState, ConversationStep, ConversationStore};
use crate::error::{Error, Result};
use crate::post::{PostClassification, PostService};
use crate::types::{AgentRequest, AgentResponse, AgentType};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

const KIND: ConversationKind = ConversationKind::Post;

/// Two-turn community post creation
pub struct PostAgent {
    service: PostService,
    store: Arc<dyn ConversationStore>,
}

impl PostAgent {
    /// Create the agent
    pub fn new(service: PostService, store: Arc<dyn ConversationStore>) -> Self {
        Self { service, store }
    }

    async fn begin(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let classification = self.service.first_query(&request.english_query).await;

        let mut fields = Map::new();
        fields.insert("query".to_string(), Value::String(request.query.clone()));
        fields.insert("lang_code".to_string(), Value::String(request.lang_code.clone()));
        fields.insert(
            "classification".to_string(),
            serde_json::to_value(&classification)?,
        );
        let mut state = ConversationState::new(&request.uid, KIND, ConversationStep::Second);
        state.merge_fields(fields);

        if !self.store.create_if_absent(&state).await? {
            return Err(Error::ConversationActive {
                user_id: request.uid.clone(),
                kind: KIND,
            });
        }
        info!(uid = %request.uid, category = %classification.category, "Post started");

        Ok(AgentResponse::text(format!(
            "Your post will go under {} / {}. What title would you like to use?",
            classification.category, classification.tag
        ))
        .with_state(ConversationStep::Second.as_str())
        .with_metadata("conversation", KIND.as_str())
        .with_metadata("classification", serde_json::to_value(&classification)?))
    }

    async fn finish(&self, request: &AgentRequest, step: ConversationStep) -> Result<AgentResponse> {
        if !self.store.claim_turn(&request.uid, KIND).await? {
            return Err(Error::InvalidState(
                "this post is already being published".to_string(),
            ));
        }
        let finished = self.finish_claimed(request, step).await;
        if let Err(e) = self.store.release_turn(&request.uid, KIND).await {
            warn!(uid = %request.uid, error = %e, "Failed to release post turn");
        }
        finished
    }

    async fn finish_claimed(
        &self,
        request: &AgentRequest,
        step: ConversationStep,
    ) -> Result<AgentResponse> {
        let state = self
            .store
            .get(&request.uid, KIND)
            .await?
            .filter(ConversationState::is_active)
            .ok_or_else(|| Error::ConversationNotFound {
                user_id: request.uid.clone(),
                kind: KIND,
            })?;
        if state.step != step {
            return Err(Error::InvalidState(format!("expected {}, got {step}", state.step)));
        }

        let query = state
            .collected_fields
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let classification: PostClassification = state
            .collected_fields
            .get("classification")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let lang_code = state
            .collected_fields
            .get("lang_code")
            .and_then(Value::as_str)
            .filter(|code| !code.is_empty())
            .unwrap_or(&request.lang_code)
            .to_string();

        let published = self
            .service
            .second_query(&request.token, &query, &request.query, &classification, &lang_code)
            .await;

        // Published or not, the post cannot be resumed
        if let Err(e) = self.store.delete(&request.uid, KIND).await {
            warn!(uid = %request.uid, error = %e, "Failed to remove post conversation");
        }

        let (draft, response) = published?;
        Ok(AgentResponse::text(format!("Your post \"{}\" has been published.", draft.title))
            .with_state(ConversationStep::First.as_str())
            .with_metadata("conversation", KIND.as_str())
            .with_metadata("post", serde_json::to_value(&draft)?)
            .with_metadata("publish_response", response))
    }

    async fn turn(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let step = ConversationStep::parse(&request.state)?;
        if step == ConversationStep::First {
            return self.begin(request).await;
        }
        if KIND.next(step) != Some(ConversationStep::Completed) {
            return Err(Error::InvalidState(format!("{step} is not a post step")));
        }
        self.finish(request, step).await
    }
}

#[async_trait]
impl AgentHandler for PostAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Post
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        match self.turn(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(uid = %request.uid, error = %e, "Post turn failed");
                Ok(failure(&e).with_metadata("conversation", KIND.as_str()))
            }
        }
    }
}
