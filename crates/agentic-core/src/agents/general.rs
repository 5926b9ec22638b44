//! Open conversation and the service guide

use super::AgentHandler;
use crate::error::Result;
use crate::types::{AgentRequest, AgentResponse, AgentType};
use agentic_llm::{LlmGateway, TaskType};
use agentic_tools::ProfileService;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const GENERAL_SYSTEM: &str = "You are a friendly assistant for people living in Korea. \
    Answer briefly and concretely in English.";

const EUM_SYSTEM: &str = "You are the guide for the Eum app, a service for foreigners living \
    in Korea. The app offers: a calendar (add, delete, edit and check events), résumé and \
    cover-letter writing with a downloadable PDF, community posts on travel, residence, \
    study abroad and employment boards, weather, local events and festivals, job search, \
    nearby places, and dog and cat pictures. Explain which feature fits the question and \
    how to use it. Answer in English.";

/// Catch-all conversation, personalised with the user's profile when available
pub struct GeneralAgent {
    llm: LlmGateway,
    profile: Option<Arc<dyn ProfileService>>,
}

impl GeneralAgent {
    /// Create the agent
    pub fn new(llm: LlmGateway, profile: Option<Arc<dyn ProfileService>>) -> Self {
        Self { llm, profile }
    }

    /// Profile summary, or nothing when the lookup is unavailable
    async fn user_context(&self, token: &str) -> Option<String> {
        let profile = self.profile.as_ref()?;
        if token.is_empty() {
            return None;
        }
        match profile.profile(token).await {
            Ok(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map).to_string()),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Profile lookup failed, answering without it");
                None
            }
        }
    }
}

#[async_trait]
impl AgentHandler for GeneralAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::General
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let system = match self.user_context(&request.token).await {
            Some(context) => format!("{GENERAL_SYSTEM}\nAbout the user: {context}"),
            None => GENERAL_SYSTEM.to_string(),
        };
        let answer = self
            .llm
            .generate_with_system(TaskType::Conversation, &system, &request.english_query)
            .await?;
        Ok(AgentResponse::text(answer.trim()))
    }
}

/// Explains what the service can do
pub struct EumAgent {
    llm: LlmGateway,
}

impl EumAgent {
    /// Create the agent
    #[must_use]
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AgentHandler for EumAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Eum
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let answer = self
            .llm
            .generate_with_system(TaskType::Conversation, EUM_SYSTEM, &request.english_query)
            .await?;
        Ok(AgentResponse::text(answer.trim()).with_metadata("guide", true))
    }
}
