//! Agent handlers
//!
//! One handler per [`AgentType`], looked up through a static table. Every
//! handler answers a single `handle` call; multi-turn handlers read the
//! caller state from the request.

mod animal;
mod calendar;
mod documents;
mod general;
mod lookup;
mod post;

#[cfg(test)]
mod tests;

pub use animal::{CatAgent, DogAgent};
pub use calendar::CalendarAgent;
pub use documents::{CoverLetterAgent, DocumentAgent, ResumeAgent};
pub use general::{EumAgent, GeneralAgent};
pub use lookup::{EventAgent, JobSearchAgent, LocationAgent, WeatherAgent};
pub use post::PostAgent;

use crate::calendar::CalendarService;
use crate::conversation::{ConversationEngine, ConversationStore, CoverLetterFlow, ResumeFlow};
use crate::error::{Error, Result, UserFriendlyError};
use crate::janitor::ArtifactJanitor;
use crate::post::PostService;
use crate::types::{AgentRequest, AgentResponse, AgentType};
use agentic_llm::LlmGateway;
use agentic_tools::{
    AnimalApi, CalendarBackend, DocumentRenderer, ObjectStorage, PlaceSearch, PostPublisher,
    ProfileService, WeatherProvider, WebSearch,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A handler for one agent type
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Agent type served
    fn agent_type(&self) -> AgentType;

    /// Handle one query
    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse>;
}

/// Everything the standard handlers are built from
#[derive(Clone)]
pub struct Collaborators {
    /// Language model
    pub llm: LlmGateway,
    /// Calendar backend
    pub calendar: Arc<dyn CalendarBackend>,
    /// Artifact storage
    pub storage: Arc<dyn ObjectStorage>,
    /// HTML to PDF
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Community publisher
    pub publisher: Arc<dyn PostPublisher>,
    /// User profile service
    pub profile: Option<Arc<dyn ProfileService>>,
    /// Web search
    pub web_search: Option<Arc<dyn WebSearch>>,
    /// Place search
    pub places: Option<Arc<dyn PlaceSearch>>,
    /// Weather
    pub weather: Arc<dyn WeatherProvider>,
    /// Animal images and facts
    pub animals: Arc<dyn AnimalApi>,
    /// Conversation state
    pub store: Arc<dyn ConversationStore>,
    /// Deferred artifact deletion
    pub janitor: Arc<ArtifactJanitor>,
    /// How long artifacts stay downloadable
    pub artifact_ttl: Duration,
}

impl Collaborators {
    /// Résumé engine over the shared store
    #[must_use]
    pub fn resume_engine(&self) -> Arc<ConversationEngine<ResumeFlow>> {
        Arc::new(
            ConversationEngine::new(
                ResumeFlow::new(self.llm.clone()),
                self.store.clone(),
                self.renderer.clone(),
                self.storage.clone(),
                self.janitor.clone(),
            )
            .with_artifact_ttl(self.artifact_ttl),
        )
    }

    /// Cover-letter engine over the shared store
    #[must_use]
    pub fn cover_letter_engine(&self) -> Arc<ConversationEngine<CoverLetterFlow>> {
        Arc::new(
            ConversationEngine::new(
                CoverLetterFlow::new(self.llm.clone()),
                self.store.clone(),
                self.renderer.clone(),
                self.storage.clone(),
                self.janitor.clone(),
            )
            .with_artifact_ttl(self.artifact_ttl),
        )
    }
}

/// Static table of handlers keyed by agent type
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<AgentType, Arc<dyn AgentHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every agent type
    #[must_use]
    pub fn standard(collab: &Collaborators) -> Self {
        let llm = &collab.llm;
        let mut registry = Self::new();

        registry.register(Arc::new(GeneralAgent::new(llm.clone(), collab.profile.clone())));
        registry.register(Arc::new(CalendarAgent::new(CalendarService::new(
            llm.clone(),
            collab.calendar.clone(),
        ))));
        registry.register(Arc::new(ResumeAgent::new(collab.resume_engine())));
        registry.register(Arc::new(CoverLetterAgent::new(collab.cover_letter_engine())));
        registry.register(Arc::new(PostAgent::new(
            PostService::new(llm.clone(), collab.publisher.clone()),
            collab.store.clone(),
        )));
        registry.register(Arc::new(WeatherAgent::new(llm.clone(), collab.weather.clone())));
        registry.register(Arc::new(EventAgent::new(llm.clone(), collab.web_search.clone())));
        registry.register(Arc::new(JobSearchAgent::new(
            collab.web_search.clone(),
            collab.profile.clone(),
        )));
        registry.register(Arc::new(LocationAgent::new(collab.places.clone())));
        registry.register(Arc::new(DogAgent::new(collab.animals.clone())));
        registry.register(Arc::new(CatAgent::new(collab.animals.clone())));
        registry.register(Arc::new(EumAgent::new(llm.clone())));

        registry
    }

    /// Register a handler, replacing any previous one for its type
    pub fn register(&mut self, handler: Arc<dyn AgentHandler>) {
        let agent_type = handler.agent_type();
        debug!(agent = %agent_type, "Registering agent handler");
        self.handlers.insert(agent_type, handler);
    }

    /// Handler for `agent_type`
    #[must_use]
    pub fn get(&self, agent_type: AgentType) -> Option<Arc<dyn AgentHandler>> {
        self.handlers.get(&agent_type).cloned()
    }

    /// Registered agent types in enum order
    #[must_use]
    pub fn agent_types(&self) -> Vec<AgentType> {
        AgentType::ALL
            .iter()
            .copied()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }

    /// Handler for `agent_type`, or the general handler when none is registered
    pub fn resolve(&self, agent_type: AgentType) -> Result<Arc<dyn AgentHandler>> {
        self.get(agent_type)
            .or_else(|| {
                debug!(agent = %agent_type, "No handler registered, using general");
                self.get(AgentType::General)
            })
            .ok_or_else(|| Error::Configuration("no general agent registered".to_string()))
    }

    /// Run the request through the resolved handler
    pub async fn dispatch(
        &self,
        agent_type: AgentType,
        request: &AgentRequest,
    ) -> Result<AgentResponse> {
        self.resolve(agent_type)?.handle(request).await
    }
}

/// Handler-level failure response: user-facing text plus the error kind
pub(crate) fn failure(error: &Error) -> AgentResponse {
    let response = AgentResponse::error(error.user_message())
        .with_metadata("error_kind", error.kind().as_str());
    match error.suggestion() {
        Some(suggestion) => response.with_metadata("suggestion", suggestion),
        None => response,
    }
}
