//! Orchestrator core structure

use crate::agents::{Collaborators, HandlerRegistry};
use crate::classifier::Classifier;
use crate::conversation::ConversationStore;
use crate::translation::Translator;
use agentic_llm::LlmGateway;
use std::sync::Arc;
use tracing::info;

use super::config::OrchestratorConfig;

/// Single entry point behind `/agentic`
pub struct Orchestrator {
    pub(crate) translator: Translator,
    pub(crate) classifier: Classifier,
    pub(crate) registry: HandlerRegistry,
    pub(crate) store: Arc<dyn ConversationStore>,
    pub(crate) config: OrchestratorConfig,
    provider: String,
}

impl Orchestrator {
    /// Create an orchestrator over an explicit handler table
    #[must_use]
    pub fn new(
        llm: LlmGateway,
        registry: HandlerRegistry,
        store: Arc<dyn ConversationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        info!(
            provider = %llm.provider_name(),
            agents = registry.agent_types().len(),
            "Orchestrator ready"
        );
        Self {
            provider: llm.provider_name().to_string(),
            translator: Translator::new(llm.clone()),
            classifier: Classifier::new(llm),
            registry,
            store,
            config,
        }
    }

    /// Create an orchestrator with the standard handlers
    #[must_use]
    pub fn from_collaborators(collab: &Collaborators, config: OrchestratorConfig) -> Self {
        Self::new(
            collab.llm.clone(),
            HandlerRegistry::standard(collab),
            collab.store.clone(),
            config,
        )
    }

    /// Replace the handler table
    #[must_use]
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Handler table
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Name of the LLM provider behind the gateway
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    /// Conversation store used for continuation routing
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }
}
