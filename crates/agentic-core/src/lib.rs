//! Agentic Core - query routing and conversation state machines
//!
//! This crate provides the request pipeline behind `/agentic`:
//! - Translation: language detection and English working query
//! - Classifier: closed-set agent type selection
//! - Agents: one handler per agent type behind a static registry
//! - Calendar: add / delete / edit / check against the calendar backend
//! - Conversation: multi-turn résumé, cover-letter and post flows
//! - Orchestrator: translate → classify → dispatch → translate back
//! - Janitor: cancellable deferred deletion of uploaded artifacts
//! - Shutdown: coordinated graceful shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod calendar;
pub mod classifier;
pub mod conversation;
pub mod error;
pub mod janitor;
pub mod orchestrator;
pub mod post;
pub mod shutdown;
pub mod translation;
pub mod types;

#[cfg(test)]
mod testing;

pub use agents::{AgentHandler, Collaborators, HandlerRegistry};
pub use classifier::Classifier;
pub use conversation::{
    ConversationEngine, ConversationKind, ConversationState, ConversationStep, ConversationStore,
    MemoryConversationStore, RedisConversationStore, ResumeConversationService, TurnView,
};
pub use error::{Error, ErrorKind, Result, UserFriendlyError};
pub use janitor::ArtifactJanitor;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use shutdown::{ShutdownController, ShutdownPhase};
pub use translation::{heuristic_detect, Translator};
pub use types::{
    AgentRequest, AgentResponse, AgentType, AgenticResponse, ClassificationResult,
    TranslationResult,
};
