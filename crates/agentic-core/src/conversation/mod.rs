//! Multi-turn conversations
//!
//! Résumé and cover letter run four steps (`first` → `second` → `third` →
//! `fourth`); posts run two. The caller's `state` is the ordering token and
//! the [`ConversationStore`] holds the richer per-user record between
//! requests.

mod document;
mod engine;
mod flows;
mod service;
mod state;
mod store;


pub use engine::{ConversationEngine, ConversationFlow, TurnOutcome};
pub use flows::{CoverLetterFlow, ResumeFlow};
pub use service::{ResumeConversationService, TurnView};
pub use state::{state_key, ConversationKind, ConversationState, ConversationStep};
pub use store::{
    ConversationStore, MemoryConversationStore, RedisConversationStore, DEFAULT_CONVERSATION_TTL,
};

#[cfg(test)]
pub(crate) use flows::{COVER_LETTER_INSTRUCTION, EXTRACT_INSTRUCTION};
