//! Conversation kinds, steps and the persisted state record

use crate::error::{Error, Result};
use crate::types::AgentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which multi-turn flow a conversation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Four-step résumé
    Resume,
    /// Four-step cover letter
    CoverLetter,
    /// Two-step community post
    Post,
}

impl ConversationKind {
    /// Every kind
    pub const ALL: [ConversationKind; 3] = [Self::Resume, Self::CoverLetter, Self::Post];

    /// Storage label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "cover_letter",
            Self::Post => "post",
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Resume => "résumé",
            Self::CoverLetter => "cover letter",
            Self::Post => "post",
        }
    }

    /// Agent that owns the flow
    #[must_use]
    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::Resume => AgentType::Resume,
            Self::CoverLetter => AgentType::CoverLetter,
            Self::Post => AgentType::Post,
        }
    }

    /// Conversation kind for a conversational agent
    #[must_use]
    pub fn for_agent(agent: AgentType) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.agent_type() == agent)
    }

    /// Transition table: the step that follows a caller step
    ///
    /// `None` means the step is not part of this flow.
    #[must_use]
    pub fn next(&self, step: ConversationStep) -> Option<ConversationStep> {
        use ConversationStep::*;
        match (self, step) {
            (Self::Resume | Self::CoverLetter, First) => Some(Second),
            (Self::Resume | Self::CoverLetter, Second) => Some(Third),
            (Self::Resume | Self::CoverLetter, Third) => Some(Fourth),
            (Self::Resume | Self::CoverLetter, Fourth) => Some(Completed),
            (Self::Post, First) => Some(Second),
            (Self::Post, Second) => Some(Completed),
            _ => None,
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Position within a flow
///
/// Stored states name the step the caller is expected to send next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    /// Start; no answer yet
    First,
    /// Answer to the first question
    Second,
    /// Answer to the second question
    Third,
    /// Answer to the final question
    Fourth,
    /// Terminal
    Completed,
}

impl ConversationStep {
    /// Label used on the wire
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
            Self::Fourth => "fourth",
            Self::Completed => "completed",
        }
    }

    /// Parse a caller-supplied state
    ///
    /// `first` through `fourth` are accepted. An empty state and the
    /// orchestrator's default `general` both mean "start". Anything else,
    /// `completed` included, is an invalid state.
    pub fn parse(caller_state: &str) -> Result<Self> {
        match caller_state.trim().to_ascii_lowercase().as_str() {
            "" | "general" | "first" => Ok(Self::First),
            "second" => Ok(Self::Second),
            "third" => Ok(Self::Third),
            "fourth" => Ok(Self::Fourth),
            other => Err(Error::InvalidState(other.to_string())),
        }
    }

    /// Steps that answer a question
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Second | Self::Third | Self::Fourth)
    }
}

impl fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's in-progress conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Owner
    pub user_id: String,
    /// Flow
    pub kind: ConversationKind,
    /// Next step the caller must send
    pub step: ConversationStep,
    /// Fields parsed from the answers so far
    pub collected_fields: Map<String, Value>,
    /// Set once the artifact is delivered
    pub is_completed: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh conversation waiting for `step`
    #[must_use]
    pub fn new(user_id: impl Into<String>, kind: ConversationKind, step: ConversationStep) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            kind,
            step,
            collected_fields: Map::new(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Store key: `{user_id}:{kind}`
    #[must_use]
    pub fn key(&self) -> String {
        state_key(&self.user_id, self.kind)
    }

    /// Not yet completed
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    /// No answer has been recorded
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.collected_fields.is_empty()
    }

    /// Merge parsed fields; later answers overwrite earlier keys
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        self.collected_fields.extend(fields);
        self.updated_at = Utc::now();
    }

    /// Move to the next expected step
    pub fn advance(&mut self, step: ConversationStep) {
        self.step = step;
        self.is_completed = step == ConversationStep::Completed;
        self.updated_at = Utc::now();
    }
}

/// Store key for a user's conversation of `kind`
#[must_use]
pub fn state_key(user_id: &str, kind: ConversationKind) -> String {
    format!("{user_id}:{}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_caller_state() {
        assert_eq!(ConversationStep::parse("first").unwrap(), ConversationStep::First);
        assert_eq!(ConversationStep::parse(" Second ").unwrap(), ConversationStep::Second);
        assert_eq!(ConversationStep::parse("").unwrap(), ConversationStep::First);
        assert_eq!(ConversationStep::parse("general").unwrap(), ConversationStep::First);
        for invalid in ["fifth", "completed", "error", "1"] {
            assert!(matches!(
                ConversationStep::parse(invalid),
                Err(Error::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_transition_table() {
        use ConversationStep::*;
        let resume = ConversationKind::Resume;
        assert_eq!(resume.next(First), Some(Second));
        assert_eq!(resume.next(Fourth), Some(Completed));
        assert_eq!(resume.next(Completed), None);

        let post = ConversationKind::Post;
        assert_eq!(post.next(First), Some(Second));
        assert_eq!(post.next(Second), Some(Completed));
        assert_eq!(post.next(Third), None);
        assert_eq!(post.next(Fourth), None);
    }

    #[test]
    fn test_kind_agent_mapping() {
        for kind in ConversationKind::ALL {
            assert_eq!(ConversationKind::for_agent(kind.agent_type()), Some(kind));
        }
        assert_eq!(ConversationKind::for_agent(AgentType::Weather), None);
    }

    #[test]
    fn test_state_lifecycle() {
        let mut state =
            ConversationState::new("u1", ConversationKind::CoverLetter, ConversationStep::Second);
        assert_eq!(state.key(), "u1:cover_letter");
        assert!(state.is_active());
        assert!(state.is_untouched());

        let mut fields = Map::new();
        fields.insert("target_job".into(), json!("designer"));
        state.merge_fields(fields);
        state.advance(ConversationStep::Third);
        assert!(!state.is_untouched());
        assert!(state.is_active());

        state.advance(ConversationStep::Completed);
        assert!(state.is_completed);
        assert!(!state.is_active());
    }

    #[test]
    fn test_state_serde() {
        let state = ConversationState::new("u1", ConversationKind::Resume, ConversationStep::Third);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["kind"], "resume");
        assert_eq!(json["step"], "third");
        let back: ConversationState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
