//! Error types for agentic-core
//!
//! Errors fall into the taxonomy exposed by [`Error::kind`]: upstream
//! dependency failures, caller protocol/state violations, unparseable model
//! output, and internal faults.

use crate::conversation::ConversationKind;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] agentic_llm::Error),

    /// Collaborator client error
    #[error("tool error: {0}")]
    Tool(#[from] agentic_tools::Error),

    /// Caller supplied a state the conversation cannot accept
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A conversation of this kind is already running for the user
    #[error("{kind} conversation already in progress for {user_id}")]
    ConversationActive {
        /// User id
        user_id: String,
        /// Conversation kind
        kind: ConversationKind,
    },

    /// No running conversation of this kind for the user
    #[error("no {kind} conversation for {user_id}")]
    ConversationNotFound {
        /// User id
        user_id: String,
        /// Conversation kind
        kind: ConversationKind,
    },

    /// Authorization token is malformed
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Structured output could not be read
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (Redis, serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// LLM or external API unreachable, failing or timing out
    Upstream,
    /// Caller error: bad state, conflicting or missing conversation, bad token
    Protocol,
    /// Output that could not be decoded
    Parsing,
    /// Everything else
    Internal,
}

impl ErrorKind {
    /// Stable label for metadata and logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Protocol => "protocol",
            Self::Parsing => "parsing",
            Self::Internal => "internal",
        }
    }
}

impl Error {
    /// Where this error sits in the taxonomy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Llm(agentic_llm::Error::Parse(_)) | Self::Parse(_) => ErrorKind::Parsing,
            Self::Llm(_) => ErrorKind::Upstream,
            Self::Tool(agentic_tools::Error::InvalidInput(_)) => ErrorKind::Protocol,
            Self::Tool(_) => ErrorKind::Upstream,
            Self::InvalidState(_)
            | Self::ConversationActive { .. }
            | Self::ConversationNotFound { .. }
            | Self::InvalidToken(_) => ErrorKind::Protocol,
            Self::Configuration(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Self::Internal(format!("redis: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization: {e}"))
    }
}

/// Trait for user-facing error text
///
/// Messages never include upstream bodies or identifiers.
pub trait UserFriendlyError {
    /// Short message suitable for the end user
    fn user_message(&self) -> String;

    /// What the user can do about it, if anything
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Llm(agentic_llm::Error::Timeout(_)) | Error::Tool(agentic_tools::Error::Timeout(_)) => {
                "The service took too long to answer.".to_string()
            }
            Error::Llm(agentic_llm::Error::RateLimit) => {
                "The assistant is busy right now.".to_string()
            }
            Error::Llm(_) => "The assistant could not process your request.".to_string(),
            Error::Tool(_) => "An external service is not responding correctly.".to_string(),
            Error::InvalidState(_) => "Invalid state. Please start over.".to_string(),
            Error::ConversationActive { kind, .. } => {
                format!("A {} conversation is already in progress.", kind.display_name())
            }
            Error::ConversationNotFound { kind, .. } => {
                format!("There is no {} conversation in progress.", kind.display_name())
            }
            Error::InvalidToken(_) => "Your login token is invalid.".to_string(),
            Error::Parse(_) => "The answer could not be understood.".to_string(),
            Error::Configuration(_) | Error::Internal(_) => {
                "Something went wrong on our side.".to_string()
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Llm(_) | Error::Tool(_) => Some("Please try again in a moment.".to_string()),
            Error::InvalidState(_) | Error::ConversationNotFound { .. } => {
                Some("Send your request again with state \"first\".".to_string())
            }
            Error::ConversationActive { .. } => {
                Some("Finish or wait for the current conversation to expire.".to_string())
            }
            Error::InvalidToken(_) => Some("Sign in again and retry.".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
