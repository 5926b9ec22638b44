//! Error types for agentic-tools

use thiserror::Error;

/// Collaborator client error type
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream answered with a non-2xx status
    #[error("http {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream answered with something we could not read
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client is missing required settings
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry of an idempotent request could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status, when the failure came from one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
