//! Core types for LLM routing

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Task Type
// ============================================================================

/// What a prompt is for; decides the tier and the token budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Intent / label classification
    Classification,
    /// Language detection and translation
    Translation,
    /// Free text to structured fields
    Extraction,
    /// Long-form content (documents, posts)
    Generation,
    /// General chat answers
    Conversation,
}

impl TaskType {
    /// Get the recommended model tier for this task type
    #[must_use]
    pub fn recommended_tier(&self) -> ModelTier {
        match self {
            Self::Classification | Self::Translation => ModelTier::Lightweight,
            Self::Extraction | Self::Generation | Self::Conversation => {
                ModelTier::HighPerformance
            }
        }
    }

    /// Get the default token budget for this task type
    ///
    /// - Classification: a single label (200 tokens)
    /// - Translation: similar length to input (1000 tokens)
    /// - Extraction: a JSON object (800 tokens)
    /// - Conversation: chat answer (1500 tokens)
    /// - Generation: full documents (3000 tokens)
    #[must_use]
    pub fn default_token_budget(&self) -> TokenBudget {
        match self {
            Self::Classification => TokenBudget::new(200, 0.0),
            Self::Translation => TokenBudget::new(1000, 0.2),
            Self::Extraction => TokenBudget::new(800, 0.1),
            Self::Conversation => TokenBudget::new(1500, 0.7),
            Self::Generation => TokenBudget::new(3000, 0.7),
        }
    }
}

// ============================================================================
// Model Tier
// ============================================================================

/// Model tier for cost/performance trade-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Fast and cheap: classification and translation
    Lightweight,
    /// Generation-heavy agent work
    HighPerformance,
}

impl ModelTier {
    /// Stable label used in logs and config
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lightweight => "lightweight",
            Self::HighPerformance => "high_performance",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Token Budget
// ============================================================================

/// Generation limits applied to a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl TokenBudget {
    /// Create a new token budget
    #[must_use]
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}
