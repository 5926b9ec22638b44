//! Gateway configuration

use super::types::ModelTier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-tier model names and the hard timeout for one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Model for the lightweight tier
    pub lightweight_model: String,
    /// Model for the high-performance tier
    pub high_performance_model: String,
    /// Upper bound for a single completion, in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            lightweight_model: "gpt-4o-mini".to_string(),
            high_performance_model: "gpt-4o".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// Model name configured for a tier
    #[must_use]
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Lightweight => &self.lightweight_model,
            ModelTier::HighPerformance => &self.high_performance_model,
        }
    }

    /// Timeout as a `Duration`, never zero
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
