//! Orchestrator configuration

/// Fixed answer for any request the pipeline cannot complete
pub const DEFAULT_APOLOGY: &str =
    "Sorry, something went wrong while handling your request. Please try again.";

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Response text of the error envelope
    pub apology: String,
    /// Upper bound for one request in seconds (0 = no limit)
    pub max_request_secs: u64,
    /// Route continuation steps straight to the user's active conversation
    pub continuation_routing: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            apology: DEFAULT_APOLOGY.to_string(),
            max_request_secs: 120,
            continuation_routing: true,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the apology text
    #[must_use]
    pub fn with_apology(mut self, apology: impl Into<String>) -> Self {
        self.apology = apology.into();
        self
    }

    /// Set the request time limit
    #[must_use]
    pub fn with_max_request_secs(mut self, secs: u64) -> Self {
        self.max_request_secs = secs;
        self
    }

    /// Enable or disable continuation routing
    #[must_use]
    pub fn with_continuation_routing(mut self, enabled: bool) -> Self {
        self.continuation_routing = enabled;
        self
    }
}
