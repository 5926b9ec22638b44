//! Production configuration validation

use super::config::{AppConfig, ConversationBackend};
use super::loader::environment_name;
use anyhow::{bail, Result};
use tracing::warn;

/// Validate configuration for production security
///
/// Settings that only weaken a deployment produce warnings; settings the
/// service cannot run with are errors.
pub fn validate_production_config(config: &AppConfig) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        bail!("llm.api_key is not set (AGENTIC_LLM__API_KEY)");
    }

    if !environment_name().eq_ignore_ascii_case("production") {
        return Ok(());
    }

    for warning in production_warnings(config) {
        warn!("SECURITY WARNING: {warning}");
    }
    Ok(())
}

fn production_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.server.host == "0.0.0.0" {
        warnings.push(
            "Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy."
                .to_string(),
        );
    }

    match config.conversation.backend {
        ConversationBackend::Memory => warnings.push(
            "Conversation state is kept in process memory. \
             Conversations are lost on restart and not shared between instances."
                .to_string(),
        ),
        ConversationBackend::Redis => {
            if config.redis.url.starts_with("redis://") && !config.redis.url.contains('@') {
                warnings.push(
                    "Redis connection appears to have no authentication. Consider enabling Redis AUTH."
                        .to_string(),
                );
            }
        }
    }

    if config.storage.access_token.is_none() {
        warnings.push("Artifact storage has no access token configured.".to_string());
    }

    warnings
}
