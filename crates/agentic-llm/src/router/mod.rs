//! Router - provider abstraction and two-tier model selection
//!
//! # Module Structure
//!
//! - `types`: core types (TaskType, ModelTier, TokenBudget)
//! - `config`: per-tier model names and the gateway timeout
//! - `provider`: LlmProvider trait definition
//! - `mock`: scripted provider for tests
//! - `gateway`: LlmGateway, the single entry point used by the core

mod config;
mod gateway;
mod mock;
mod provider;
mod types;

#[cfg(test)]
mod tests;

pub use config::GatewayConfig;
pub use gateway::LlmGateway;
pub use mock::MockProvider;
pub use provider::LlmProvider;
pub use types::{ModelTier, TaskType, TokenBudget};
