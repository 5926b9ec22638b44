//! Server module for Agentic
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration validation
//! - `background_tasks`: Memory store sweeper
//! - `init`: Collaborator wiring and the main run loop

mod background_tasks;
pub mod config;
mod init;
mod loader;
mod validation;

pub use init::{
    build_collaborators, build_llm, build_services, build_store, orchestrator_config, run,
    StoreHandles,
};
pub use loader::{environment_name, load_config, DEFAULT_CONFIG};
pub use validation::validate_production_config;
