//! Orchestrator - the `/agentic` pipeline
//!
//! translate → route (continuation or classify) → dispatch → translate back
//! → assemble. Every failure ends in a well-formed envelope.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `core`: `Orchestrator` struct and builder methods
//! - `process`: the request pipeline
//! - `envelope`: response assembly and token validation

mod config;
mod core;
mod envelope;
mod process;


pub use config::{OrchestratorConfig, DEFAULT_APOLOGY};
pub use core::Orchestrator;
pub use envelope::validate_token;
