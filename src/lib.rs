//! Agentic server library
//!
//! HTTP surface and server wiring around `agentic-core`. The binary in
//! `main.rs` only parses the command line and calls [`server::run`].

#![forbid(unsafe_code)]

pub mod api;
pub mod server;
