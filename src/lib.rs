// ABOUTME: Library root for sortie - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod types;
pub mod versioning;
