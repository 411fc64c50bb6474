//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite document store adapters
//! - Ollama: generator client for dialogue turns
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod ollama;
pub mod persistence;
pub mod state;
