//! Core types and configuration for itinera
//!
//! # Modules
//!
//! - `config`: Environment configuration and the env-file loader
//! - `types`: Domain types shared by the clients and the plan pipeline

pub mod config;
pub mod types;

// Re-exports
pub use config::{AppConfig, ConfigError};
pub use types::*;
