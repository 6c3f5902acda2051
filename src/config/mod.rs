//! Configuration management for the triage service
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;
pub mod store;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings, StoreSettings, TriageSettings};
pub use store::StoreBackend;
