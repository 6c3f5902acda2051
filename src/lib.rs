//! Triage Desk - Hospital triage check-in service
//!
//! This crate provides patient check-in with pain-based priority tiers, a
//! ranked waiting queue with projected wait times, and an HTTP API over a
//! pluggable patient store.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod service;
pub mod store;
pub mod triage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, TriageError};
pub use types::*;

// Re-export key components
pub use service::{AppState, TriageService};
pub use store::{InMemoryPatientStore, PatientStore, SqlitePatientStore};
pub use triage::TriageQueueEstimator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
