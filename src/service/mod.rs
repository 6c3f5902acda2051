//! Service layer for the triage service
//!
//! This module contains the application state, the triage operations and
//! health reporting for the production service.

pub mod app;
pub mod health;
pub mod triage;

pub use app::{AppState, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
pub use triage::{AdmitRequest, CheckInReceipt, CheckInRequest, StatusOutcome, TriageService};
