//! HTTP server module for the triage service.
//!
//! An axum router exposes check-in, status lookup, the staff view and the
//! health and metrics probes on one listener. Handlers parse and validate
//! requests, then delegate to [`crate::service::TriageService`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;

pub use error::{ApiError, AppError};
pub use router::create_router;

use crate::service::AppState;
use std::sync::Arc;

/// Application state shared by every handler
pub type SharedState = Arc<AppState>;
