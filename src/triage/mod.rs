//! Triage ordering for the waiting room
//!
//! This module maps pain scores to priority tiers and ranks the waiting set
//! into a queue with projected wait times.

pub mod estimator;
pub mod pain;

// Re-export commonly used types
pub use estimator::{locate, QueueSnapshot, TriageQueueEstimator};
pub use pain::{coerce_pain_score, stored_pain_level, tier_for_pain};
