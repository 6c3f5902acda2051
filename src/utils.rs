//! Utility functions for the triage service

use crate::types::PatientCode;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Smallest generated patient code
pub const MIN_GENERATED_CODE: u32 = 1000;
/// Largest generated patient code
pub const MAX_GENERATED_CODE: u32 = 9999;

/// Generate a four-digit patient code for a check-in that did not bring one
pub fn generate_patient_code() -> PatientCode {
    let span = (MAX_GENERATED_CODE - MIN_GENERATED_CODE + 1) as u128;
    let offset = (Uuid::new_v4().as_u128() % span) as u32;
    (MIN_GENERATED_CODE + offset).to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Trim a free-text field, mapping blank input to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_four_digits() {
        for _ in 0..500 {
            let code = generate_patient_code();
            let value: u32 = code.parse().unwrap();
            assert!((MIN_GENERATED_CODE..=MAX_GENERATED_CODE).contains(&value));
            assert_eq!(code.len(), 4);
        }
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Ada ".to_string())), Some("Ada".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
