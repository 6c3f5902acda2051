//! Common types used throughout the triage service

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for patient records
pub type PatientId = i64;

/// Card number handed to a patient at check-in, used with the name to look up status
pub type PatientCode = String;

/// Priority tier assigned at triage
///
/// Labels the store returns that are not one of the three known tiers are
/// carried as `Unrecognized` and rank after every known tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriorityTier {
    Critical,
    Urgent,
    NonUrgent,
    Unrecognized(String),
}

impl PriorityTier {
    /// Ordering rank: critical 1, urgent 2, non-urgent 3, anything else 4
    pub fn rank(&self) -> u8 {
        match self {
            PriorityTier::Critical => 1,
            PriorityTier::Urgent => 2,
            PriorityTier::NonUrgent => 3,
            PriorityTier::Unrecognized(_) => 4,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PriorityTier::Critical => "critical",
            PriorityTier::Urgent => "urgent",
            PriorityTier::NonUrgent => "non-urgent",
            PriorityTier::Unrecognized(label) => label,
        }
    }

    /// Key of this tier in the `priority` table
    pub fn priority_id(&self) -> Option<i64> {
        match self {
            PriorityTier::NonUrgent => Some(1),
            PriorityTier::Urgent => Some(2),
            PriorityTier::Critical => Some(3),
            PriorityTier::Unrecognized(_) => None,
        }
    }

    pub fn from_priority_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(PriorityTier::NonUrgent),
            2 => Some(PriorityTier::Urgent),
            3 => Some(PriorityTier::Critical),
            _ => None,
        }
    }

    /// Parse one of the three known labels, case-insensitively
    pub fn parse_known(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" => Some(PriorityTier::Critical),
            "urgent" => Some(PriorityTier::Urgent),
            "non-urgent" | "non_urgent" | "nonurgent" => Some(PriorityTier::NonUrgent),
            _ => None,
        }
    }

    /// The three tiers known to the service, most urgent first
    pub fn known() -> [PriorityTier; 3] {
        [
            PriorityTier::Critical,
            PriorityTier::Urgent,
            PriorityTier::NonUrgent,
        ]
    }
}

impl From<String> for PriorityTier {
    fn from(label: String) -> Self {
        match label.as_str() {
            "critical" => PriorityTier::Critical,
            "urgent" => PriorityTier::Urgent,
            "non-urgent" => PriorityTier::NonUrgent,
            _ => PriorityTier::Unrecognized(label),
        }
    }
}

impl From<PriorityTier> for String {
    fn from(tier: PriorityTier) -> Self {
        match tier {
            PriorityTier::Unrecognized(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a patient is in the visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Waiting,
    Treated,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Waiting => "waiting",
            PatientStatus::Treated => "treated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(PatientStatus::Waiting),
            "treated" => Some(PatientStatus::Treated),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A patient row joined with its priority metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: String,
    pub injury_type: Option<String>,
    pub pain_level: i64,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub code: PatientCode,
    pub priority_id: i64,
    pub priority_tier: PriorityTier,
    /// Per-tier service estimate from the priority table
    pub approx_service_minutes: Option<u32>,
    pub arrival_time: DateTime<Utc>,
    pub status: PatientStatus,
    pub room_id: Option<i64>,
}

impl PatientRecord {
    /// Service minutes this patient adds to the wait of everyone behind them
    pub fn service_minutes(&self) -> u64 {
        self.approx_service_minutes.map(u64::from).unwrap_or(0)
    }

    pub fn is_waiting(&self) -> bool {
        self.status == PatientStatus::Waiting
    }
}

/// A waiting patient annotated with queue position and projected wait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPatient {
    #[serde(flatten)]
    pub patient: PatientRecord,
    /// 1-based rank within the waiting set
    pub position: usize,
    pub estimated_wait_minutes: u64,
}

/// Fields required to insert a new waiting patient
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub injury_type: Option<String>,
    pub pain_level: i64,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub code: PatientCode,
    pub priority_tier: PriorityTier,
}

/// A row of the `priority` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityInfo {
    pub id: i64,
    pub tier: PriorityTier,
    pub approx_service_minutes: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ranks() {
        assert_eq!(PriorityTier::Critical.rank(), 1);
        assert_eq!(PriorityTier::Urgent.rank(), 2);
        assert_eq!(PriorityTier::NonUrgent.rank(), 3);
        assert_eq!(PriorityTier::Unrecognized("minor".into()).rank(), 4);
    }

    #[test]
    fn test_tier_serde_uses_labels() {
        let json = serde_json::to_string(&PriorityTier::NonUrgent).unwrap();
        assert_eq!(json, "\"non-urgent\"");

        let tier: PriorityTier = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(tier, PriorityTier::Urgent);

        let unknown: PriorityTier = serde_json::from_str("\"resus\"").unwrap();
        assert_eq!(unknown, PriorityTier::Unrecognized("resus".to_string()));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"resus\"");
    }

    #[test]
    fn test_priority_id_mapping() {
        for tier in PriorityTier::known() {
            let id = tier.priority_id().unwrap();
            assert_eq!(PriorityTier::from_priority_id(id), Some(tier));
        }
        assert_eq!(PriorityTier::from_priority_id(9), None);
        assert_eq!(PriorityTier::Unrecognized("x".into()).priority_id(), None);
    }

    #[test]
    fn test_parse_known() {
        assert_eq!(
            PriorityTier::parse_known(" Critical "),
            Some(PriorityTier::Critical)
        );
        assert_eq!(
            PriorityTier::parse_known("non_urgent"),
            Some(PriorityTier::NonUrgent)
        );
        assert_eq!(PriorityTier::parse_known("soonish"), None);
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(PatientStatus::parse("waiting"), Some(PatientStatus::Waiting));
        assert_eq!(PatientStatus::Treated.as_str(), "treated");
        assert_eq!(PatientStatus::parse("discharged"), None);
    }
}
