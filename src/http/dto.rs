//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies accept camelCase fields with snake_case aliases. Presence is
//! checked explicitly: a pain level of `0` is a value, an absent one is not.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AppError;
use crate::service::{AdmitRequest, CheckInReceipt, CheckInRequest, StatusOutcome};
use crate::triage::coerce_pain_score;
use crate::types::{PatientCode, PatientId, PatientRecord, PriorityTier, RankedPatient};
use crate::utils::non_blank;

/// Request body for `POST /checkin`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "injury_type")]
    pub injury_type: Option<String>,
    /// Number or numeric string
    #[serde(default, alias = "pain_level")]
    pub pain_level: Option<Value>,
    #[serde(default, alias = "date_of_birth")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Card number, number or string
    #[serde(default)]
    pub code: Option<Value>,
}

impl CheckInBody {
    pub fn into_request(self) -> Result<CheckInRequest, AppError> {
        let missing = || AppError::BadRequest("Missing required fields.".to_string());

        let name = non_blank(self.name).ok_or_else(missing)?;
        let injury_type = non_blank(self.injury_type).ok_or_else(missing)?;
        let pain_score = pain_score(self.pain_level).ok_or_else(missing)?;

        Ok(CheckInRequest {
            name,
            injury_type,
            pain_score,
            date_of_birth: parse_date_of_birth(self.date_of_birth)?,
            gender: non_blank(self.gender),
            code: parse_code(self.code)?,
        })
    }
}

/// Request body for `POST /admin/patients`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default, alias = "pain_level")]
    pub pain_level: Option<Value>,
    #[serde(default, alias = "injury_type")]
    pub injury_type: Option<String>,
    #[serde(default, alias = "date_of_birth")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Tier label override
    #[serde(default)]
    pub priority: Option<String>,
    /// Priority table id override (1 non-urgent, 2 urgent, 3 critical)
    #[serde(default, alias = "priority_id")]
    pub priority_id: Option<Value>,
}

impl AdmitBody {
    pub fn into_request(self) -> Result<AdmitRequest, AppError> {
        let missing = || AppError::BadRequest("Name, code, and pain level are required.".to_string());

        let name = non_blank(self.name).ok_or_else(missing)?;
        let code = parse_code(self.code)?.ok_or_else(missing)?;
        let pain_score = pain_score(self.pain_level).ok_or_else(missing)?;

        Ok(AdmitRequest {
            name,
            code,
            pain_score,
            injury_type: non_blank(self.injury_type),
            date_of_birth: parse_date_of_birth(self.date_of_birth)?,
            gender: non_blank(self.gender),
            tier_override: parse_override(self.priority, self.priority_id)?,
        })
    }
}

/// Query string for `GET /status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Response for a successful check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    pub message: String,
    pub patient_id: PatientId,
    pub name: String,
    pub code: PatientCode,
}

impl From<CheckInReceipt> for CheckInResponse {
    fn from(receipt: CheckInReceipt) -> Self {
        Self {
            success: true,
            message: "Check-in successful.".to_string(),
            patient_id: receipt.patient_id,
            name: receipt.name,
            code: receipt.code,
        }
    }
}

/// Response for `GET /status`. Only the fields relevant to the outcome are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u64>,
}

impl From<StatusOutcome> for StatusResponse {
    fn from(outcome: StatusOutcome) -> Self {
        match outcome {
            StatusOutcome::NotFound => Self {
                success: false,
                message: Some("No patient found with that name and code.".to_string()),
                ..Default::default()
            },
            StatusOutcome::NotInQueue => Self {
                success: false,
                message: Some("You are not currently in the waiting queue.".to_string()),
                ..Default::default()
            },
            StatusOutcome::Treated { name } => Self {
                success: true,
                treated: Some(true),
                message: Some("You have already been treated.".to_string()),
                name: Some(name),
                ..Default::default()
            },
            StatusOutcome::Waiting(entry) => Self {
                success: true,
                treated: Some(false),
                name: Some(entry.patient.name),
                priority: Some(entry.patient.priority_tier),
                position: Some(entry.position),
                estimated_wait_minutes: Some(entry.estimated_wait_minutes),
                ..Default::default()
            },
        }
    }
}

/// `{success, message}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Response for a patient added by staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitResponse {
    pub success: bool,
    pub message: String,
    pub patient_id: PatientId,
}

/// Ranked waiting room for the staff view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub success: bool,
    pub patients: Vec<RankedPatient>,
}

/// Read-only listing of every patient record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientListResponse {
    pub success: bool,
    pub patients: Vec<PatientRecord>,
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Absent, null and blank values count as missing.
fn pain_score(value: Option<Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(coerce_pain_score(&v)),
    }
}

fn parse_code(value: Option<Value>) -> Result<Option<PatientCode>, AppError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_blank(Some(s))),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(AppError::BadRequest(
            "code must be a string or a number.".to_string(),
        )),
    }
}

fn parse_date_of_birth(value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AppError::BadRequest(format!(
                    "dateOfBirth '{}' is not a YYYY-MM-DD date.",
                    raw
                ))
            }),
    }
}

fn parse_override(
    label: Option<String>,
    id: Option<Value>,
) -> Result<Option<PriorityTier>, AppError> {
    let from_label = match non_blank(label) {
        None => None,
        Some(raw) => Some(PriorityTier::parse_known(&raw).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown priority '{}'.", raw))
        })?),
    };

    let from_id = match id {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = match &value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            Some(
                parsed
                    .and_then(PriorityTier::from_priority_id)
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("Unknown priorityId {}.", value))
                    })?,
            )
        }
    };

    match (from_label, from_id) {
        (Some(a), Some(b)) if a != b => Err(AppError::BadRequest(
            "priority and priorityId disagree.".to_string(),
        )),
        (label, id) => Ok(label.or(id)),
    }
}
