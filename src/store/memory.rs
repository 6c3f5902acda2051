//! In-memory patient store
//!
//! Used for development and tests. Rows are kept apart from the priority table
//! and joined on read, the same shape the SQL store returns.

use crate::error::{Result, TriageError};
use crate::store::PatientStore;
use crate::types::{
    NewPatient, PatientCode, PatientId, PatientRecord, PatientStatus, PriorityInfo,
};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// A `patient` row before the priority join
#[derive(Debug, Clone)]
struct PatientRow {
    name: String,
    injury_type: Option<String>,
    pain_level: i64,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    code: PatientCode,
    priority_id: i64,
    room_id: Option<i64>,
    arrival_time: DateTime<Utc>,
    status: PatientStatus,
}

#[derive(Debug, Default)]
struct Tables {
    patients: BTreeMap<PatientId, PatientRow>,
    last_id: PatientId,
}

/// In-memory patient store implementation
#[derive(Debug)]
pub struct InMemoryPatientStore {
    tables: RwLock<Tables>,
    priorities: HashMap<i64, PriorityInfo>,
}

impl InMemoryPatientStore {
    /// Create an empty store with the given priority table
    pub fn new(priorities: Vec<PriorityInfo>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            priorities: priorities.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Insert a patient with an explicit arrival time (seeding and tests)
    pub fn insert_with_arrival(
        &self,
        patient: NewPatient,
        arrival_time: DateTime<Utc>,
    ) -> Result<PatientId> {
        let priority_id = patient.priority_tier.priority_id().ok_or_else(|| {
            TriageError::validation(format!(
                "no priority row for tier '{}'",
                patient.priority_tier
            ))
        })?;

        let mut tables = self.tables.write().map_err(|_| {
            TriageError::store("Failed to acquire patients write lock")
        })?;

        tables.last_id += 1;
        let id = tables.last_id;
        tables.patients.insert(
            id,
            PatientRow {
                name: patient.name,
                injury_type: patient.injury_type,
                pain_level: patient.pain_level,
                date_of_birth: patient.date_of_birth,
                gender: patient.gender,
                code: patient.code,
                priority_id,
                room_id: None,
                arrival_time,
                status: PatientStatus::Waiting,
            },
        );

        Ok(id)
    }

    /// Join a row with its priority. Rows without a priority row drop out, as in an inner join.
    fn join(&self, id: PatientId, row: &PatientRow) -> Option<PatientRecord> {
        let priority = self.priorities.get(&row.priority_id)?;
        Some(PatientRecord {
            id,
            name: row.name.clone(),
            injury_type: row.injury_type.clone(),
            pain_level: row.pain_level,
            date_of_birth: row.date_of_birth,
            gender: row.gender.clone(),
            code: row.code.clone(),
            priority_id: row.priority_id,
            priority_tier: priority.tier.clone(),
            approx_service_minutes: priority.approx_service_minutes,
            arrival_time: row.arrival_time,
            status: row.status,
            room_id: row.room_id,
        })
    }

    fn select<F>(&self, filter: F) -> Result<Vec<PatientRecord>>
    where
        F: Fn(&PatientRow) -> bool,
    {
        let tables = self
            .tables
            .read()
            .map_err(|_| TriageError::store("Failed to acquire patients read lock"))?;

        Ok(tables
            .patients
            .iter()
            .filter(|(_, row)| filter(row))
            .filter_map(|(id, row)| self.join(*id, row))
            .collect())
    }
}

impl Default for InMemoryPatientStore {
    fn default() -> Self {
        Self::new(default_priorities())
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert_patient(&self, patient: NewPatient) -> Result<PatientId> {
        self.insert_with_arrival(patient, current_timestamp())
    }

    async fn find_waiting_patients(&self) -> Result<Vec<PatientRecord>> {
        self.select(|row| row.status == PatientStatus::Waiting)
    }

    async fn find_latest_by_name_and_code(
        &self,
        name: &str,
        code: &str,
    ) -> Result<Option<PatientRecord>> {
        let matches = self.select(|row| row.name == name && row.code == code)?;
        Ok(matches.into_iter().max_by_key(|p| p.id))
    }

    async fn mark_treated(&self, id: PatientId) -> Result<bool> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| TriageError::store("Failed to acquire patients write lock"))?;

        match tables.patients.get_mut(&id) {
            Some(row) => {
                row.status = PatientStatus::Treated;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_patients(&self) -> Result<Vec<PatientRecord>> {
        self.select(|_| true)
    }

    async fn ping(&self) -> Result<()> {
        self.tables
            .read()
            .map(|_| ())
            .map_err(|_| TriageError::store("Patient tables are poisoned").into())
    }

    async fn close(&self) {}

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Priority rows keyed the way [`crate::types::PriorityTier::priority_id`] expects
pub fn default_priorities() -> Vec<PriorityInfo> {
    crate::config::TriageSettings::default().priority_table()
}
