//! SQLite-backed patient store
//!
//! Keeps the relational layout of the check-in desk: a `priority` table holding
//! the tier label and approximate service time, and a `patient` table pointing
//! at it. Arrival times are stored as unix milliseconds.

use crate::error::{Result, TriageError};
use crate::store::PatientStore;
use crate::types::{
    NewPatient, PatientId, PatientRecord, PatientStatus, PriorityInfo, PriorityTier,
};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_JOINED: &str = "SELECT
        p.id,
        p.name,
        p.injury_type,
        p.pain_level,
        p.date_of_birth,
        p.gender,
        p.card_nb,
        p.priority_id,
        p.room_id,
        p.arrival_time,
        p.status,
        pr.description AS priority_description,
        pr.approx_service_minutes
    FROM patient p
    JOIN priority pr ON p.priority_id = pr.id";

/// Patient store over a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqlitePatientStore {
    pool: SqlitePool,
}

impl SqlitePatientStore {
    /// Connect, create the schema if absent and seed the priority table
    pub async fn connect(
        url: &str,
        max_connections: u32,
        priorities: &[PriorityInfo],
    ) -> Result<Self> {
        // Every connection to an in-memory database sees its own database,
        // so those pools are pinned to a single long-lived connection.
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        info!("Connecting to SQLite patient store: {}", url);
        let pool = options.connect(url).await.map_err(TriageError::from)?;

        let store = Self { pool };
        store.initialize_schema().await?;
        store.seed_priorities(priorities).await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS priority (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                approx_service_minutes INTEGER
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(TriageError::from)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS patient (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                injury_type TEXT,
                pain_level INTEGER NOT NULL,
                date_of_birth TEXT,
                gender TEXT,
                card_nb TEXT NOT NULL,
                priority_id INTEGER NOT NULL REFERENCES priority(id),
                room_id INTEGER,
                arrival_time INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'waiting'
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(TriageError::from)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_patient_name_card ON patient (name, card_nb)",
        )
        .execute(&self.pool)
        .await
        .map_err(TriageError::from)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_patient_status ON patient (status)")
            .execute(&self.pool)
            .await
            .map_err(TriageError::from)?;

        debug!("Patient store schema ready");
        Ok(())
    }

    /// Insert missing priority rows. Existing rows are left as they are.
    async fn seed_priorities(&self, priorities: &[PriorityInfo]) -> Result<()> {
        for priority in priorities {
            sqlx::query(
                "INSERT OR IGNORE INTO priority (id, description, approx_service_minutes)
                 VALUES (?, ?, ?)",
            )
            .bind(priority.id)
            .bind(priority.tier.label())
            .bind(priority.approx_service_minutes.map(i64::from))
            .execute(&self.pool)
            .await
            .map_err(TriageError::from)?;
        }
        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> std::result::Result<PatientRecord, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = PatientStatus::parse(&status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown patient status: {}", status).into())
        })?;

        let arrival_millis: i64 = row.try_get("arrival_time")?;
        let arrival_time = Utc
            .timestamp_millis_opt(arrival_millis)
            .single()
            .ok_or_else(|| {
                sqlx::Error::Decode(format!("invalid arrival time: {}", arrival_millis).into())
            })?;

        let date_of_birth: Option<String> = row.try_get("date_of_birth")?;
        let description: String = row.try_get("priority_description")?;
        let minutes: Option<i64> = row.try_get("approx_service_minutes")?;

        Ok(PatientRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            injury_type: row.try_get("injury_type")?,
            pain_level: row.try_get("pain_level")?,
            date_of_birth: date_of_birth
                .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT).ok()),
            gender: row.try_get("gender")?,
            code: row.try_get("card_nb")?,
            priority_id: row.try_get("priority_id")?,
            priority_tier: PriorityTier::from(description),
            approx_service_minutes: minutes.and_then(|m| u32::try_from(m).ok()),
            arrival_time,
            status,
            room_id: row.try_get("room_id")?,
        })
    }

    fn rows_to_records(rows: &[SqliteRow]) -> Result<Vec<PatientRecord>> {
        rows.iter()
            .map(|row| {
                Self::row_to_record(row).map_err(|e| anyhow::Error::from(TriageError::from(e)))
            })
            .collect()
    }
}

#[async_trait]
impl PatientStore for SqlitePatientStore {
    #[instrument(skip(self, patient), fields(tier = %patient.priority_tier))]
    async fn insert_patient(&self, patient: NewPatient) -> Result<PatientId> {
        let priority_id = patient.priority_tier.priority_id().ok_or_else(|| {
            TriageError::validation(format!(
                "no priority row for tier '{}'",
                patient.priority_tier
            ))
        })?;

        let result = sqlx::query(
            "INSERT INTO patient
                (name, injury_type, pain_level, date_of_birth, gender, card_nb,
                 priority_id, room_id, arrival_time, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, 'waiting')",
        )
        .bind(&patient.name)
        .bind(&patient.injury_type)
        .bind(patient.pain_level)
        .bind(
            patient
                .date_of_birth
                .map(|d| d.format(DATE_FORMAT).to_string()),
        )
        .bind(&patient.gender)
        .bind(&patient.code)
        .bind(priority_id)
        .bind(current_timestamp().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(TriageError::from)?;

        Ok(result.last_insert_rowid())
    }

    async fn find_waiting_patients(&self) -> Result<Vec<PatientRecord>> {
        let query = format!("{} WHERE p.status = 'waiting' ORDER BY p.id", SELECT_JOINED);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(TriageError::from)?;

        Self::rows_to_records(&rows)
    }

    async fn find_latest_by_name_and_code(
        &self,
        name: &str,
        code: &str,
    ) -> Result<Option<PatientRecord>> {
        let query = format!(
            "{} WHERE p.name = ? AND p.card_nb = ? ORDER BY p.id DESC LIMIT 1",
            SELECT_JOINED
        );
        let row = sqlx::query(&query)
            .bind(name)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(TriageError::from)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_record(&row).map_err(TriageError::from)?)),
            None => Ok(None),
        }
    }

    async fn mark_treated(&self, id: PatientId) -> Result<bool> {
        let result = sqlx::query("UPDATE patient SET status = 'treated' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(TriageError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_patients(&self) -> Result<Vec<PatientRecord>> {
        let query = format!("{} ORDER BY p.id", SELECT_JOINED);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(TriageError::from)?;

        Self::rows_to_records(&rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(TriageError::from)?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing SQLite patient store");
        self.pool.close().await;
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
