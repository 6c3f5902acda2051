//! Patient store interface and implementations
//!
//! The store owns the `patient` and `priority` tables. It hands back rows already
//! joined with their priority metadata and performs no ranking of its own; the
//! triage estimator is responsible for all ordering.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryPatientStore;
pub use sqlite::SqlitePatientStore;

use crate::config::{AppConfig, StoreBackend};
use crate::error::Result;
use crate::types::{NewPatient, PatientId, PatientRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Trait for patient storage operations
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Insert a new waiting patient and return its id
    async fn insert_patient(&self, patient: NewPatient) -> Result<PatientId>;

    /// All waiting patients joined with their priority row, in no particular order
    async fn find_waiting_patients(&self) -> Result<Vec<PatientRecord>>;

    /// Most recent record (highest id) with this name and code
    async fn find_latest_by_name_and_code(
        &self,
        name: &str,
        code: &str,
    ) -> Result<Option<PatientRecord>>;

    /// Flip a patient to treated. Returns false when the id is unknown.
    async fn mark_treated(&self, id: PatientId) -> Result<bool>;

    /// Every patient, waiting or treated, ordered by id
    async fn list_patients(&self) -> Result<Vec<PatientRecord>>;

    /// Verify the store can serve queries
    async fn ping(&self) -> Result<()>;

    /// Release resources held by the store
    async fn close(&self);

    /// Short name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Open the store selected by the configuration
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn PatientStore>> {
    let priorities = config.triage.priority_table();

    let store: Arc<dyn PatientStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryPatientStore::new(priorities)),
        StoreBackend::Sqlite => Arc::new(
            SqlitePatientStore::connect(
                &config.store.url,
                config.store.max_connections,
                &priorities,
            )
            .await?,
        ),
    };

    info!("Opened {} patient store", store.backend_name());
    Ok(store)
}
