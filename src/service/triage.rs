//! Triage operations over the patient store
//!
//! `TriageService` turns check-in and staff requests into store calls and
//! builds the ranked waiting queue on demand. It holds no queue state of its
//! own: every read starts from a fresh store snapshot.

use crate::error::{Result, TriageError};
use crate::metrics::{CheckInSource, MetricsCollector};
use crate::store::PatientStore;
use crate::triage::{locate, stored_pain_level, tier_for_pain, QueueSnapshot, TriageQueueEstimator};
use crate::types::{
    NewPatient, PatientCode, PatientId, PatientRecord, PatientStatus, PriorityTier, RankedPatient,
};
use crate::utils::{generate_patient_code, non_blank};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A self-service check-in
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRequest {
    pub name: String,
    pub injury_type: String,
    /// Pain score already coerced to a number
    pub pain_score: f64,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    /// Card number to reuse. A fresh one is generated when absent.
    pub code: Option<PatientCode>,
}

/// A patient added by staff
#[derive(Debug, Clone, PartialEq)]
pub struct AdmitRequest {
    pub name: String,
    pub code: PatientCode,
    pub pain_score: f64,
    pub injury_type: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    /// Tier chosen by staff instead of the pain mapping
    pub tier_override: Option<PriorityTier>,
}

/// What a patient gets back after checking in
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInReceipt {
    pub patient_id: PatientId,
    pub name: String,
    pub code: PatientCode,
    pub tier: PriorityTier,
}

/// Result of a status lookup by name and card number
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// No record with that name and code
    NotFound,
    /// The latest matching record has been treated
    Treated { name: String },
    /// Still waiting, with the current queue position
    Waiting(RankedPatient),
    /// Waiting, but absent from the ranked queue (e.g. no priority row)
    NotInQueue,
}

impl StatusOutcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            StatusOutcome::NotFound => "not_found",
            StatusOutcome::Treated { .. } => "treated",
            StatusOutcome::Waiting(_) => "waiting",
            StatusOutcome::NotInQueue => "not_in_queue",
        }
    }
}

/// Triage operations shared by every HTTP handler
#[derive(Clone)]
pub struct TriageService {
    store: Arc<dyn PatientStore>,
    estimator: TriageQueueEstimator,
    metrics_collector: Arc<MetricsCollector>,
}

impl TriageService {
    /// Create a new triage service
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(store, metrics_collector)
    }

    /// Create a new triage service with metrics collector
    pub fn with_metrics(
        store: Arc<dyn PatientStore>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            estimator: TriageQueueEstimator::new(),
            metrics_collector,
        }
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Register a patient from the check-in form
    pub async fn check_in(&self, request: CheckInRequest) -> Result<CheckInReceipt> {
        let name = required(request.name, "name")?;
        let injury_type = required(request.injury_type, "injuryType")?;
        let code = non_blank(request.code).unwrap_or_else(generate_patient_code);
        let tier = tier_for_pain(request.pain_score);

        let patient = NewPatient {
            name: name.clone(),
            injury_type: Some(injury_type),
            pain_level: stored_pain_level(request.pain_score),
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            code: code.clone(),
            priority_tier: tier.clone(),
        };

        let patient_id = self
            .timed("insert_patient", self.store.insert_patient(patient))
            .await?;

        self.metrics_collector
            .record_check_in(&tier, CheckInSource::Patient);
        info!(
            "Checked in patient {} as {} (pain {})",
            patient_id, tier, request.pain_score
        );

        Ok(CheckInReceipt {
            patient_id,
            name,
            code,
            tier,
        })
    }

    /// Add a patient on behalf of staff
    pub async fn admit(&self, request: AdmitRequest) -> Result<PatientId> {
        let name = required(request.name, "name")?;
        let code = required(request.code, "code")?;
        let tier = request
            .tier_override
            .unwrap_or_else(|| tier_for_pain(request.pain_score));

        if tier.priority_id().is_none() {
            return Err(TriageError::validation(format!("Unknown priority '{}'", tier)).into());
        }

        let patient = NewPatient {
            name,
            injury_type: request.injury_type,
            pain_level: stored_pain_level(request.pain_score),
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            code,
            priority_tier: tier.clone(),
        };

        let patient_id = self
            .timed("insert_patient", self.store.insert_patient(patient))
            .await?;

        self.metrics_collector
            .record_check_in(&tier, CheckInSource::Staff);
        info!("Staff admitted patient {} as {}", patient_id, tier);

        Ok(patient_id)
    }

    /// Look up where a patient stands using the name and card number from check-in
    pub async fn lookup_status(&self, name: &str, code: &str) -> Result<StatusOutcome> {
        let latest = self
            .timed(
                "find_latest_by_name_and_code",
                self.store.find_latest_by_name_and_code(name, code),
            )
            .await?;

        let outcome = match latest {
            None => StatusOutcome::NotFound,
            Some(record) if record.status == PatientStatus::Treated => {
                StatusOutcome::Treated { name: record.name }
            }
            Some(record) => {
                let queue = self.waiting_queue().await?;
                match locate(&queue, record.id) {
                    Some(entry) => StatusOutcome::Waiting(entry.clone()),
                    None => StatusOutcome::NotInQueue,
                }
            }
        };

        debug!("Status lookup resolved to {}", outcome.label());
        self.metrics_collector.record_status_lookup(outcome.label());
        Ok(outcome)
    }

    /// The waiting room in treatment order with projected waits
    pub async fn waiting_queue(&self) -> Result<Vec<RankedPatient>> {
        let waiting = self
            .timed("find_waiting_patients", self.store.find_waiting_patients())
            .await?;

        let timer = self.metrics_collector.start_timer();
        let ranked = self.estimator.estimate(waiting);
        self.metrics_collector
            .record_operation("estimate", timer.stop());

        self.metrics_collector
            .update_from_snapshot(&QueueSnapshot::from_ranked(&ranked));
        Ok(ranked)
    }

    /// Mark a patient treated, removing them from the queue
    pub async fn mark_treated(&self, id: PatientId) -> Result<()> {
        let updated = self
            .timed("mark_treated", self.store.mark_treated(id))
            .await?;

        if !updated {
            warn!("Cannot mark unknown patient {} as treated", id);
            return Err(TriageError::not_found(format!("patient {}", id)).into());
        }

        self.metrics_collector.record_treated();
        info!("Patient {} marked as treated", id);
        Ok(())
    }

    /// Every patient record, waiting or treated
    pub async fn list_patients(&self) -> Result<Vec<PatientRecord>> {
        self.timed("list_patients", self.store.list_patients())
            .await
    }

    /// Summary of the current queue
    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let queue = self.waiting_queue().await?;
        Ok(QueueSnapshot::from_ranked(&queue))
    }

    /// Run a store call, recording its duration and logging failures
    async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timer = self.metrics_collector.start_timer();
        let result = call.await;
        self.metrics_collector
            .record_operation(operation, timer.stop());

        if let Err(e) = &result {
            if !matches!(
                e.downcast_ref::<TriageError>(),
                Some(TriageError::Validation { .. })
            ) {
                error!("Patient store {} failed: {}", operation, e);
                self.metrics_collector.record_store_error(operation);
            }
        }

        result
    }
}

fn required(value: String, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TriageError::validation(format!("{} is required", field)).into());
    }
    Ok(trimmed.to_string())
}
