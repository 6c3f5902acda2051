//! Main application state and service coordination
//!
//! This module contains the AppState that owns the patient store handle, the
//! triage service and the metrics collector. The store is opened when the
//! state is built and closed on shutdown.

use crate::config::{validate_config, AppConfig};
use crate::metrics::MetricsCollector;
use crate::service::triage::TriageService;
use crate::store::{open_store, PatientStore};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Interval between background metric refreshes
const METRICS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Patient store error: {message}")]
    Store { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Patient store shared with the triage service
    store: Arc<dyn PatientStore>,

    /// Triage operations
    triage_service: TriageService,

    /// Metrics collector for monitoring
    metrics_collector: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// When the state was built
    started_at: Instant,
}

impl AppState {
    /// Initialize the application, opening the configured patient store
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing triage-desk service");

        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        info!(
            "Configuration: service={}, store={}",
            config.service.name, config.store.backend
        );

        let store = open_store(&config)
            .await
            .map_err(|e| ServiceError::Store {
                message: format!("Failed to open patient store: {}", e),
            })?;

        Self::with_store(config, store)
    }

    /// Build the state around an already opened store
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn PatientStore>,
    ) -> Result<Self, ServiceError> {
        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let triage_service = TriageService::with_metrics(store.clone(), metrics_collector.clone());

        Ok(Self {
            config,
            store,
            triage_service,
            metrics_collector,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Mark the service running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting triage-desk service");

        *self.is_running.write().await = true;

        let metrics_task = {
            let triage_service = self.triage_service.clone();
            let store = self.store.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(METRICS_REFRESH_INTERVAL);
                info!("Metrics refresh task started");

                while *is_running.read().await {
                    interval.tick().await;

                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(started_at.elapsed().as_secs() as i64);

                    let store_ok = store.ping().await.is_ok();
                    metrics_collector.update_component_health("patient_store", store_ok);
                    metrics_collector.update_health_status(if store_ok { 2 } else { 0 });

                    // refreshes the queue gauges as a side effect
                    match triage_service.snapshot().await {
                        Ok(snapshot) => debug!(
                            "Updated metrics - waiting: {}, longest wait: {}m",
                            snapshot.waiting, snapshot.longest_wait_minutes
                        ),
                        Err(e) => warn!("Failed to refresh queue metrics: {}", e),
                    }
                }

                info!("Metrics refresh task stopped");
            })
        };

        self.background_tasks.lock().await.push(metrics_task);

        info!("✅ Triage-desk service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) {
        info!("Starting graceful shutdown of triage-desk service");

        *self.is_running.write().await = false;

        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        for task in tasks.drain(..) {
            task.abort();
        }
        debug!("Aborted {} background tasks", task_count);

        match self.triage_service.snapshot().await {
            Ok(snapshot) => info!("Final queue statistics: {:?}", snapshot),
            Err(e) => warn!("Failed to read final queue statistics: {}", e),
        }

        self.store.close().await;
        info!("✅ Patient store closed");
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the patient store
    pub fn store(&self) -> Arc<dyn PatientStore> {
        self.store.clone()
    }

    /// Get the triage service
    pub fn triage(&self) -> &TriageService {
        &self.triage_service
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Time since the state was built
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPatientStore;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let state = AppState::with_store(
            AppConfig::default(),
            Arc::new(InMemoryPatientStore::default()),
        )
        .unwrap();
        assert!(!state.is_running().await);

        state.start().await.unwrap();
        assert!(state.is_running().await);

        state.shutdown().await;
        assert!(!state.is_running().await);
        assert!(state.background_tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_new_opens_memory_store() {
        let state = AppState::new(AppConfig::default()).await.unwrap();
        assert_eq!(state.store().backend_name(), "memory");
        assert!(state.triage().waiting_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;

        let result = AppState::new(config).await;
        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }
}
