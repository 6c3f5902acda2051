//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the triage service using
//! Prometheus metrics.

use crate::triage::QueueSnapshot;
use crate::types::PriorityTier;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a check-in came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInSource {
    /// Self-service registration
    Patient,
    /// Added by staff from the admin view
    Staff,
}

impl CheckInSource {
    fn as_label(&self) -> &'static str {
        match self {
            CheckInSource::Patient => "patient",
            CheckInSource::Staff => "staff",
        }
    }
}

/// Main metrics collector for the triage service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue and patient flow metrics
    queue_metrics: QueueMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Queue and patient flow metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Check-ins by assigned tier and source
    pub check_ins_total: IntCounterVec,

    /// Patients marked treated
    pub treated_total: IntCounter,

    /// Status lookups by outcome
    pub status_lookups_total: IntCounterVec,

    /// Patients currently waiting, by tier
    pub waiting_patients: IntGaugeVec,

    /// Projected wait of the last patient in line
    pub longest_wait_minutes: IntGauge,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Triage operation durations
    pub operation_duration: HistogramVec,

    /// Store failures by operation
    pub store_errors_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a patient entering the waiting room
    pub fn record_check_in(&self, tier: &PriorityTier, source: CheckInSource) {
        self.queue_metrics
            .check_ins_total
            .with_label_values(&[tier.label(), source.as_label()])
            .inc();
    }

    /// Record a patient being marked treated
    pub fn record_treated(&self) {
        self.queue_metrics.treated_total.inc();
    }

    /// Record the outcome of a status lookup
    pub fn record_status_lookup(&self, outcome: &str) {
        self.queue_metrics
            .status_lookups_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Update queue gauges from a freshly ranked queue
    pub fn update_from_snapshot(&self, snapshot: &QueueSnapshot) {
        let waiting = &self.queue_metrics.waiting_patients;
        waiting
            .with_label_values(&["critical"])
            .set(snapshot.critical as i64);
        waiting
            .with_label_values(&["urgent"])
            .set(snapshot.urgent as i64);
        waiting
            .with_label_values(&["non-urgent"])
            .set(snapshot.non_urgent as i64);
        waiting
            .with_label_values(&["unrecognized"])
            .set(snapshot.unrecognized as i64);

        self.queue_metrics
            .longest_wait_minutes
            .set(snapshot.longest_wait_minutes as i64);
    }

    /// Record a triage operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record a failed store call
    pub fn record_store_error(&self, operation: &str) {
        self.performance_metrics
            .store_errors_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("triage_desk_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "triage_desk_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("triage_desk_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let check_ins_total = IntCounterVec::new(
            Opts::new("triage_desk_check_ins_total", "Total patient check-ins"),
            &["tier", "source"],
        )?;
        registry.register(Box::new(check_ins_total.clone()))?;

        let treated_total = IntCounter::new(
            "triage_desk_treated_total",
            "Total patients marked treated",
        )?;
        registry.register(Box::new(treated_total.clone()))?;

        let status_lookups_total = IntCounterVec::new(
            Opts::new(
                "triage_desk_status_lookups_total",
                "Total patient status lookups",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(status_lookups_total.clone()))?;

        let waiting_patients = IntGaugeVec::new(
            Opts::new("triage_desk_waiting_patients", "Patients currently waiting"),
            &["tier"],
        )?;
        registry.register(Box::new(waiting_patients.clone()))?;

        let longest_wait_minutes = IntGauge::new(
            "triage_desk_longest_wait_minutes",
            "Projected wait of the last patient in line",
        )?;
        registry.register(Box::new(longest_wait_minutes.clone()))?;

        Ok(Self {
            check_ins_total,
            treated_total,
            status_lookups_total,
            waiting_patients,
            longest_wait_minutes,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "triage_desk_operation_duration_seconds",
                "Triage operation duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let store_errors_total = IntCounterVec::new(
            Opts::new(
                "triage_desk_store_errors_total",
                "Total patient store failures",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(store_errors_total.clone()))?;

        Ok(Self {
            operation_duration,
            store_errors_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _queue = collector.queue();
        let _performance = collector.performance();
    }

    #[test]
    fn test_check_in_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_check_in(&PriorityTier::Critical, CheckInSource::Patient);
        collector.record_check_in(&PriorityTier::Critical, CheckInSource::Staff);
        collector.record_check_in(&PriorityTier::Critical, CheckInSource::Patient);

        let count = collector
            .queue()
            .check_ins_total
            .with_label_values(&["critical", "patient"])
            .get();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_snapshot_updates_gauges() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_from_snapshot(&QueueSnapshot {
            waiting: 3,
            critical: 1,
            urgent: 2,
            non_urgent: 0,
            unrecognized: 0,
            total_projected_minutes: 70,
            longest_wait_minutes: 50,
        });

        let queue = collector.queue();
        assert_eq!(queue.waiting_patients.with_label_values(&["urgent"]).get(), 2);
        assert_eq!(queue.longest_wait_minutes.get(), 50);
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2); // Healthy
        collector.update_component_health("patient_store", true);
        assert_eq!(collector.service().health_status.get(), 2);
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
        collector.record_operation("estimate", final_duration);
    }
}
