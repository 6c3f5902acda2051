//! HTTP handlers for the triage API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! triage service for business logic.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use super::dto::{
    AdmitBody, AdmitResponse, CheckInBody, CheckInResponse, LivenessResponse, MessageResponse,
    PatientListResponse, QueueResponse, StatusQuery, StatusResponse,
};
use super::error::AppError;
use super::SharedState;
use crate::metrics::{encode_metrics, metrics_content_type};
use crate::service::{HealthCheck, HealthStatus};
use crate::types::PatientId;
use crate::utils::non_blank;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Patient endpoints
// =============================================================================

/// POST /checkin
pub async fn check_in(
    State(state): State<SharedState>,
    payload: Result<Json<CheckInBody>, JsonRejection>,
) -> HandlerResult<CheckInResponse> {
    let Json(body) = payload?;
    let receipt = state.triage().check_in(body.into_request()?).await?;
    Ok(Json(receipt.into()))
}

/// GET /status?name=&code=
///
/// Position and projected wait for the latest record with this name and card number.
pub async fn patient_status(
    State(state): State<SharedState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> HandlerResult<StatusResponse> {
    let Query(query) = query?;

    let (name, code) = match (non_blank(query.name), non_blank(query.code)) {
        (Some(name), Some(code)) => (name, code),
        _ => {
            return Err(AppError::BadRequest(
                "Name and code are required.".to_string(),
            ))
        }
    };

    let outcome = state.triage().lookup_status(&name, &code).await?;
    Ok(Json(outcome.into()))
}

/// GET /patients
///
/// Every patient record, read-only.
pub async fn list_patients(State(state): State<SharedState>) -> HandlerResult<PatientListResponse> {
    let patients = state.triage().list_patients().await?;
    Ok(Json(PatientListResponse {
        success: true,
        patients,
    }))
}

// =============================================================================
// Staff endpoints
// =============================================================================

/// GET /admin/patients
pub async fn waiting_queue(State(state): State<SharedState>) -> HandlerResult<QueueResponse> {
    let patients = state.triage().waiting_queue().await?;
    Ok(Json(QueueResponse {
        success: true,
        patients,
    }))
}

/// POST /admin/patients
pub async fn admit_patient(
    State(state): State<SharedState>,
    payload: Result<Json<AdmitBody>, JsonRejection>,
) -> HandlerResult<AdmitResponse> {
    let Json(body) = payload?;
    let patient_id = state.triage().admit(body.into_request()?).await?;

    Ok(Json(AdmitResponse {
        success: true,
        message: "Patient added successfully.".to_string(),
        patient_id,
    }))
}

/// PATCH /admin/patients/{id}/treated
pub async fn mark_treated(
    State(state): State<SharedState>,
    id: Result<Path<PatientId>, PathRejection>,
) -> HandlerResult<MessageResponse> {
    let Path(id) = id?;

    match state.triage().mark_treated(id).await.map_err(AppError::from) {
        Ok(()) => Ok(Json(MessageResponse::ok("Patient marked as treated."))),
        Err(AppError::NotFound(_)) => Ok(Json(MessageResponse::failed(format!(
            "No patient found with id {}.",
            id
        )))),
        Err(e) => Err(e),
    }
}

// =============================================================================
// Health and metrics
// =============================================================================

/// Root endpoint handler - shows service information
pub async fn root(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": crate::VERSION,
        "endpoints": [
            "/checkin",
            "/status",
            "/patients",
            "/admin/patients",
            "/health",
            "/ready",
            "/stats",
            "/metrics"
        ]
    }))
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Health check requested");

    let status = match HealthCheck::liveness_check(state.clone()).await {
        Ok(status) => status,
        Err(_) => HealthStatus::Unhealthy,
    };

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    let label = match status {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded => "degraded",
        HealthStatus::Unhealthy => "unhealthy",
    };

    (
        code,
        Json(LivenessResponse {
            status: label.to_string(),
            service: state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
        }),
    )
}

/// GET /ready
pub async fn ready(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// GET /stats
///
/// Detailed health and queue statistics for humans.
pub async fn stats(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    match HealthCheck::check(state.clone()).await {
        Ok(health) => {
            let code = if health.status == HealthStatus::Unhealthy {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };

            (
                code,
                Json(json!({
                    "service": {
                        "name": health.service,
                        "version": health.version,
                        "status": health.status,
                        "uptimeSeconds": health.stats.uptime_seconds,
                        "store": health.stats.store_backend
                    },
                    "queue": {
                        "waiting": health.stats.patients_waiting,
                        "critical": health.stats.critical_waiting,
                        "urgent": health.stats.urgent_waiting,
                        "nonUrgent": health.stats.non_urgent_waiting,
                        "longestWaitMinutes": health.stats.longest_wait_minutes
                    },
                    "treated": health.stats.patients_treated,
                    "components": health.checks,
                    "timestamp": health.timestamp
                })),
            )
        }
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "service": {
                        "name": state.config().service.name,
                        "version": crate::VERSION,
                        "status": "error"
                    },
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}

/// GET /metrics
pub async fn metrics(State(state): State<SharedState>) -> Response {
    debug!("Metrics endpoint requested");

    match encode_metrics(&state.metrics()) {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics_content_type())],
            text,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
