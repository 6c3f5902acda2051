//! Test fixtures and helper implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use triage_desk::config::AppConfig;
use triage_desk::error::{Result, TriageError};
use triage_desk::http::create_router;
use triage_desk::service::AppState;
use triage_desk::store::{InMemoryPatientStore, PatientStore};
use triage_desk::types::{NewPatient, PatientId, PatientRecord, PriorityTier};

/// Patient store whose every call fails, for exercising error paths
#[derive(Debug, Default)]
pub struct FailingPatientStore {
    calls: AtomicUsize,
}

impl FailingPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls attempted
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TriageError::store("connection refused").into())
    }
}

#[async_trait]
impl PatientStore for FailingPatientStore {
    async fn insert_patient(&self, _patient: NewPatient) -> Result<PatientId> {
        self.fail()
    }

    async fn find_waiting_patients(&self) -> Result<Vec<PatientRecord>> {
        self.fail()
    }

    async fn find_latest_by_name_and_code(
        &self,
        _name: &str,
        _code: &str,
    ) -> Result<Option<PatientRecord>> {
        self.fail()
    }

    async fn mark_treated(&self, _id: PatientId) -> Result<bool> {
        self.fail()
    }

    async fn list_patients(&self) -> Result<Vec<PatientRecord>> {
        self.fail()
    }

    async fn ping(&self) -> Result<()> {
        self.fail()
    }

    async fn close(&self) {}

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Builder for patients inserted directly into a store
#[derive(Debug, Clone)]
pub struct PatientBuilder {
    patient: NewPatient,
}

impl PatientBuilder {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            patient: NewPatient {
                name: name.to_string(),
                injury_type: Some("laceration".to_string()),
                pain_level: 5,
                date_of_birth: None,
                gender: None,
                code: code.to_string(),
                priority_tier: PriorityTier::Urgent,
            },
        }
    }

    pub fn tier(mut self, tier: PriorityTier) -> Self {
        self.patient.priority_tier = tier;
        self
    }

    pub fn pain(mut self, pain_level: i64) -> Self {
        self.patient.pain_level = pain_level;
        self
    }

    pub fn build(self) -> NewPatient {
        self.patient
    }
}

/// A started app state around the given store
pub async fn started_state(store: Arc<dyn PatientStore>) -> Arc<AppState> {
    started_state_with_config(AppConfig::default(), store).await
}

pub async fn started_state_with_config(
    config: AppConfig,
    store: Arc<dyn PatientStore>,
) -> Arc<AppState> {
    let state = AppState::with_store(config, store).expect("Failed to build app state");
    state.start().await.expect("Failed to start app state");
    Arc::new(state)
}

/// Router and state backed by a fresh in-memory store
pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = started_state(Arc::new(InMemoryPatientStore::default())).await;
    (create_router(state.clone()), state)
}

/// Send a request with an optional JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Send a request with a raw, possibly malformed, JSON body
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Send a request and decode the JSON response
pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, body).await;
    let status = response.status();
    (status, read_json(response).await)
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
