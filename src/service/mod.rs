//! External prediction service contract.
//!
//! The controller only talks to the service through `PredictionService`,
//! so tests can swap in `MockPredictionService` while the app uses
//! `HttpPredictionClient`.

pub mod http;
pub mod mock;

pub use http::*;
pub use mock::*;

use std::future::Future;

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::{PredictionRequest, PredictionResult, ServiceHealth, Symptom};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Prediction service is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Prediction service is not ready (artifacts not loaded)")]
    NotReady,

    #[error("Prediction service rejected the input: {}", .errors.join("; "))]
    Rejected { errors: Vec<String> },

    #[error("Prediction service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from prediction service: {0}")]
    Malformed(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Invalid client configuration: {0}")]
    Config(#[from] ConfigError),
}

/// The two (plus health) operations the client consumes.
///
/// Futures are `Send` so a submission can run on a spawned task.
pub trait PredictionService: Send + Sync {
    /// `GET /symptoms`. A missing or empty list is an empty catalog.
    fn fetch_symptoms(&self) -> impl Future<Output = Result<Vec<Symptom>, ServiceError>> + Send;

    /// `POST /predict`.
    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResult, ServiceError>> + Send;

    /// `GET /health`.
    fn health(&self) -> impl Future<Output = Result<ServiceHealth, ServiceError>> + Send;
}
