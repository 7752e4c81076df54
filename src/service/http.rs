use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{PredictionService, ServiceError};
use crate::config::ClientConfig;
use crate::models::{PredictionRequest, PredictionResult, ServiceHealth, Symptom, SymptomListResponse};

/// Async HTTP client for the prediction service.
pub struct HttpPredictionClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Error body of a 422 from the service. FastAPI-style services send either
/// `{"detail": {"errors": [..]}}` or `{"detail": [{"msg": ..}, ..]}`.
#[derive(Deserialize)]
struct RejectionBody {
    #[serde(default)]
    detail: serde_json::Value,
}

impl HttpPredictionClient {
    /// Build a client with the configured timeouts.
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Client for `ClientConfig::from_env()`.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            ServiceError::Connection(self.base_url.clone())
        } else {
            ServiceError::HttpClient(e.to_string())
        }
    }

    /// Classify the status, then decode the body.
    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

fn classify_status(status: u16, body: &[u8]) -> ServiceError {
    match status {
        503 => ServiceError::NotReady,
        422 => ServiceError::Rejected {
            errors: rejection_messages(body),
        },
        _ => ServiceError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

fn rejection_messages(body: &[u8]) -> Vec<String> {
    let Ok(parsed) = serde_json::from_slice::<RejectionBody>(body) else {
        return vec![String::from_utf8_lossy(body).into_owned()];
    };

    let as_text = |v: &serde_json::Value| match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("msg")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    };

    match &parsed.detail {
        serde_json::Value::Object(map) => match map.get("errors") {
            Some(serde_json::Value::Array(items)) => items.iter().map(as_text).collect(),
            _ => vec![parsed.detail.to_string()],
        },
        serde_json::Value::Array(items) => items.iter().map(as_text).collect(),
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl PredictionService for HttpPredictionClient {
    async fn fetch_symptoms(&self) -> Result<Vec<Symptom>, ServiceError> {
        let response = self
            .client
            .get(self.url("/symptoms"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: SymptomListResponse = self.read_json(response).await?;
        Ok(parsed.symptoms.unwrap_or_default())
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, ServiceError> {
        tracing::debug!(
            animal = %request.animal,
            symptom_count = request.symptoms.len(),
            top_k = request.top_k,
            "POST /predict"
        );

        let response = self
            .client
            .post(self.url("/predict"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response).await
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response).await
    }
}
