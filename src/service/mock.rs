use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use super::{PredictionService, ServiceError};
use crate::models::{PredictionRequest, PredictionResult, ServiceHealth, Symptom};

/// What the mock answers to `predict`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Result(PredictionResult),
    Status(u16),
    Timeout,
    Malformed,
}

/// Holds a gated mock's `predict` call open until released.
#[derive(Clone)]
pub struct MockGate(Arc<Semaphore>);

impl MockGate {
    /// Let one waiting `predict` call finish.
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

/// Mock prediction service for testing. Records every request.
pub struct MockPredictionService {
    /// `None` makes `fetch_symptoms` fail as unreachable.
    symptoms: Mutex<Option<Vec<Symptom>>>,
    reply: Mutex<MockReply>,
    requests: Mutex<Vec<PredictionRequest>>,
    predict_calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl MockPredictionService {
    pub fn new(symptoms: Vec<Symptom>) -> Self {
        Self {
            symptoms: Mutex::new(Some(symptoms)),
            reply: Mutex::new(MockReply::Status(500)),
            requests: Mutex::new(Vec::new()),
            predict_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// A service whose `/symptoms` is unreachable.
    pub fn unavailable() -> Self {
        Self {
            symptoms: Mutex::new(None),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.set_reply(reply);
        self
    }

    /// Every `predict` call waits on the returned gate.
    pub fn gated(mut self) -> (Self, MockGate) {
        let semaphore = Arc::new(Semaphore::new(0));
        self.gate = Some(semaphore.clone());
        (self, MockGate(semaphore))
    }

    /// Replace what the next `fetch_symptoms` returns.
    pub fn set_symptoms(&self, symptoms: Vec<Symptom>) {
        if let Ok(mut current) = self.symptoms.lock() {
            *current = Some(symptoms);
        }
    }

    fn current_symptoms(&self) -> Option<Vec<Symptom>> {
        self.symptoms.lock().ok().and_then(|s| s.clone())
    }

    pub fn set_reply(&self, reply: MockReply) {
        if let Ok(mut current) = self.reply.lock() {
            *current = reply;
        }
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PredictionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl PredictionService for MockPredictionService {
    async fn fetch_symptoms(&self) -> Result<Vec<Symptom>, ServiceError> {
        self.current_symptoms()
            .ok_or_else(|| ServiceError::Connection("mock://unreachable".into()))
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, ServiceError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let reply = self
            .reply
            .lock()
            .map(|r| r.clone())
            .unwrap_or(MockReply::Status(500));

        match reply {
            MockReply::Result(result) => Ok(result),
            MockReply::Status(503) => Err(ServiceError::NotReady),
            MockReply::Status(status) => Err(ServiceError::Status {
                status,
                body: "mock failure".into(),
            }),
            MockReply::Timeout => Err(ServiceError::Timeout(20)),
            MockReply::Malformed => Err(ServiceError::Malformed("expected value at line 1".into())),
        }
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        match self.current_symptoms() {
            Some(symptoms) => Ok(ServiceHealth {
                status: "ok".into(),
                symptoms_count: symptoms.len(),
                i18n_loaded: true,
                predictor_loaded: true,
                missing_artifacts: Vec::new(),
            }),
            None => Err(ServiceError::Connection("mock://unreachable".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Animal;

    fn request() -> PredictionRequest {
        PredictionRequest {
            animal: Animal::Goat,
            symptoms: vec!["fever".into()],
            top_k: 3,
        }
    }

    #[tokio::test]
    async fn mock_records_requests_and_counts_calls() {
        let mock = MockPredictionService::new(Vec::new());
        let _ = mock.predict(&request()).await;
        let _ = mock.predict(&request()).await;
        assert_eq!(mock.predict_calls(), 2);
        assert_eq!(mock.requests()[0].animal, Animal::Goat);
    }

    #[tokio::test]
    async fn mock_defaults_to_server_error() {
        let mock = MockPredictionService::new(Vec::new());
        let err = mock.predict(&request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn unavailable_mock_fails_catalog_and_health() {
        let mock = MockPredictionService::unavailable();
        assert!(matches!(
            mock.fetch_symptoms().await,
            Err(ServiceError::Connection(_))
        ));
        assert!(mock.health().await.is_err());
    }

    #[tokio::test]
    async fn replaced_symptoms_are_served_next() {
        let mock = MockPredictionService::unavailable();
        mock.set_symptoms(vec![Symptom::new("fever", "", "")]);
        assert_eq!(mock.fetch_symptoms().await.unwrap().len(), 1);
        assert_eq!(mock.health().await.unwrap().symptoms_count, 1);
    }

    #[tokio::test]
    async fn gated_mock_waits_for_release() {
        let (mock, gate) = MockPredictionService::new(Vec::new()).gated();
        let mock = Arc::new(mock);

        let task = tokio::spawn({
            let mock = mock.clone();
            async move { mock.predict(&request()).await }
        });

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.release();
        let outcome = task.await.unwrap();
        assert!(outcome.is_err());
        assert_eq!(mock.predict_calls(), 1);
    }
}
