//! Selection and request controller.
//!
//! `SessionController` owns one user session: the loaded catalog, the
//! search query, the bounded symptom selection and the UI status. It is
//! shared via `Arc`; every operation takes `&self`. Locks are held only
//! for synchronous sections and never across the prediction call.
//!
//! At most one prediction request is outstanding at a time. A `submit`
//! issued while one is in flight is rejected, not queued, so a response
//! can never overwrite the result of a newer submission.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::{ClientConfig, ConfigError};
use crate::i18n::Message;
use crate::models::{Animal, Language, PredictionRequest, PredictionResult, ServiceHealth, Symptom};
use crate::service::{PredictionService, ServiceError};

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Local, pre-flight validation failures. Never touch the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("select at least {min} symptoms")]
    TooFew { min: usize, selected: usize },
    #[error("you can select at most {max} symptoms")]
    LimitReached { max: usize },
    #[error("unknown symptom: {0}")]
    UnknownSymptom(String),
}

impl SelectionError {
    pub fn message(&self) -> Message {
        match self {
            Self::TooFew { min, .. } => Message::SelectAtLeast { min: *min },
            Self::LimitReached { max } => Message::SelectAtMost { max: *max },
            Self::UnknownSymptom(id) => Message::UnknownSymptom { id: id.clone() },
        }
    }
}

/// Errors surfaced at the controller boundary.
///
/// Service failures keep their cause as `source` for logging while the
/// display text stays generic.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] SelectionError),

    #[error("a prediction is already in progress")]
    RequestInFlight,

    /// The form was cleared while the request was outstanding.
    #[error("The form was cleared before the prediction finished.")]
    Superseded,

    #[error("Could not load the symptom list. Check that the prediction service is reachable.")]
    CatalogUnavailable(#[source] ServiceError),

    #[error("Prediction failed. Check that the prediction service is reachable.")]
    PredictFailed(#[source] ServiceError),

    #[error("The prediction service is not reachable.")]
    ServiceUnreachable(#[source] ServiceError),

    #[error("Internal lock error")]
    LockPoisoned,
}

impl SessionError {
    pub fn message(&self) -> Message {
        match self {
            Self::Validation(e) => e.message(),
            Self::RequestInFlight => Message::RequestInFlight,
            Self::Superseded => Message::Superseded,
            Self::CatalogUnavailable(_) => Message::CatalogUnavailable,
            Self::PredictFailed(_) => Message::PredictFailed,
            Self::ServiceUnreachable(_) => Message::ServiceUnreachable,
            Self::LockPoisoned => Message::Internal,
        }
    }

    pub fn localized(&self, language: Language) -> String {
        self.message().localized(language)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// ═══════════════════════════════════════════════════════════
// State types
// ═══════════════════════════════════════════════════════════

/// UI status. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    Idle,
    Loading {
        request_id: Uuid,
    },
    Success {
        result: Arc<PredictionResult>,
        /// RFC 3339.
        completed_at: String,
    },
    Error {
        message: String,
    },
}

impl Status {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn result(&self) -> Option<&Arc<PredictionResult>> {
        match self {
            Self::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Read-only copy of the form for the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub query: String,
    pub selection: Vec<String>,
    pub min_symptoms: usize,
    pub max_symptoms: usize,
    pub can_submit: bool,
    pub in_flight: bool,
    pub status: Status,
}

struct FormState {
    query: String,
    /// Insertion-ordered, duplicate-free.
    selection: Vec<String>,
    status: Status,
    /// Request id of the outstanding prediction, if any.
    in_flight: Option<Uuid>,
    /// Replaced by `clear()`; responses for an older generation are dropped.
    generation: Uuid,
}

impl FormState {
    fn new() -> Self {
        Self {
            query: String::new(),
            selection: Vec::new(),
            status: Status::Idle,
            in_flight: None,
            generation: Uuid::new_v4(),
        }
    }
}

/// Single-flight token for one submission.
///
/// Dropping it releases the slot if the submission never completed, e.g.
/// when the caller drops the `submit` future. A form still showing this
/// request as loading goes back to `Idle`.
struct InFlightGuard<'a> {
    form: &'a Mutex<FormState>,
    request_id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let Ok(mut form) = self.form.lock() else {
            return;
        };
        if form.in_flight != Some(self.request_id) {
            return;
        }
        form.in_flight = None;
        if matches!(form.status, Status::Loading { request_id } if request_id == self.request_id) {
            form.status = Status::Idle;
        }
        tracing::warn!(
            request_id = %self.request_id,
            "Prediction abandoned before a response arrived"
        );
    }
}

// ═══════════════════════════════════════════════════════════
// SessionController
// ═══════════════════════════════════════════════════════════

pub struct SessionController<S> {
    config: ClientConfig,
    service: S,
    /// Empty until `load_catalog` succeeds. Read-mostly.
    catalog: RwLock<Catalog>,
    form: Mutex<FormState>,
}

impl<S: PredictionService> SessionController<S> {
    pub fn new(config: ClientConfig, service: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            service,
            catalog: RwLock::new(Catalog::default()),
            form: Mutex::new(FormState::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn lock_form(&self) -> Result<MutexGuard<'_, FormState>, SessionError> {
        self.form.lock().map_err(|_| SessionError::LockPoisoned)
    }

    // ── Catalog ─────────────────────────────────────────────

    /// Fetch the symptom catalog. On failure the catalog is left empty.
    ///
    /// Selected identifiers that are no longer in the catalog are dropped.
    pub async fn load_catalog(&self) -> Result<usize, SessionError> {
        let loaded = match Catalog::load(&self.service).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(error = %e, "Symptom catalog unavailable");
                *self.catalog.write().map_err(|_| SessionError::LockPoisoned)? =
                    Catalog::default();
                return Err(SessionError::CatalogUnavailable(e));
            }
        };

        let count = loaded.len();
        // Lock order: catalog, then form.
        let mut catalog = self.catalog.write().map_err(|_| SessionError::LockPoisoned)?;
        let mut form = self.lock_form()?;
        form.selection.retain(|id| loaded.contains(id));
        *catalog = loaded;
        Ok(count)
    }

    pub fn catalog_len(&self) -> Result<usize, SessionError> {
        let catalog = self.catalog.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(catalog.len())
    }

    // ── Search ──────────────────────────────────────────────

    pub fn set_query(&self, query: &str) -> Result<(), SessionError> {
        self.lock_form()?.query = query.to_string();
        Ok(())
    }

    pub fn query(&self) -> Result<String, SessionError> {
        Ok(self.lock_form()?.query.clone())
    }

    /// Catalog entries matching the current query, in catalog order.
    pub fn visible_symptoms(&self) -> Result<Vec<Symptom>, SessionError> {
        let query = self.query()?;
        let catalog = self.catalog.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(catalog.filter(&query).cloned().collect())
    }

    // ── Selection ───────────────────────────────────────────

    /// Remove `id` if selected, otherwise add it within the bounds.
    ///
    /// Removal is always permitted. Adding past `max_symptoms` is rejected
    /// with `LimitReached` and leaves the selection unchanged.
    pub fn toggle(&self, id: &str) -> Result<ToggleOutcome, SessionError> {
        let id = id.trim();
        // Held until the push so a concurrent reload cannot slip in between.
        let catalog = self.catalog.read().map_err(|_| SessionError::LockPoisoned)?;
        let known = catalog.contains(id);

        let mut form = self.lock_form()?;
        if let Some(pos) = form.selection.iter().position(|s| s == id) {
            form.selection.remove(pos);
            tracing::debug!(id, selected = form.selection.len(), "Symptom removed");
            return Ok(ToggleOutcome::Removed);
        }

        if !known {
            return Err(SelectionError::UnknownSymptom(id.to_string()).into());
        }

        let max = self.config.max_symptoms;
        if form.selection.len() >= max {
            tracing::warn!(id, max, "Symptom limit reached");
            return Err(SelectionError::LimitReached { max }.into());
        }

        form.selection.push(id.to_string());
        tracing::debug!(id, selected = form.selection.len(), "Symptom added");
        Ok(ToggleOutcome::Added)
    }

    pub fn selection(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.lock_form()?.selection.clone())
    }

    pub fn is_selected(&self, id: &str) -> Result<bool, SessionError> {
        Ok(self.lock_form()?.selection.iter().any(|s| s == id))
    }

    /// Reset selection, query, result and error. No network side effect.
    ///
    /// A request still in flight keeps the single-flight guard engaged, but
    /// its response will be discarded.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut form = self.lock_form()?;
        form.selection.clear();
        form.query.clear();
        form.status = Status::Idle;
        form.generation = Uuid::new_v4();
        tracing::debug!("Session cleared");
        Ok(())
    }

    // ── Status ──────────────────────────────────────────────

    pub fn status(&self) -> Result<Status, SessionError> {
        Ok(self.lock_form()?.status.clone())
    }

    pub fn is_in_flight(&self) -> Result<bool, SessionError> {
        Ok(self.lock_form()?.in_flight.is_some())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let form = self.lock_form()?;
        Ok(SessionSnapshot {
            query: form.query.clone(),
            selection: form.selection.clone(),
            min_symptoms: self.config.min_symptoms,
            max_symptoms: self.config.max_symptoms,
            can_submit: form.in_flight.is_none()
                && form.selection.len() >= self.config.min_symptoms,
            in_flight: form.in_flight.is_some(),
            status: form.status.clone(),
        })
    }

    // ── Prediction ──────────────────────────────────────────

    /// Validate the selection and send exactly one prediction request.
    ///
    /// Validation failures and a request already in flight leave the
    /// status untouched. Service failures move the status to `Error` and
    /// drop any previous result. If the form is cleared before the response
    /// arrives, the response is discarded and `Superseded` is returned.
    pub async fn submit(&self, animal: Animal) -> Result<Arc<PredictionResult>, SessionError> {
        let (request, request_id, generation) = {
            let mut form = self.lock_form()?;

            if form.in_flight.is_some() {
                tracing::warn!("Prediction rejected: request already in flight");
                return Err(SessionError::RequestInFlight);
            }

            let min = self.config.min_symptoms;
            if form.selection.len() < min {
                return Err(SelectionError::TooFew {
                    min,
                    selected: form.selection.len(),
                }
                .into());
            }

            let request_id = Uuid::new_v4();
            form.in_flight = Some(request_id);
            form.status = Status::Loading { request_id };

            let request = PredictionRequest {
                animal,
                symptoms: form.selection.clone(),
                top_k: self.config.top_k,
            };
            (request, request_id, form.generation)
        };

        tracing::info!(
            %request_id,
            animal = %animal,
            symptom_count = request.symptoms.len(),
            "Submitting prediction"
        );

        let _guard = InFlightGuard {
            form: &self.form,
            request_id,
        };
        let outcome = self.service.predict(&request).await;
        self.complete(request_id, generation, outcome)
    }

    /// Apply a prediction outcome to the form and release the slot.
    fn complete(
        &self,
        request_id: Uuid,
        generation: Uuid,
        outcome: Result<PredictionResult, ServiceError>,
    ) -> Result<Arc<PredictionResult>, SessionError> {
        let mut form = self.lock_form()?;
        form.in_flight = None;

        if form.generation != generation {
            match &outcome {
                Ok(_) => tracing::debug!(%request_id, "Discarding prediction for a cleared form"),
                Err(e) => {
                    tracing::debug!(%request_id, error = %e, "Discarding failure for a cleared form")
                }
            }
            return Err(SessionError::Superseded);
        }

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                form.status = Status::Success {
                    result: result.clone(),
                    completed_at: chrono::Utc::now().to_rfc3339(),
                };
                tracing::info!(
                    %request_id,
                    predictions = result.predictions.len(),
                    "Prediction completed"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(%request_id, error = %e, "Prediction failed");
                form.status = Status::Error {
                    message: Message::PredictFailed.english(),
                };
                Err(SessionError::PredictFailed(e))
            }
        }
    }

    /// Query `GET /health`.
    pub async fn check_health(&self) -> Result<ServiceHealth, SessionError> {
        let health = self.service.health().await.map_err(|e| {
            tracing::warn!(error = %e, "Health check failed");
            SessionError::ServiceUnreachable(e)
        })?;
        if !health.is_ready() {
            tracing::warn!(
                status = %health.status,
                missing = health.missing_artifacts.len(),
                "Prediction service not ready"
            );
        }
        Ok(health)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::{BilingualText, DiseasePrediction};
    use crate::service::{MockPredictionService, MockReply};

    type TestSession = SessionController<MockPredictionService>;

    fn scenario_symptoms() -> Vec<Symptom> {
        vec![
            Symptom::new("fever", "", "Fever / జ్వరం"),
            Symptom::new("cough", "", "Cough / దగ్గు"),
            Symptom::new("limp", "", "Limping / కుంటుట"),
        ]
    }

    fn numbered_symptoms(n: usize) -> Vec<Symptom> {
        (0..n)
            .map(|i| Symptom::new(&format!("s{i}"), "", &format!("Symptom {i}")))
            .collect()
    }

    fn foot_rot() -> PredictionResult {
        PredictionResult {
            animal: BilingualText::new("Cow", "ఆవు"),
            symptoms: Vec::new(),
            predictions: vec![DiseasePrediction {
                disease: BilingualText {
                    display: "Foot Rot".into(),
                    ..Default::default()
                },
                probability: None,
                probability_percent: Some(72.5),
            }],
            risk: None,
            prevention: None,
            precautions: None,
        }
    }

    async fn session_with(config: ClientConfig, service: MockPredictionService) -> Arc<TestSession> {
        let session = SessionController::new(config, service).unwrap();
        session.load_catalog().await.unwrap();
        Arc::new(session)
    }

    async fn scenario_session(reply: MockReply) -> Arc<TestSession> {
        session_with(
            ClientConfig::default(),
            MockPredictionService::new(scenario_symptoms()).with_reply(reply),
        )
        .await
    }

    async fn wait_for_in_flight(session: &TestSession) {
        while !session.is_in_flight().unwrap() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn two_symptoms_fail_minimum() {
        let session = scenario_session(MockReply::Result(foot_rot())).await;
        session.toggle("fever").unwrap();
        session.toggle("cough").unwrap();
        assert_eq!(session.selection().unwrap(), vec!["fever", "cough"]);

        let err = session.submit(Animal::Cow).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "select at least 3 symptoms");
        assert!(matches!(
            err,
            SessionError::Validation(SelectionError::TooFew { min: 3, selected: 2 })
        ));
        assert_eq!(session.service().predict_calls(), 0);
        assert_eq!(session.status().unwrap(), Status::Idle);
    }

    #[tokio::test]
    async fn three_symptoms_send_one_request() {
        let session = scenario_session(MockReply::Result(foot_rot())).await;
        for id in ["fever", "cough", "limp"] {
            assert_eq!(session.toggle(id).unwrap(), ToggleOutcome::Added);
        }

        let result = session.submit(Animal::Cow).await.unwrap();

        let requests = session.service().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            PredictionRequest {
                animal: Animal::Cow,
                symptoms: vec!["fever".into(), "cough".into(), "limp".into()],
                top_k: 3,
            }
        );

        assert_eq!(result.predictions[0].disease.display, "Foot Rot");
        let status = session.status().unwrap();
        let shown = status.result().expect("success status");
        assert_eq!(shown.predictions.len(), 1);
        assert_eq!(shown.predictions[0].percent(), Some(72.5));
        assert!(!session.is_in_flight().unwrap());
    }

    #[tokio::test]
    async fn ninth_symptom_is_rejected_at_max() {
        let session = session_with(
            ClientConfig::default(),
            MockPredictionService::new(numbered_symptoms(9)),
        )
        .await;
        for i in 0..8 {
            session.toggle(&format!("s{i}")).unwrap();
        }
        let before = session.selection().unwrap();

        let err = session.toggle("s8").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(SelectionError::LimitReached { max: 8 })
        ));
        assert_eq!(session.selection().unwrap(), before);
        assert_eq!(session.status().unwrap(), Status::Idle);
    }

    #[tokio::test]
    async fn removal_allowed_at_max() {
        let session = session_with(
            ClientConfig::default().with_bounds(1, 2),
            MockPredictionService::new(numbered_symptoms(3)),
        )
        .await;
        session.toggle("s0").unwrap();
        session.toggle("s1").unwrap();
        assert_eq!(session.toggle("s0").unwrap(), ToggleOutcome::Removed);
        assert_eq!(session.toggle("s2").unwrap(), ToggleOutcome::Added);
        assert_eq!(session.selection().unwrap(), vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn server_error_sets_error_and_clears_prior_result() {
        let session = scenario_session(MockReply::Result(foot_rot())).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }
        session.submit(Animal::Cow).await.unwrap();
        assert!(session.status().unwrap().result().is_some());

        session.service().set_reply(MockReply::Status(500));
        let err = session.submit(Animal::Cow).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::PredictFailed(ServiceError::Status { status: 500, .. })
        ));
        assert!(!err.is_validation());

        let status = session.status().unwrap();
        assert!(status.result().is_none());
        assert!(status.error().unwrap().starts_with("Prediction failed"));
        assert_eq!(session.service().predict_calls(), 2);
    }

    #[tokio::test]
    async fn timeout_and_malformed_use_the_same_error_path() {
        for reply in [MockReply::Timeout, MockReply::Malformed, MockReply::Status(503)] {
            let session = scenario_session(reply).await;
            for id in ["fever", "cough", "limp"] {
                session.toggle(id).unwrap();
            }
            let err = session.submit(Animal::Buffalo).await.unwrap_err();
            assert!(matches!(err, SessionError::PredictFailed(_)));
            assert_eq!(
                session.status().unwrap().error(),
                Some(Message::PredictFailed.english().as_str())
            );
        }
    }

    #[tokio::test]
    async fn submit_while_loading_is_rejected() {
        let (mock, gate) = MockPredictionService::new(scenario_symptoms())
            .with_reply(MockReply::Result(foot_rot()))
            .gated();
        let session = session_with(ClientConfig::default(), mock).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit(Animal::Cow).await }
        });
        wait_for_in_flight(&session).await;
        assert!(session.status().unwrap().is_loading());

        let err = session.submit(Animal::Cow).await.unwrap_err();
        assert!(matches!(err, SessionError::RequestInFlight));
        assert_eq!(session.service().predict_calls(), 1);
        assert!(!session.snapshot().unwrap().can_submit);

        // Toggling during the request does not affect its snapshot.
        assert_eq!(session.toggle("limp").unwrap(), ToggleOutcome::Removed);

        gate.release();
        first.await.unwrap().unwrap();

        assert!(session.status().unwrap().result().is_some());
        assert_eq!(session.service().requests()[0].symptoms.len(), 3);
        assert_eq!(session.selection().unwrap(), vec!["fever", "cough"]);
        assert_eq!(session.service().predict_calls(), 1);
    }

    #[tokio::test]
    async fn clear_during_flight_discards_response() {
        let (mock, gate) = MockPredictionService::new(scenario_symptoms())
            .with_reply(MockReply::Result(foot_rot()))
            .gated();
        let session = session_with(ClientConfig::default(), mock).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit(Animal::Cow).await }
        });
        wait_for_in_flight(&session).await;

        session.clear().unwrap();
        assert_eq!(session.status().unwrap(), Status::Idle);
        assert!(session.selection().unwrap().is_empty());

        // Guard stays engaged until the outstanding response lands.
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }
        assert!(matches!(
            session.submit(Animal::Cow).await,
            Err(SessionError::RequestInFlight)
        ));

        gate.release();
        assert!(matches!(
            first.await.unwrap(),
            Err(SessionError::Superseded)
        ));
        assert_eq!(session.status().unwrap(), Status::Idle);
        assert!(!session.is_in_flight().unwrap());
    }

    #[tokio::test]
    async fn failure_after_clear_is_superseded() {
        let (mock, gate) = MockPredictionService::new(scenario_symptoms())
            .with_reply(MockReply::Status(500))
            .gated();
        let session = session_with(ClientConfig::default(), mock).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit(Animal::Goat).await }
        });
        wait_for_in_flight(&session).await;
        session.clear().unwrap();

        gate.release();
        let err = first.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::Superseded));
        assert_eq!(err.message(), Message::Superseded);
        assert_eq!(session.status().unwrap(), Status::Idle);
    }

    #[tokio::test]
    async fn dropped_submit_releases_the_session() {
        let (mock, gate) = MockPredictionService::new(scenario_symptoms())
            .with_reply(MockReply::Result(foot_rot()))
            .gated();
        let session = session_with(ClientConfig::default(), mock).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), session.submit(Animal::Cow)).await;
        assert!(abandoned.is_err());

        assert!(!session.is_in_flight().unwrap());
        assert_eq!(session.status().unwrap(), Status::Idle);
        assert!(session.snapshot().unwrap().can_submit);

        gate.release();
        let result = session.submit(Animal::Cow).await.unwrap();
        assert_eq!(result.predictions.len(), 1);
        assert!(session.status().unwrap().result().is_some());
        assert_eq!(session.service().predict_calls(), 2);
    }

    #[tokio::test]
    async fn aborted_submit_task_releases_the_session() {
        let (mock, gate) = MockPredictionService::new(scenario_symptoms())
            .with_reply(MockReply::Result(foot_rot()))
            .gated();
        let session = session_with(ClientConfig::default(), mock).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.submit(Animal::Sheep).await }
        });
        wait_for_in_flight(&session).await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!session.is_in_flight().unwrap());
        assert_eq!(session.status().unwrap(), Status::Idle);

        gate.release();
        assert!(session.submit(Animal::Sheep).await.is_ok());
    }

    #[tokio::test]
    async fn reload_drops_selected_ids_missing_from_new_catalog() {
        let session = scenario_session(MockReply::Status(500)).await;
        session.toggle("fever").unwrap();
        session.toggle("limp").unwrap();

        session.service().set_symptoms(vec![
            Symptom::new("fever", "", ""),
            Symptom::new("bloat", "", ""),
        ]);
        assert_eq!(session.load_catalog().await.unwrap(), 2);

        assert_eq!(session.selection().unwrap(), vec!["fever"]);
        assert!(session.toggle("limp").is_err());
        assert_eq!(session.toggle("bloat").unwrap(), ToggleOutcome::Added);
    }

    #[tokio::test]
    async fn toggle_holds_catalog_view_until_selection_updates() {
        let session = scenario_session(MockReply::Status(500)).await;

        let form = session.form.lock().unwrap();
        let toggler = std::thread::spawn({
            let session = session.clone();
            move || session.toggle("fever")
        });

        // While the toggle waits on the form, a reload must not be able to
        // swap the catalog underneath it.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let mut blocked = false;
        while std::time::Instant::now() < deadline {
            if session.catalog.try_write().is_err() {
                blocked = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        drop(form);

        assert!(blocked);
        assert_eq!(toggler.join().unwrap().unwrap(), ToggleOutcome::Added);
    }

    #[tokio::test]
    async fn poisoned_locks_are_reported() {
        let session = scenario_session(MockReply::Status(500)).await;

        let poison_catalog = {
            let session = session.clone();
            std::thread::spawn(move || {
                let _catalog = session.catalog.write().unwrap();
                panic!("poison catalog");
            })
        };
        assert!(poison_catalog.join().is_err());
        assert!(matches!(session.catalog_len(), Err(SessionError::LockPoisoned)));

        let poison_form = {
            let session = session.clone();
            std::thread::spawn(move || {
                let _form = session.form.lock().unwrap();
                panic!("poison form");
            })
        };
        assert!(poison_form.join().is_err());
        assert!(matches!(session.is_in_flight(), Err(SessionError::LockPoisoned)));
    }

    #[tokio::test]
    async fn toggle_sequences_respect_bounds_and_uniqueness() {
        let session = session_with(
            ClientConfig::default(),
            MockPredictionService::new(numbered_symptoms(12)),
        )
        .await;

        // Deterministic LCG walk over the catalog.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let id = format!("s{}", (seed >> 33) % 12);
            let _ = session.toggle(&id);

            let selection = session.selection().unwrap();
            assert!(selection.len() <= 8);
            let mut deduped = selection.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), selection.len());
        }
    }

    #[tokio::test]
    async fn remove_then_re_add_restores_membership() {
        let session = scenario_session(MockReply::Status(500)).await;
        session.toggle("fever").unwrap();
        session.toggle("cough").unwrap();

        session.toggle("fever").unwrap();
        session.toggle("fever").unwrap();

        let mut selection = session.selection().unwrap();
        selection.sort();
        assert_eq!(selection, vec!["cough", "fever"]);
    }

    #[tokio::test]
    async fn unknown_symptom_is_rejected() {
        let session = scenario_session(MockReply::Status(500)).await;
        let err = session.toggle("barking").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(SelectionError::UnknownSymptom(ref id)) if id == "barking"
        ));
        assert!(session.selection().unwrap().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_leaves_empty_catalog() {
        let session =
            SessionController::new(ClientConfig::default(), MockPredictionService::unavailable())
                .unwrap();

        let err = session.load_catalog().await.unwrap_err();
        assert!(matches!(err, SessionError::CatalogUnavailable(_)));
        assert_eq!(err.message(), Message::CatalogUnavailable);
        assert_eq!(session.catalog_len().unwrap(), 0);
        assert!(session.visible_symptoms().unwrap().is_empty());
        assert!(session.toggle("fever").is_err());
    }

    #[tokio::test]
    async fn query_filters_visible_symptoms_and_clear_resets() {
        let session = scenario_session(MockReply::Status(500)).await;
        session.set_query("CO").unwrap();
        let visible: Vec<String> = session
            .visible_symptoms()
            .unwrap()
            .into_iter()
            .map(|s| s.en)
            .collect();
        assert_eq!(visible, vec!["cough"]);

        session.toggle("cough").unwrap();
        session.clear().unwrap();
        assert_eq!(session.query().unwrap(), "");
        assert_eq!(session.visible_symptoms().unwrap().len(), 3);
        assert!(session.selection().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_after_error_returns_to_idle() {
        let session = scenario_session(MockReply::Status(500)).await;
        for id in ["fever", "cough", "limp"] {
            session.toggle(id).unwrap();
        }
        let _ = session.submit(Animal::Sheep).await;
        assert!(session.status().unwrap().error().is_some());

        session.clear().unwrap();
        assert_eq!(session.status().unwrap(), Status::Idle);
    }

    #[tokio::test]
    async fn snapshot_reports_submit_readiness() {
        let session = session_with(
            ClientConfig::default().with_bounds(2, 3),
            MockPredictionService::new(scenario_symptoms()),
        )
        .await;
        session.toggle("fever").unwrap();
        assert!(!session.snapshot().unwrap().can_submit);
        session.toggle("limp").unwrap();

        let snapshot = session.snapshot().unwrap();
        assert!(snapshot.can_submit);
        assert_eq!(snapshot.min_symptoms, 2);
        assert_eq!(snapshot.max_symptoms, 3);
        assert_eq!(snapshot.selection, vec!["fever", "limp"]);
    }

    #[tokio::test]
    async fn health_passes_through() {
        let session = scenario_session(MockReply::Status(500)).await;
        let health = session.check_health().await.unwrap();
        assert!(health.is_ready());
        assert_eq!(health.symptoms_count, 3);

        let offline =
            SessionController::new(ClientConfig::default(), MockPredictionService::unavailable())
                .unwrap();
        assert!(matches!(
            offline.check_health().await,
            Err(SessionError::ServiceUnreachable(_))
        ));
    }

    #[test]
    fn invalid_config_is_refused() {
        let result = SessionController::new(
            ClientConfig::default().with_bounds(4, 1),
            MockPredictionService::new(Vec::new()),
        );
        assert!(matches!(result, Err(ConfigError::InvalidBounds { min: 4, max: 1 })));
    }

    #[test]
    fn status_serializes_tagged() {
        let json = serde_json::to_value(Status::Error {
            message: "x".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "x");
        assert_eq!(serde_json::to_value(Status::Idle).unwrap()["state"], "idle");
    }

    #[test]
    fn localized_messages() {
        let err = SessionError::from(SelectionError::TooFew { min: 3, selected: 1 });
        assert_eq!(err.localized(Language::English), "select at least 3 symptoms");
        assert_eq!(err.localized(Language::Telugu), "కనీసం 3 లక్షణాలను ఎంచుకోండి");
    }
}
