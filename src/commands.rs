//! UI-facing commands.
//!
//! Thin wrappers over `SessionController` that take plain strings from the
//! frontend and return serializable views. Errors come back as localized
//! strings ready to show.

use std::str::FromStr;

use serde::Serialize;

use crate::i18n::Message;
use crate::models::{Animal, Language};
use crate::result_view::ResultView;
use crate::service::PredictionService;
use crate::session::{SessionController, SessionError, SessionSnapshot};

/// One row of the symptom picker.
#[derive(Debug, Clone, Serialize)]
pub struct SymptomOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalOption {
    pub value: Animal,
    pub label: String,
}

/// Loads the symptom catalog. Called once at startup.
pub async fn initialize<S: PredictionService>(
    session: &SessionController<S>,
    language: Language,
) -> Result<usize, String> {
    session
        .load_catalog()
        .await
        .map_err(|e| e.localized(language))
}

pub fn list_animals(language: Language) -> Vec<AnimalOption> {
    Animal::ALL
        .iter()
        .map(|a| AnimalOption {
            value: *a,
            label: a.label(language),
        })
        .collect()
}

/// Updates the search query (when given) and returns the matching symptoms.
pub fn search_symptoms<S: PredictionService>(
    session: &SessionController<S>,
    query: Option<String>,
    language: Language,
) -> Result<Vec<SymptomOption>, String> {
    if let Some(query) = query {
        session.set_query(&query).map_err(|e| e.localized(language))?;
    }

    let selected = session.selection().map_err(|e| e.localized(language))?;
    let visible = session
        .visible_symptoms()
        .map_err(|e| e.localized(language))?;

    Ok(visible
        .into_iter()
        .map(|s| SymptomOption {
            selected: selected.iter().any(|id| id == s.id()),
            label: s.label(language),
            id: s.en,
        })
        .collect())
}

pub fn toggle_symptom<S: PredictionService>(
    session: &SessionController<S>,
    symptom_id: String,
    language: Language,
) -> Result<SessionSnapshot, String> {
    if symptom_id.trim().is_empty() {
        return Err(Message::SymptomRequired.localized(language));
    }

    session
        .toggle(&symptom_id)
        .map_err(|e| e.localized(language))?;
    session.snapshot().map_err(|e| e.localized(language))
}

pub fn clear_form<S: PredictionService>(
    session: &SessionController<S>,
    language: Language,
) -> Result<SessionSnapshot, String> {
    session.clear().map_err(|e| e.localized(language))?;
    session.snapshot().map_err(|e| e.localized(language))
}

pub fn get_session_state<S: PredictionService>(
    session: &SessionController<S>,
    language: Language,
) -> Result<SessionSnapshot, String> {
    session.snapshot().map_err(|e| e.localized(language))
}

/// Submits the current selection for `animal` and renders the result.
///
/// Returns `Ok(None)` when the form was cleared while the request was
/// outstanding; there is nothing left to show.
pub async fn run_prediction<S: PredictionService>(
    session: &SessionController<S>,
    animal: String,
    language: Language,
) -> Result<Option<ResultView>, String> {
    let animal = Animal::from_str(animal.trim()).map_err(|_| {
        Message::UnknownAnimal {
            value: animal.trim().to_string(),
        }
        .localized(language)
    })?;

    match session.submit(animal).await {
        Ok(result) => Ok(Some(ResultView::build(&result, language))),
        Err(SessionError::Superseded) => Ok(None),
        Err(e) => Err(e.localized(language)),
    }
}
