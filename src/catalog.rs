//! Symptom catalog and search.
//!
//! Loaded once from `GET /symptoms`, read-only afterwards. `filter` is a
//! lazy, order-preserving, case-insensitive substring search over the
//! identifier and both display labels.

use std::collections::HashSet;

use crate::models::Symptom;
use crate::service::{PredictionService, ServiceError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    symptoms: Vec<Symptom>,
}

impl Catalog {
    /// Build from a raw service list: blank identifiers are skipped and only
    /// the first entry per identifier is kept.
    pub fn from_symptoms(raw: Vec<Symptom>) -> Self {
        let mut seen = HashSet::new();
        let mut symptoms = Vec::with_capacity(raw.len());

        for mut symptom in raw {
            symptom.en = symptom.en.trim().to_string();
            if symptom.en.is_empty() {
                tracing::warn!("Skipping catalog entry without identifier");
                continue;
            }
            if !seen.insert(symptom.en.clone()) {
                tracing::warn!(id = %symptom.en, "Duplicate catalog entry dropped");
                continue;
            }
            symptoms.push(symptom);
        }

        Self { symptoms }
    }

    /// Fetch the full symptom list once.
    pub async fn load<S: PredictionService>(service: &S) -> Result<Self, ServiceError> {
        let raw = service.fetch_symptoms().await?;
        let catalog = Self::from_symptoms(raw);
        tracing::info!(count = catalog.len(), "Symptom catalog loaded");
        Ok(catalog)
    }

    /// Symptoms matching `query`, in catalog order.
    ///
    /// Empty or whitespace-only queries match everything.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Symptom> + 'a {
        let needle = query.trim().to_lowercase();
        self.symptoms
            .iter()
            .filter(move |s| needle.is_empty() || s.matches_lowercase(&needle))
    }

    pub fn get(&self, id: &str) -> Option<&Symptom> {
        self.symptoms.iter().find(|s| s.en == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symptom> {
        self.symptoms.iter()
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}
