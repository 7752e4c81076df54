use serde::{Deserialize, Serialize};

use super::enums::Language;

/// Placeholder shown wherever the service left a text field empty or absent.
pub const MISSING_TEXT: &str = "—";

/// English/Telugu text triple as sent by the service.
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub te: String,
    #[serde(default)]
    pub display: String,
}

impl BilingualText {
    pub fn new(en: &str, te: &str) -> Self {
        Self {
            en: en.to_string(),
            te: te.to_string(),
            display: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.te.trim().is_empty() && self.display.trim().is_empty()
    }

    /// Text for the given language, `"—"` when nothing usable was sent.
    pub fn text(&self, language: Language) -> String {
        match language {
            Language::English => non_empty(&self.en)
                .or_else(|| non_empty(&self.display))
                .unwrap_or(MISSING_TEXT)
                .to_string(),
            Language::Telugu => non_empty(&self.te).unwrap_or(MISSING_TEXT).to_string(),
            Language::Bilingual => self.bilingual(),
        }
    }

    fn bilingual(&self) -> String {
        if let Some(display) = non_empty(&self.display) {
            return display.to_string();
        }
        match (non_empty(&self.en), non_empty(&self.te)) {
            (Some(en), Some(te)) => format!("{en} / {te}"),
            (Some(one), None) | (None, Some(one)) => one.to_string(),
            (None, None) => MISSING_TEXT.to_string(),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// A selectable symptom. `en` doubles as the stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub te: String,
    #[serde(default)]
    pub display: String,
}

impl Symptom {
    pub fn new(en: &str, te: &str, display: &str) -> Self {
        Self {
            en: en.to_string(),
            te: te.to_string(),
            display: display.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.en
    }

    pub fn label(&self, language: Language) -> String {
        BilingualText {
            en: self.en.clone(),
            te: self.te.clone(),
            display: self.display.clone(),
        }
        .text(language)
    }

    /// Case-insensitive substring match over identifier and both labels.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.en, &self.te, &self.display]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Body of `GET /symptoms`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymptomListResponse {
    #[serde(default)]
    pub symptoms: Option<Vec<Symptom>>,
}
