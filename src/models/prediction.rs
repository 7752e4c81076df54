use serde::{Deserialize, Serialize};

use super::enums::{Animal, RiskLevel};
use super::symptom::BilingualText;

/// Body of `POST /predict`. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub animal: Animal,
    pub symptoms: Vec<String>,
    pub top_k: u8,
}

/// One ranked disease from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePrediction {
    #[serde(default)]
    pub disease: BilingualText,
    /// Raw probability in `[0, 1]`.
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub probability_percent: Option<f64>,
}

impl DiseasePrediction {
    /// Percentage as sent, or derived from the raw probability.
    pub fn percent(&self) -> Option<f64> {
        self.probability_percent
            .or_else(|| self.probability.map(|p| (p * 10_000.0).round() / 100.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Explicit level when the service sends one.
    #[serde(default)]
    pub level: Option<RiskLevel>,
    /// Bilingual phrase such as "High Risk", for display.
    #[serde(default)]
    pub overall: BilingualText,
    #[serde(default)]
    pub explanation: String,
}

impl RiskAssessment {
    /// The explicit `level` field, else the canonical English phrase.
    pub fn resolved_level(&self) -> Option<RiskLevel> {
        self.level
            .or_else(|| RiskLevel::from_phrase(&self.overall.en))
    }
}

/// Response of `POST /predict`.
///
/// Only `predictions` is mandatory; every other field may be absent and is
/// rendered as "—".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default)]
    pub animal: BilingualText,
    #[serde(default)]
    pub symptoms: Vec<BilingualText>,
    /// Ordered by descending probability upstream; never re-sorted here.
    pub predictions: Vec<DiseasePrediction>,
    #[serde(default)]
    pub risk: Option<RiskAssessment>,
    #[serde(default)]
    pub prevention: Option<BilingualText>,
    #[serde(default)]
    pub precautions: Option<BilingualText>,
}

impl PredictionResult {
    pub fn top(&self) -> Option<&DiseasePrediction> {
        self.predictions.first()
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk.as_ref().and_then(RiskAssessment::resolved_level)
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub symptoms_count: usize,
    #[serde(default)]
    pub i18n_loaded: bool,
    #[serde(default)]
    pub predictor_loaded: bool,
    #[serde(default)]
    pub missing_artifacts: Vec<String>,
}

impl ServiceHealth {
    pub fn is_ready(&self) -> bool {
        self.status == "ok"
    }
}
