//! Read-only rendering of a prediction result.
//!
//! Turns the service response into display strings for one language.
//! Predictions keep the service order; missing text becomes "—".

use std::fmt;

use serde::Serialize;

use crate::models::{Language, PredictionResult, RiskLevel, MISSING_TEXT};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    /// 1-based position in the service's ranking.
    pub rank: usize,
    pub disease: String,
    /// Formatted percentage, e.g. "72.50%".
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBadge {
    pub level: Option<RiskLevel>,
    pub label: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub language: Language,
    pub animal: String,
    pub symptoms: Vec<String>,
    pub predictions: Vec<PredictionRow>,
    pub risk: RiskBadge,
    pub prevention: String,
    pub precautions: String,
}

impl ResultView {
    pub fn build(result: &PredictionResult, language: Language) -> Self {
        let predictions = result
            .predictions
            .iter()
            .enumerate()
            .map(|(i, p)| PredictionRow {
                rank: i + 1,
                disease: p.disease.text(language),
                percent: p
                    .percent()
                    .map(|v| format!("{v:.2}%"))
                    .unwrap_or_else(|| MISSING_TEXT.to_string()),
            })
            .collect();

        let risk = match &result.risk {
            Some(risk) => RiskBadge {
                level: risk.resolved_level(),
                label: risk.overall.text(language),
                explanation: non_blank(&risk.explanation),
            },
            None => RiskBadge {
                level: None,
                label: MISSING_TEXT.to_string(),
                explanation: MISSING_TEXT.to_string(),
            },
        };

        Self {
            language,
            animal: result.animal.text(language),
            symptoms: result.symptoms.iter().map(|s| s.text(language)).collect(),
            predictions,
            risk,
            prevention: result
                .prevention
                .as_ref()
                .map(|t| t.text(language))
                .unwrap_or_else(|| MISSING_TEXT.to_string()),
            precautions: result
                .precautions
                .as_ref()
                .map(|t| t.text(language))
                .unwrap_or_else(|| MISSING_TEXT.to_string()),
        }
    }
}

fn non_blank(s: &str) -> String {
    if s.trim().is_empty() {
        MISSING_TEXT.to_string()
    } else {
        s.trim().to_string()
    }
}

struct Headings {
    animal: &'static str,
    symptoms: &'static str,
    predictions: &'static str,
    risk: &'static str,
    prevention: &'static str,
    precautions: &'static str,
}

fn headings(language: Language) -> Headings {
    match language {
        Language::English => Headings {
            animal: "Animal",
            symptoms: "Symptoms",
            predictions: "Top predictions",
            risk: "Risk",
            prevention: "Prevention",
            precautions: "Precautions",
        },
        Language::Telugu => Headings {
            animal: "జంతువు",
            symptoms: "లక్షణాలు",
            predictions: "ముఖ్య అంచనాలు",
            risk: "ప్రమాదం",
            prevention: "నివారణ",
            precautions: "జాగ్రత్తలు",
        },
        Language::Bilingual => Headings {
            animal: "Animal / జంతువు",
            symptoms: "Symptoms / లక్షణాలు",
            predictions: "Top predictions / ముఖ్య అంచనాలు",
            risk: "Risk / ప్రమాదం",
            prevention: "Prevention / నివారణ",
            precautions: "Precautions / జాగ్రత్తలు",
        },
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = headings(self.language);

        writeln!(f, "{}: {}", h.animal, self.animal)?;
        if self.symptoms.is_empty() {
            writeln!(f, "{}: {MISSING_TEXT}", h.symptoms)?;
        } else {
            writeln!(f, "{}: {}", h.symptoms, self.symptoms.join(", "))?;
        }

        writeln!(f, "{}:", h.predictions)?;
        if self.predictions.is_empty() {
            writeln!(f, "  {MISSING_TEXT}")?;
        }
        for row in &self.predictions {
            writeln!(f, "  {}. {} ({})", row.rank, row.disease, row.percent)?;
        }

        let level = self.risk.level.map(|l| l.as_str()).unwrap_or(MISSING_TEXT);
        writeln!(f, "{}: {} [{}]", h.risk, self.risk.label, level)?;
        writeln!(f, "  {}", self.risk.explanation)?;
        writeln!(f, "{}: {}", h.prevention, self.prevention)?;
        write!(f, "{}: {}", h.precautions, self.precautions)
    }
}
