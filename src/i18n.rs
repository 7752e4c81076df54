//! User-facing messages in the two supported languages.

use crate::models::Language;

/// A message the UI can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    SelectAtLeast { min: usize },
    SelectAtMost { max: usize },
    UnknownSymptom { id: String },
    SymptomRequired,
    UnknownAnimal { value: String },
    RequestInFlight,
    Superseded,
    PredictFailed,
    CatalogUnavailable,
    ServiceUnreachable,
    Internal,
}

impl Message {
    pub fn english(&self) -> String {
        match self {
            Self::SelectAtLeast { min } => format!("select at least {min} symptoms"),
            Self::SelectAtMost { max } => format!("you can select at most {max} symptoms"),
            Self::UnknownSymptom { id } => format!("unknown symptom: {id}"),
            Self::SymptomRequired => "a symptom is required".into(),
            Self::UnknownAnimal { value } => format!("unknown animal: {value}"),
            Self::RequestInFlight => "a prediction is already in progress".into(),
            Self::Superseded => "The form was cleared before the prediction finished.".into(),
            Self::PredictFailed => {
                "Prediction failed. Check that the prediction service is reachable.".into()
            }
            Self::CatalogUnavailable => {
                "Could not load the symptom list. Check that the prediction service is reachable."
                    .into()
            }
            Self::ServiceUnreachable => "The prediction service is not reachable.".into(),
            Self::Internal => "Internal error".into(),
        }
    }

    pub fn telugu(&self) -> String {
        match self {
            Self::SelectAtLeast { min } => format!("కనీసం {min} లక్షణాలను ఎంచుకోండి"),
            Self::SelectAtMost { max } => format!("గరిష్టంగా {max} లక్షణాలను మాత్రమే ఎంచుకోవచ్చు"),
            Self::UnknownSymptom { id } => format!("తెలియని లక్షణం: {id}"),
            Self::SymptomRequired => "లక్షణం అవసరం".into(),
            Self::UnknownAnimal { value } => format!("తెలియని జంతువు: {value}"),
            Self::RequestInFlight => "ఒక అంచనా ఇప్పటికే జరుగుతోంది".into(),
            Self::Superseded => "అంచనా పూర్తయ్యేలోపు ఫారం క్లియర్ చేయబడింది.".into(),
            Self::PredictFailed => {
                "అంచనా విఫలమైంది. సేవ అందుబాటులో ఉందో లేదో తనిఖీ చేయండి.".into()
            }
            Self::CatalogUnavailable => "లక్షణాల జాబితాను లోడ్ చేయలేకపోయాము.".into(),
            Self::ServiceUnreachable => "అంచనా సేవ అందుబాటులో లేదు.".into(),
            Self::Internal => "అంతర్గత లోపం".into(),
        }
    }

    pub fn localized(&self, language: Language) -> String {
        match language {
            Language::English => self.english(),
            Language::Telugu => self.telugu(),
            Language::Bilingual => format!("{} / {}", self.english(), self.telugu()),
        }
    }
}
