use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Animal {
    Cow => "Cow",
    Buffalo => "Buffalo",
    Goat => "Goat",
    Sheep => "Sheep",
});

str_enum!(RiskLevel {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

str_enum!(Language {
    English => "en",
    Telugu => "te",
    Bilingual => "both",
});

impl Animal {
    pub const ALL: [Animal; 4] = [Animal::Cow, Animal::Buffalo, Animal::Goat, Animal::Sheep];

    pub fn telugu_name(&self) -> &'static str {
        match self {
            Self::Cow => "ఆవు",
            Self::Buffalo => "గేదె",
            Self::Goat => "మేక",
            Self::Sheep => "గొర్రె",
        }
    }

    pub fn label(&self, language: Language) -> String {
        match language {
            Language::English => self.as_str().to_string(),
            Language::Telugu => self.telugu_name().to_string(),
            Language::Bilingual => format!("{} / {}", self.as_str(), self.telugu_name()),
        }
    }
}

impl RiskLevel {
    /// Parse the service's canonical English phrase ("High Risk" or "High").
    ///
    /// Whole-string match only; "Not high" or a Telugu phrase yields `None`.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim();
        let level = phrase
            .strip_suffix(" Risk")
            .or_else(|| phrase.strip_suffix(" risk"))
            .unwrap_or(phrase)
            .trim();
        [Self::Low, Self::Medium, Self::High]
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(level))
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Bilingual
    }
}
