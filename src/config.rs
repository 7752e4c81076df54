use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Herdwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the prediction service address.
pub const BASE_URL_ENV: &str = "HERDWISE_API_BASE";
/// Environment variable overriding the request timeout (seconds).
pub const TIMEOUT_ENV: &str = "HERDWISE_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MIN_SYMPTOMS: usize = 3;
pub const DEFAULT_MAX_SYMPTOMS: usize = 8;
pub const DEFAULT_TOP_K: u8 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Largest top-K the prediction service accepts.
pub const MAX_TOP_K: u8 = 5;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "herdwise_lib=info,warn"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid service base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Invalid symptom bounds: min {min}, max {max}")]
    InvalidBounds { min: usize, max: usize },
    #[error("top_k must be between 1 and 5, got {0}")]
    InvalidTopK(u8),
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Everything the client needs to know at startup.
///
/// Passed into `SessionController::new` so tests can vary the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub min_symptoms: usize,
    pub max_symptoms: usize,
    pub top_k: u8,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_symptoms: DEFAULT_MIN_SYMPTOMS,
            max_symptoms: DEFAULT_MAX_SYMPTOMS,
            top_k: DEFAULT_TOP_K,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL and timeout taken from the environment
    /// when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = base.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.request_timeout_secs =
                raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: TIMEOUT_ENV,
                    value: raw.clone(),
                })?;
        }

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Override the selection bounds.
    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_symptoms = min;
        self.max_symptoms = max;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.min_symptoms == 0 || self.min_symptoms > self.max_symptoms {
            return Err(ConfigError::InvalidBounds {
                min: self.min_symptoms,
                max: self.max_symptoms,
            });
        }

        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        Ok(())
    }
}
