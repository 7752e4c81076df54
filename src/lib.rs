pub mod catalog; // Symptom catalog & search
pub mod commands; // UI-facing command wrappers
pub mod config;
pub mod i18n;
pub mod models;
pub mod result_view; // Read-only result rendering
pub mod service; // External prediction service client
pub mod session; // Selection & request controller

use tracing_subscriber::EnvFilter;

pub use config::ClientConfig;
pub use service::{HttpPredictionClient, PredictionService};
pub use session::SessionController;

/// Initialize tracing. Honors `RUST_LOG`, else `config::default_log_filter()`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Build a session against the configured service and load the catalog.
///
/// A catalog failure is logged and leaves the catalog empty; the session
/// is still returned so the user can retry.
pub async fn start_session(
    config: ClientConfig,
) -> Result<SessionController<HttpPredictionClient>, String> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let client = HttpPredictionClient::new(&config).map_err(|e| e.to_string())?;
    let session = SessionController::new(config, client).map_err(|e| e.to_string())?;

    match session.load_catalog().await {
        Ok(count) => tracing::info!(count, base_url = %session.config().base_url, "Session ready"),
        Err(e) => tracing::warn!(error = %e, "Starting with an empty symptom catalog"),
    }

    Ok(session)
}
