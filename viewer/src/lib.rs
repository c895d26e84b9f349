pub mod app;
pub mod render;
pub mod settings;

use logs_client::{ArchiveClient, ClientConfig, Location, Session, SessionState};

use crate::app::AppState;
use crate::settings::ViewerSettings;

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load configuration and build the shared application state.
///
/// An `instance` parameter in `location` overrides the archive base for
/// message fetches.
pub fn init_foundation(location: Location) -> Result<AppState, anyhow::Error> {
    load_dotenv();

    let config = ClientConfig::from_env();
    let settings = ViewerSettings::from_env();

    let mut state = SessionState::new(&config.api_base_url);
    state.location = location;
    let session = Session::from_state(state);

    let client = ArchiveClient::with_session(&config, session)?;
    tracing::info!(
        discovery = %config.discovery_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Archive client ready"
    );
    Ok(AppState::new(client, settings))
}
