//! Chat log archive client library.
//!
//! Resolves channel/user identifiers, tracks the active archive instance,
//! discovers which months have logs, fetches a month of messages and
//! decodes the emote positions carried in each message's tags.

pub mod channels;
pub mod config;
pub mod emotes;
pub mod identifier;
pub mod instance;
pub mod messages;
pub mod periods;


pub use channels::Channel;
pub use config::ClientConfig;
pub use emotes::{EmoteSpan, decode_emotes};
pub use identifier::{Identifier, IdentifierKind, classify};
pub use instance::{Location, Session, SessionState};
pub use messages::{LogKey, LogMessage, SortOrder, text_log_url};
pub use periods::{LogPeriod, latest_period};

/// Canonical archive origin, used for discovery and as the default message base.
pub const DEFAULT_ARCHIVE_URL: &str = "https://logs.zonian.dev";

/// Unified error type for the logs-client crate.
#[derive(Debug, thiserror::Error)]
pub enum LogsError {
    #[error("User has opted out of logging")]
    OptedOut,

    #[error("Archive request failed (status {status}): {message}")]
    FetchFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Archive base cannot carry a path: {0}")]
    InvalidBase(String),
}

impl LogsError {
    /// Whether the error is reported to the caller instead of collapsing
    /// into an empty result.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, Self::OptedOut | Self::FetchFailed { .. })
    }
}

/// HTTP client for the log archive.
///
/// Cheap to clone; all clones share the connection pool and the session.
#[derive(Clone)]
pub struct ArchiveClient {
    pub(crate) http: reqwest::Client,
    pub(crate) discovery_url: String,
    pub(crate) session: Session,
}

impl ArchiveClient {
    /// Build a client from configuration with a fresh session.
    pub fn new(config: &ClientConfig) -> Result<Self, LogsError> {
        let session = Session::new(&config.api_base_url);
        Self::with_session(config, session)
    }

    /// Build a client that shares an existing session handle.
    pub fn with_session(config: &ClientConfig, session: Session) -> Result<Self, LogsError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            discovery_url: config.discovery_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute a GET request, mapping non-success statuses to `FetchFailed`.
    pub(crate) async fn get(&self, url: &str) -> Result<String, LogsError> {
        tracing::debug!(url, "Requesting archive");
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(LogsError::FetchFailed {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }
}
