//! Active archive instance tracking.
//!
//! Some users' logs live on another archive instance. Discovery reports
//! the instance and it replaces the default base for message fetches for
//! the rest of the session. The `instance` query parameter of the
//! navigable location always wins over session state.

use std::sync::Arc;

use tokio::sync::RwLock;
use url::{Url, form_urlencoded};

use crate::DEFAULT_ARCHIVE_URL;

/// Query parameter carrying the instance override.
pub const INSTANCE_PARAM: &str = "instance";

/// Query parameters of the navigable location (the viewer's own URL).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pairs: Vec<(String, String)>,
}

impl Location {
    /// Parse a raw query string, with or without the leading `?`.
    ///
    /// Values are percent-decoded exactly once. Malformed escapes are kept
    /// as-is.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The instance override, if present and non-empty.
    pub fn instance(&self) -> Option<&str> {
        self.get(INSTANCE_PARAM).filter(|v| !v.is_empty())
    }

    /// Set `key` to `value` in place, dropping duplicate keys.
    ///
    /// Returns `false` when the location already held exactly that value.
    pub fn replace(&mut self, key: &str, value: &str) -> bool {
        let matching = self.pairs.iter().filter(|(k, _)| k == key).count();
        if matching == 1 && self.get(key) == Some(value) {
            return false;
        }

        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                self.pairs[first].1 = value.to_string();
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = k != key || index == first;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
        true
    }

    /// Encoded query string without the leading `?`.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Write the parameters onto `url`, replacing its query.
    pub fn apply_to(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.query_string()));
        }
    }
}

/// Mutable session data shared by discovery and message fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub api_base_url: String,
    /// Set when discovery reported an error for the current subject.
    pub error: bool,
    pub current_channel: Option<String>,
    pub current_username: Option<String>,
    pub location: Location,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_URL)
    }
}

impl SessionState {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            error: false,
            current_channel: None,
            current_username: None,
            location: Location::default(),
        }
    }

    /// Base URL for message fetches.
    ///
    /// Precedence: location `instance` parameter, then the session base,
    /// then the canonical archive.
    pub fn current_base(&self) -> String {
        if let Some(instance) = self.location.instance() {
            return instance.to_string();
        }
        if !self.api_base_url.is_empty() {
            return self.api_base_url.clone();
        }
        DEFAULT_ARCHIVE_URL.to_string()
    }

    /// Record an instance reported by the archive.
    ///
    /// Writes the location parameter and the session base together. Empty or
    /// absent candidates are ignored. Returns whether anything changed.
    pub fn apply_discovered_instance(&mut self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
            return false;
        };

        let location_changed = self.location.replace(INSTANCE_PARAM, candidate);
        let base_changed = self.api_base_url != candidate;
        if base_changed {
            self.api_base_url = candidate.to_string();
        }
        location_changed || base_changed
    }
}

/// Cloneable handle over [`SessionState`].
///
/// Every write takes the single write lock, so readers see either the old
/// or the new base, never a mix of the two.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_state(SessionState::default())
    }
}

impl Session {
    pub fn new(api_base_url: &str) -> Self {
        Self::from_state(SessionState::new(api_base_url))
    }

    pub fn from_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    pub async fn current_base(&self) -> String {
        self.inner.read().await.current_base()
    }

    /// Replace the navigable location, e.g. after back/forward navigation.
    pub async fn set_location(&self, location: Location) {
        self.inner.write().await.location = location;
    }

    pub async fn apply_discovered_instance(&self, candidate: Option<&str>) -> bool {
        let mut state = self.inner.write().await;
        let changed = state.apply_discovered_instance(candidate);
        if changed {
            tracing::info!(
                instance = %state.api_base_url,
                "Switched to archive instance"
            );
        }
        changed
    }

    pub async fn has_error(&self) -> bool {
        self.inner.read().await.error
    }

    pub async fn set_error(&self, error: bool) {
        self.inner.write().await.error = error;
    }

    /// Switch to a new channel/user pair and clear the error flag.
    pub async fn set_subject(&self, channel: Option<&str>, username: Option<&str>) {
        let mut state = self.inner.write().await;
        state.current_channel = channel.map(str::to_string);
        state.current_username = username.map(str::to_string);
        state.error = false;
    }
}
