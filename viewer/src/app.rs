use std::collections::HashMap;
use std::sync::Arc;

use logs_client::{ArchiveClient, LogKey, LogMessage};
use tokio::sync::RwLock;

use crate::settings::ViewerSettings;

/// Application state shared by every view of the log.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Archive client; its session carries the active instance
    client: ArchiveClient,
    /// Display settings (changeable at runtime)
    settings: RwLock<ViewerSettings>,
    /// Fetched months, dropped whenever the subject changes
    months: RwLock<HashMap<LogKey, Arc<Vec<LogMessage>>>>,
}

impl AppState {
    pub fn new(client: ArchiveClient, settings: ViewerSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                client,
                settings: RwLock::new(settings),
                months: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn client(&self) -> &ArchiveClient {
        &self.inner.client
    }

    /// Get a read lock on the current settings.
    pub async fn settings(&self) -> tokio::sync::RwLockReadGuard<'_, ViewerSettings> {
        self.inner.settings.read().await
    }

    pub async fn update_settings(&self, f: impl FnOnce(&mut ViewerSettings)) {
        let mut settings = self.inner.settings.write().await;
        f(&mut settings);
    }

    /// Switch the viewed channel/user pair.
    pub async fn select(&self, channel: &str, username: &str) {
        self.inner
            .client
            .session()
            .set_subject(Some(channel), Some(username))
            .await;
        self.inner.months.write().await.clear();
    }

    /// One month of messages from the session's current base, cached per
    /// (channel, username, year, month).
    pub async fn month(
        &self,
        channel: &str,
        username: &str,
        year: &str,
        month: &str,
    ) -> Arc<Vec<LogMessage>> {
        let key = LogKey::new(channel, username, year, month);
        if let Some(cached) = self.inner.months.read().await.get(&key) {
            return cached.clone();
        }

        let order = self.settings().await.order();
        let messages = Arc::new(
            self.inner
                .client
                .fetch_month_current(channel, username, year, month, order)
                .await,
        );
        self.inner
            .months
            .write()
            .await
            .insert(key, messages.clone());
        messages
    }

    pub async fn cached_months(&self) -> usize {
        self.inner.months.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use logs_client::ClientConfig;

    use super::*;

    /// State whose archive address has nothing listening on it.
    async fn offline_state() -> AppState {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let config = ClientConfig {
            discovery_url: base.clone(),
            api_base_url: base,
            request_timeout: Duration::from_secs(5),
        };
        AppState::new(
            ArchiveClient::new(&config).unwrap(),
            ViewerSettings::default(),
        )
    }

    #[tokio::test]
    async fn months_are_cached_case_insensitively() {
        let state = offline_state().await;

        assert!(state.month("Forsen", "gempir", "2023", "1").await.is_empty());
        assert!(state.month("forsen", "GEMPIR", "2023", "1").await.is_empty());
        assert_eq!(state.cached_months().await, 1);

        state.month("forsen", "gempir", "2023", "2").await;
        assert_eq!(state.cached_months().await, 2);
    }

    #[tokio::test]
    async fn selecting_a_subject_drops_cached_months() {
        let state = offline_state().await;
        state.month("forsen", "gempir", "2023", "1").await;
        assert_eq!(state.cached_months().await, 1);

        state.select("nymn", "gempir").await;
        assert_eq!(state.cached_months().await, 0);
        let session = state.client().session().snapshot().await;
        assert_eq!(session.current_channel.as_deref(), Some("nymn"));
    }
}
