//! Client configuration with environment overrides.

use std::time::Duration;

use crate::DEFAULT_ARCHIVE_URL;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for [`crate::ArchiveClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin used for period discovery and the channel directory.
    pub discovery_url: String,
    /// Message base used until an instance redirect is discovered.
    pub api_base_url: String,
    /// Deadline for a single request, including reading the body.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_ARCHIVE_URL.into(),
            api_base_url: DEFAULT_ARCHIVE_URL.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `LOGS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let g = |key: &str| -> String { lookup(key).unwrap_or_default().trim().to_string() };

        Self {
            discovery_url: or_default(g("LOGS_DISCOVERY_URL"), DEFAULT_ARCHIVE_URL),
            api_base_url: or_default(g("LOGS_API_BASE_URL"), DEFAULT_ARCHIVE_URL),
            request_timeout: Duration::from_secs(parse_u64(
                &g("LOGS_REQUEST_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.into()
    } else {
        value
    }
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    match s.parse() {
        Ok(0) | Err(_) => default,
        Ok(v) => v,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.discovery_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(config.api_base_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("LOGS_DISCOVERY_URL", "http://localhost:9000"),
            ("LOGS_API_BASE_URL", " https://alt.example "),
            ("LOGS_REQUEST_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.discovery_url, "http://localhost:9000");
        assert_eq!(config.api_base_url, "https://alt.example");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_falls_back() {
        for raw in ["abc", "0", "-3"] {
            let config =
                ClientConfig::from_lookup(lookup_from(&[("LOGS_REQUEST_TIMEOUT_SECS", raw)]));
            assert_eq!(config.request_timeout, Duration::from_secs(30), "{raw}");
        }
    }
}
