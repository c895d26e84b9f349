//! Discovery of the months that hold logs for a channel/user pair.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::identifier::classify;
use crate::{ArchiveClient, LogsError};

/// A (year, month) pair with at least one log batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogPeriod {
    pub year: String,
    pub month: String,
}

impl LogPeriod {
    pub fn new(year: impl Into<String>, month: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
        }
    }

    fn sort_key(&self) -> (u32, u32) {
        (
            self.year.parse().unwrap_or_default(),
            self.month.parse().unwrap_or_default(),
        )
    }
}

/// Most recent period, comparing year and month numerically.
pub fn latest_period(periods: &[LogPeriod]) -> Option<&LogPeriod> {
    periods.iter().max_by_key(|p| p.sort_key())
}

/// One entry as listed by the archive; `day` is dropped.
#[derive(Debug, Deserialize)]
struct RawPeriod {
    #[serde(deserialize_with = "string_or_number")]
    year: String,
    #[serde(deserialize_with = "string_or_number")]
    month: String,
}

#[derive(Debug, Default, Deserialize)]
struct LoggedData {
    #[serde(default)]
    list: Option<Vec<RawPeriod>>,
}

/// Instances are listed either as bare URLs or as `{ "url": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstanceRef {
    Url(String),
    Entry {
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct UserLogs {
    #[serde(default)]
    instances: Option<Vec<Option<InstanceRef>>>,
}

/// Discovery response as sent by the archive.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiscoveryResponse {
    #[serde(default)]
    available_logs: Option<Vec<RawPeriod>>,
    #[serde(default)]
    logged_data: Option<LoggedData>,
    #[serde(default)]
    user_logs: Option<UserLogs>,
}

/// Discovery response normalized at the boundary.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Discovery {
    pub(crate) periods: Vec<LogPeriod>,
    pub(crate) instance: Option<String>,
}

impl From<DiscoveryResponse> for Discovery {
    fn from(resp: DiscoveryResponse) -> Self {
        let raw = match (resp.available_logs, resp.logged_data) {
            (Some(flat), _) => flat,
            (None, Some(nested)) => nested.list.unwrap_or_default(),
            (None, None) => Vec::new(),
        };

        let instance = resp
            .user_logs
            .and_then(|logs| logs.instances.unwrap_or_default().into_iter().next().flatten())
            .and_then(|first| match first {
                InstanceRef::Url(url) => Some(url),
                InstanceRef::Entry { url } => url,
            })
            .filter(|url| !url.is_empty());

        Self {
            periods: dedup_periods(raw),
            instance,
        }
    }
}

/// Collapse entries to unique (year, month), first occurrence first.
fn dedup_periods(raw: Vec<RawPeriod>) -> Vec<LogPeriod> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|r| LogPeriod::new(r.year, r.month))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl ArchiveClient {
    /// List the months with logs for a channel/user pair.
    ///
    /// Missing input returns an empty list without a request. `OptedOut`
    /// and `FetchFailed` are returned as errors and flag the session;
    /// network and decode failures collapse into an empty list. A hosting
    /// instance named by the response is applied to the session.
    pub async fn fetch_periods(
        &self,
        channel: Option<&str>,
        username: Option<&str>,
    ) -> Result<Vec<LogPeriod>, LogsError> {
        let (Some(channel), Some(username)) = (
            channel.filter(|c| !c.is_empty()),
            username.filter(|u| !u.is_empty()),
        ) else {
            return Ok(Vec::new());
        };

        match self.request_discovery(channel, username).await {
            Ok(discovery) => {
                tracing::debug!(
                    channel,
                    username,
                    count = discovery.periods.len(),
                    "Fetched available logs"
                );
                self.session
                    .apply_discovered_instance(discovery.instance.as_deref())
                    .await;
                Ok(discovery.periods)
            }
            Err(e) if e.is_surfaced() => {
                self.session.set_error(true).await;
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, channel, username, "Log discovery failed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn request_discovery(
        &self,
        channel: &str,
        username: &str,
    ) -> Result<Discovery, LogsError> {
        let url = self.discovery_endpoint(channel, username)?;
        let body = match self.get(url.as_str()).await {
            Err(LogsError::FetchFailed { status: 403, .. }) => return Err(LogsError::OptedOut),
            other => other?,
        };
        let resp: DiscoveryResponse = serde_json::from_str(&body)?;
        Ok(resp.into())
    }

    /// `<discovery>/api/<channel>/<username>`, with ids as raw digits for
    /// the channel and `id:<digits>` for the user.
    pub(crate) fn discovery_endpoint(
        &self,
        channel: &str,
        username: &str,
    ) -> Result<url::Url, LogsError> {
        let channel = classify(channel);
        let username = classify(username);

        let mut url = url::Url::parse(&self.discovery_url)?;
        url.path_segments_mut()
            .map_err(|_| LogsError::InvalidBase(self.discovery_url.clone()))?
            .pop_if_empty()
            .extend(["api", channel.value.as_str(), username.discovery_user().as_str()]);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Discovery {
        serde_json::from_str::<DiscoveryResponse>(body).unwrap().into()
    }

    #[test]
    fn flat_listing_dedups_by_year_month() {
        let discovery = parse(
            r#"{ "availableLogs": [
                { "year": "2023", "month": "01", "day": "05" },
                { "year": "2023", "month": "01", "day": "17" },
                { "year": "2023", "month": "02", "day": "01" }
            ] }"#,
        );
        assert_eq!(
            discovery.periods,
            vec![LogPeriod::new("2023", "01"), LogPeriod::new("2023", "02")]
        );
        assert_eq!(discovery.instance, None);
    }

    #[test]
    fn nested_listing_is_accepted() {
        let discovery = parse(
            r#"{ "loggedData": { "list": [
                { "year": 2024, "month": 3, "day": 1 },
                { "year": 2024, "month": 3, "day": 2 },
                { "year": 2023, "month": 12 }
            ] } }"#,
        );
        assert_eq!(
            discovery.periods,
            vec![LogPeriod::new("2024", "3"), LogPeriod::new("2023", "12")]
        );
    }

    #[test]
    fn flat_listing_wins_over_nested() {
        let discovery = parse(
            r#"{
                "availableLogs": [{ "year": "2022", "month": "7" }],
                "loggedData": { "list": [{ "year": "2021", "month": "1" }] }
            }"#,
        );
        assert_eq!(discovery.periods, vec![LogPeriod::new("2022", "7")]);
    }

    #[test]
    fn missing_listing_is_empty() {
        assert_eq!(parse("{}"), Discovery::default());
    }

    #[test]
    fn first_instance_as_object() {
        let discovery = parse(
            r#"{ "availableLogs": [], "userLogs": { "instances": [
                { "url": "https://alt.example" }, "https://other.example"
            ] } }"#,
        );
        assert_eq!(discovery.instance.as_deref(), Some("https://alt.example"));
    }

    #[test]
    fn first_instance_as_string() {
        let discovery = parse(r#"{ "userLogs": { "instances": ["https://alt.example"] } }"#);
        assert_eq!(discovery.instance.as_deref(), Some("https://alt.example"));
    }

    #[test]
    fn instance_without_url_is_ignored() {
        let discovery = parse(r#"{ "userLogs": { "instances": [{ "name": "x" }] } }"#);
        assert_eq!(discovery.instance, None);
        let discovery = parse(r#"{ "userLogs": { "instances": [""] } }"#);
        assert_eq!(discovery.instance, None);
    }

    #[test]
    fn latest_period_compares_numerically() {
        let periods = vec![
            LogPeriod::new("2023", "9"),
            LogPeriod::new("2023", "10"),
            LogPeriod::new("2022", "12"),
        ];
        assert_eq!(latest_period(&periods), Some(&LogPeriod::new("2023", "10")));
        assert_eq!(latest_period(&[]), None);
    }

    #[test]
    fn null_instances_keep_periods() {
        let discovery = parse(
            r#"{ "availableLogs": [{ "year": "2023", "month": "1", "day": "2" }],
                 "userLogs": { "instances": null } }"#,
        );
        assert_eq!(discovery.periods, vec![LogPeriod::new("2023", "1")]);
        assert_eq!(discovery.instance, None);
    }

    #[test]
    fn null_list_keeps_instance() {
        let discovery = parse(
            r#"{ "loggedData": { "list": null },
                 "userLogs": { "instances": ["https://alt.example"] } }"#,
        );
        assert!(discovery.periods.is_empty());
        assert_eq!(discovery.instance.as_deref(), Some("https://alt.example"));
    }

    #[test]
    fn null_first_instance_is_ignored() {
        let discovery = parse(
            r#"{ "availableLogs": [{ "year": "2023", "month": "1" }],
                 "userLogs": { "instances": [null, "https://alt.example"] } }"#,
        );
        assert_eq!(discovery.periods, vec![LogPeriod::new("2023", "1")]);
        assert_eq!(discovery.instance, None);
    }

    #[test]
    fn null_sections_are_absent() {
        let discovery = parse(
            r#"{ "availableLogs": null,
                 "loggedData": { "list": [{ "year": "2022", "month": "4" }] },
                 "userLogs": null }"#,
        );
        assert_eq!(discovery.periods, vec![LogPeriod::new("2022", "4")]);
        assert_eq!(discovery.instance, None);
    }
}
