//! Fetching one month of messages for a channel/user pair.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::emotes::{EmoteSpan, decode_emotes};
use crate::identifier::classify;
use crate::{ArchiveClient, LogsError};

/// Requested message order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first (newest message at the bottom).
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// A decoded chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogMessage {
    /// `None` when the archive sent no timestamp or one that is not RFC 3339.
    pub timestamp: Option<DateTime<Utc>>,
    pub text: String,
    pub tags: HashMap<String, String>,
    pub emotes: Vec<EmoteSpan>,
    /// Remaining fields of the archive record (`username`, `displayName`,
    /// `channel`, `id`, `type`, `raw`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LogMessage {
    pub fn username(&self) -> Option<&str> {
        self.extra.get("username").and_then(|v| v.as_str())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.extra
            .get("displayName")
            .and_then(|v| v.as_str())
            .or_else(|| self.username())
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    timestamp: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: HashMap<String, String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UserLogResponse {
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
}

/// Tags as strings; numbers and booleans are stringified, `null` values and
/// a `null` map are dropped.
fn lenient_tags<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

impl RawMessage {
    fn decode(self) -> LogMessage {
        let timestamp = self
            .timestamp
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc));
        if timestamp.is_none() {
            tracing::debug!(timestamp = %self.timestamp, "Message has no valid timestamp");
        }
        let emotes = decode_emotes(&self.text, self.tags.get("emotes").map(String::as_str));

        LogMessage {
            timestamp,
            text: self.text,
            tags: self.tags,
            emotes,
            extra: self.extra,
        }
    }
}

/// Cache key for one month of logs.
///
/// Channel and username are lower-cased here only; requests keep the
/// caller's case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey {
    pub channel: String,
    pub username: String,
    pub year: String,
    pub month: String,
}

impl LogKey {
    pub fn new(channel: &str, username: &str, year: &str, month: &str) -> Self {
        Self {
            channel: channel.to_lowercase(),
            username: username.to_lowercase(),
            year: year.to_string(),
            month: month.to_string(),
        }
    }
}

/// `<base>/channel[id]/<c>/user[id]/<u>/<year>/<month>` without a query.
fn month_path(
    base: &str,
    channel: &str,
    username: &str,
    year: &str,
    month: &str,
) -> Result<Url, LogsError> {
    let channel = classify(channel);
    let username = classify(username);
    let [channel_noun, channel_value] = channel.channel_segments();
    let [user_noun, user_value] = username.user_segments();

    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| LogsError::InvalidBase(base.to_string()))?
        .pop_if_empty()
        .extend([
            channel_noun.as_str(),
            channel_value.as_str(),
            user_noun.as_str(),
            user_value.as_str(),
            year,
            month,
        ]);
    Ok(url)
}

/// JSON endpoint for one month of messages.
pub(crate) fn month_url(
    base: &str,
    channel: &str,
    username: &str,
    year: &str,
    month: &str,
    order: SortOrder,
) -> Result<Url, LogsError> {
    let mut url = month_path(base, channel, username, year, month)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("jsonBasic", "1");
        if order != SortOrder::Ascending {
            query.append_pair("reverse", "1");
        }
    }
    Ok(url)
}

/// Plain-text download link for one month, newest first.
pub fn text_log_url(
    base: &str,
    channel: &str,
    username: &str,
    year: &str,
    month: &str,
) -> Result<Url, LogsError> {
    let mut url = month_path(base, channel, username, year, month)?;
    url.set_query(Some("reverse"));
    Ok(url)
}

impl ArchiveClient {
    /// Fetch one month of messages from `base`.
    ///
    /// Missing channel, username or base returns an empty list without a
    /// request. Every failure collapses into an empty list.
    pub async fn fetch_month(
        &self,
        channel: &str,
        username: &str,
        year: &str,
        month: &str,
        base: &str,
        order: SortOrder,
    ) -> Vec<LogMessage> {
        if channel.is_empty() || username.is_empty() || base.is_empty() {
            return Vec::new();
        }

        match self
            .request_month(channel, username, year, month, base, order)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    channel,
                    username,
                    year,
                    month,
                    "Log fetch failed, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Fetch one month from the session's current base.
    pub async fn fetch_month_current(
        &self,
        channel: &str,
        username: &str,
        year: &str,
        month: &str,
        order: SortOrder,
    ) -> Vec<LogMessage> {
        let base = self.session.current_base().await;
        self.fetch_month(channel, username, year, month, &base, order)
            .await
    }

    async fn request_month(
        &self,
        channel: &str,
        username: &str,
        year: &str,
        month: &str,
        base: &str,
        order: SortOrder,
    ) -> Result<Vec<LogMessage>, LogsError> {
        let url = month_url(base, channel, username, year, month, order)?;
        let body = self.get(url.as_str()).await?;
        let resp: UserLogResponse = serde_json::from_str(&body)?;

        let messages: Vec<LogMessage> = resp
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(RawMessage::decode)
            .collect();
        tracing::debug!(count = messages.len(), year, month, "Fetched log messages");
        Ok(messages)
    }
}
