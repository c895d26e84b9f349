use serde::{Deserialize, Serialize};

use crate::{ArchiveClient, LogsError};

/// A channel logged by the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<Channel>,
}

impl ArchiveClient {
    /// List the channels the archive logs, for autocompletion.
    pub async fn fetch_channels(&self) -> Result<Vec<Channel>, LogsError> {
        let url = format!("{}/channels", self.discovery_url);
        let body = self.get(&url).await?;
        let resp: ChannelsResponse = serde_json::from_str(&body)?;
        tracing::debug!(count = resp.channels.len(), "Fetched channel list");
        Ok(resp.channels)
    }
}
