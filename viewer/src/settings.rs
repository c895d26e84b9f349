//! Display settings loaded from the environment.

use logs_client::SortOrder;

/// Viewer display settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSettings {
    pub show_emotes: bool,
    pub show_name: bool,
    pub show_timestamp: bool,
    /// Oldest message first, newest at the bottom.
    pub new_on_bottom: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            show_emotes: true,
            show_name: true,
            show_timestamp: true,
            new_on_bottom: false,
        }
    }
}

impl ViewerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| -> bool {
            lookup(key)
                .map(|v| parse_bool(&v, default))
                .unwrap_or(default)
        };

        Self {
            show_emotes: flag("VIEWER_SHOW_EMOTES", defaults.show_emotes),
            show_name: flag("VIEWER_SHOW_NAME", defaults.show_name),
            show_timestamp: flag("VIEWER_SHOW_TIMESTAMP", defaults.show_timestamp),
            new_on_bottom: flag("VIEWER_NEW_ON_BOTTOM", defaults.new_on_bottom),
        }
    }

    pub fn order(&self) -> SortOrder {
        if self.new_on_bottom {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}
