//! Channel/user identifier classification.
//!
//! The archive accepts either a login name or a numeric Twitch user id.
//! Callers mark ids with an `id:` prefix, e.g. `id:22484632`.

use serde::Serialize;

const ID_PREFIX: &str = "id:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierKind {
    Name,
    NumericId,
}

/// A classified channel or user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub raw: String,
    pub kind: IdentifierKind,
    /// Login name as given, or the digits with the prefix stripped.
    pub value: String,
}

/// Classify a caller-supplied channel or user string.
///
/// `id:` followed by one or more ASCII digits is a numeric id; anything else
/// is a name and is kept verbatim, case included.
pub fn classify(s: &str) -> Identifier {
    let digits = s
        .strip_prefix(ID_PREFIX)
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));

    match digits {
        Some(id) => Identifier {
            raw: s.to_string(),
            kind: IdentifierKind::NumericId,
            value: id.to_string(),
        },
        None => Identifier {
            raw: s.to_string(),
            kind: IdentifierKind::Name,
            value: s.to_string(),
        },
    }
}

impl Identifier {
    pub fn is_id(&self) -> bool {
        self.kind == IdentifierKind::NumericId
    }

    /// Path segments selecting a channel: `channel/<name>` or `channelid/<id>`.
    pub fn channel_segments(&self) -> [String; 2] {
        self.segments("channel")
    }

    /// Path segments selecting a user: `user/<name>` or `userid/<id>`.
    pub fn user_segments(&self) -> [String; 2] {
        self.segments("user")
    }

    /// Username form used by the discovery endpoint, which marks ids inline.
    pub fn discovery_user(&self) -> String {
        if self.is_id() {
            format!("{ID_PREFIX}{}", self.value)
        } else {
            self.value.clone()
        }
    }

    fn segments(&self, noun: &str) -> [String; 2] {
        let noun = if self.is_id() {
            format!("{noun}id")
        } else {
            noun.to_string()
        };
        [noun, self.value.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_numeric_id() {
        let id = classify("id:123");
        assert_eq!(id.kind, IdentifierKind::NumericId);
        assert_eq!(id.value, "123");
        assert_eq!(id.raw, "id:123");
    }

    #[test]
    fn classifies_name_and_keeps_case() {
        let id = classify("Forsen");
        assert_eq!(id.kind, IdentifierKind::Name);
        assert_eq!(id.value, "Forsen");
    }

    #[test]
    fn prefix_without_digits_is_a_name() {
        for raw in ["id:", "id:abc", "id:12a", "ID:123", ""] {
            assert_eq!(classify(raw).kind, IdentifierKind::Name, "{raw}");
            assert_eq!(classify(raw).value, raw);
        }
    }

    #[test]
    fn segments_follow_kind() {
        assert_eq!(classify("forsen").channel_segments(), ["channel", "forsen"]);
        assert_eq!(classify("id:22484632").channel_segments(), ["channelid", "22484632"]);
        assert_eq!(classify("gempir").user_segments(), ["user", "gempir"]);
        assert_eq!(classify("id:77").user_segments(), ["userid", "77"]);
    }

    #[test]
    fn discovery_user_keeps_id_prefix() {
        assert_eq!(classify("id:77").discovery_user(), "id:77");
        assert_eq!(classify("gempir").discovery_user(), "gempir");
    }
}
