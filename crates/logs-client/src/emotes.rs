//! Emote position decoding.
//!
//! Twitch IRC carries emotes in the `emotes` tag as
//! `<id>:<start>-<end>,<start>-<end>/<id>:<start>-<end>`, where positions are
//! inclusive code point indices into the message text.

use serde::{Deserialize, Serialize};

const EMOTE_CDN: &str = "https://static-cdn.jtvnw.net/emoticons/v2";

/// One emote occurrence inside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmoteSpan {
    pub id: String,
    /// First code point covered.
    pub start_index: usize,
    /// One past the last code point covered.
    pub end_index: usize,
    /// The covered text, e.g. `Kappa`.
    pub code: String,
}

impl EmoteSpan {
    /// CDN image for this emote at the given scale (`1.0`, `2.0` or `3.0`).
    pub fn image_url(&self, scale: &str) -> String {
        format!("{EMOTE_CDN}/{}/default/dark/{scale}", self.id)
    }
}

/// Decode an `emotes` tag against the message it belongs to.
///
/// Spans come back in descriptor order; overlapping spans are not merged.
/// Malformed groups or positions are skipped and never abort the rest.
pub fn decode_emotes(text: &str, descriptor: Option<&str>) -> Vec<EmoteSpan> {
    let Some(descriptor) = descriptor.filter(|d| !d.is_empty()) else {
        return Vec::new();
    };

    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();

    for group in descriptor.split('/') {
        let Some((id, positions)) = group.split_once(':') else {
            if !group.is_empty() {
                tracing::debug!(group, "Skipping emote group without positions");
            }
            continue;
        };

        for position in positions.split(',') {
            let Some((start, end)) = parse_position(position) else {
                tracing::debug!(id, position, "Skipping malformed emote position");
                continue;
            };

            let end_index = end.saturating_add(1);
            spans.push(EmoteSpan {
                id: id.to_string(),
                start_index: start,
                end_index,
                code: slice_chars(&chars, start, end_index),
            });
        }
    }

    spans
}

fn parse_position(position: &str) -> Option<(usize, usize)> {
    let (start, end) = position.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

/// Code points in `[start, end)`, clamped to the text.
fn slice_chars(chars: &[char], start: usize, end: usize) -> String {
    let end = end.min(chars.len());
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect()
}
