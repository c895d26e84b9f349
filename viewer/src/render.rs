//! Plain-text rendering of decoded messages.

use std::collections::HashSet;

use logs_client::{EmoteSpan, LogMessage};

use crate::settings::ViewerSettings;

/// A piece of message text, either literal or an emote.
#[derive(Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(String),
    Emote(&'a EmoteSpan),
}

/// Split `text` around its emote spans.
///
/// Spans are applied in start order; spans that overlap an earlier one or
/// reach past the end of the text are rendered as plain text.
pub fn segments<'a>(text: &str, emotes: &'a [EmoteSpan]) -> Vec<Segment<'a>> {
    let chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&EmoteSpan> = emotes.iter().collect();
    ordered.sort_by_key(|e| e.start_index);

    let mut out = Vec::new();
    let mut cursor = 0;
    for emote in ordered {
        if emote.start_index < cursor
            || emote.start_index >= emote.end_index
            || emote.end_index > chars.len()
        {
            continue;
        }
        if emote.start_index > cursor {
            out.push(Segment::Text(chars[cursor..emote.start_index].iter().collect()));
        }
        out.push(Segment::Emote(emote));
        cursor = emote.end_index;
    }
    if cursor < chars.len() {
        out.push(Segment::Text(chars[cursor..].iter().collect()));
    }
    out
}

/// Render one message as a single line.
///
/// With emotes shown, each emote is wrapped as `[code]`.
pub fn format_line(msg: &LogMessage, settings: &ViewerSettings) -> String {
    let mut line = String::new();

    if settings.show_timestamp {
        match msg.timestamp {
            Some(ts) => line.push_str(&ts.format("[%Y-%m-%d %H:%M:%S] ").to_string()),
            None => line.push_str("[invalid date] "),
        }
    }
    if settings.show_name {
        if let Some(name) = msg.display_name() {
            line.push_str(name);
            line.push_str(": ");
        }
    }

    if settings.show_emotes {
        for segment in segments(&msg.text, &msg.emotes) {
            match segment {
                Segment::Text(text) => line.push_str(&text),
                Segment::Emote(emote) => {
                    line.push('[');
                    line.push_str(&emote.code);
                    line.push(']');
                }
            }
        }
    } else {
        line.push_str(&msg.text);
    }

    line
}

/// One `code url` line per distinct emote in the message, in first-use order.
pub fn emote_links(msg: &LogMessage, scale: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    msg.emotes
        .iter()
        .filter(|e| seen.insert(e.id.as_str()))
        .map(|e| format!("{} {}", e.code, e.image_url(scale)))
        .collect()
}
