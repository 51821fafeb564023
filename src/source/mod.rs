//! Transcript input.
//!
//! A transcript is a JSON Lines file, one message object per line:
//!
//! ```json
//! {"id":"m1","sender":"alice","display_name":"Alice","text":"Hi","timestamp":"2025-01-01T10:00:00Z"}
//! {"id":"m2","sender":"me","media":{"kind":"image","width":20,"height":8},"timestamp":"2025-01-01T10:01:00Z"}
//! ```
//!
//! Lines are parsed at the boundary into validated [`Message`] values.
//! Malformed lines are skipped with a warning; only I/O failures are errors.

use crate::model::{
    MediaDescriptor, MediaKind, Message, MessageContent, MessageId, SenderId, TranscriptError,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Raw JSON structure for one transcript line.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMessage {
    id: MessageId,
    sender: SenderId,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    media: Option<RawMedia>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    show_display_name: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMedia {
    kind: MediaKind,
    #[serde(default)]
    width: Option<u16>,
    #[serde(default)]
    height: Option<u16>,
}

/// Why a single transcript line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// The line is not valid JSON or misses required fields.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Both or neither of `text` and `media` were given.
    #[error("exactly one of `text` or `media` is required")]
    AmbiguousContent,
}

/// Parse one transcript line into a message.
///
/// # Errors
///
/// Returns [`LineError`] when the line cannot be turned into a message.
pub fn parse_line(line: &str) -> Result<Message, LineError> {
    let raw: RawMessage =
        serde_json::from_str(line).map_err(|e| LineError::Json(e.to_string()))?;

    let content = match (raw.text, raw.media) {
        (Some(text), None) => MessageContent::Text(text),
        (None, Some(media)) => MessageContent::Media(MediaDescriptor::from_parts(
            media.kind,
            media.width,
            media.height,
        )),
        _ => return Err(LineError::AmbiguousContent),
    };

    let mut message = Message::new(raw.id, raw.sender, content, raw.timestamp);
    if let Some(name) = raw.display_name {
        message = message.with_display_name(name);
    }
    if let Some(visible) = raw.show_display_name {
        message = message.with_display_name_visible(visible);
    }
    Ok(message)
}

/// Parse every line of a transcript, skipping blank and malformed lines.
///
/// # Errors
///
/// Returns [`TranscriptError::Io`] if reading from `reader` fails.
pub fn parse_transcript<R: BufRead>(reader: R) -> Result<Vec<Message>, TranscriptError> {
    let mut messages = Vec::new();
    let mut skipped = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(message) => messages.push(message),
            Err(err) => {
                skipped += 1;
                warn!(line = number + 1, error = %err, "Skipping malformed transcript line");
            }
        }
    }

    info!(loaded = messages.len(), skipped, "Transcript parsed");
    Ok(messages)
}

/// Read a transcript file from disk.
///
/// # Errors
///
/// Returns [`TranscriptError::FileNotFound`] if `path` does not exist and
/// [`TranscriptError::Io`] for other I/O failures.
pub fn read_transcript(path: impl AsRef<Path>) -> Result<Vec<Message>, TranscriptError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TranscriptError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    parse_transcript(BufReader::new(file))
}

/// Small built-in conversation shown when no transcript is given.
///
/// `local_sender` owns the outgoing messages.
pub fn demo_conversation(local_sender: &SenderId) -> Vec<Message> {
    let start = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_default();
    let alice = SenderId::new("alice").unwrap_or_else(|_| local_sender.clone());
    let bob = SenderId::new("bob").unwrap_or_else(|_| local_sender.clone());

    let script: [(&SenderId, Option<&str>, MessageContent, i64); 8] = [
        (&alice, Some("Alice"), MessageContent::Text("Hi".into()), 0),
        (
            &alice,
            Some("Alice"),
            MessageContent::Text("How are you?".into()),
            1,
        ),
        (
            local_sender,
            None,
            MessageContent::Text("Good, thanks! Just got back from the coast.".into()),
            2,
        ),
        (
            local_sender,
            None,
            MessageContent::Media(MediaDescriptor::new(MediaKind::Image, 24, 8)),
            3,
        ),
        (
            &bob,
            Some("Bob"),
            MessageContent::Text("Looks great. Where was that taken?".into()),
            40,
        ),
        (
            &bob,
            Some("Bob"),
            MessageContent::Media(MediaDescriptor::without_size(MediaKind::Location)),
            41,
        ),
        (
            &alice,
            Some("Alice"),
            MessageContent::Text("We should all go next summer.\nI can drive.".into()),
            42,
        ),
        (local_sender, None, MessageContent::Text("Deal".into()), 43),
    ];

    script
        .into_iter()
        .enumerate()
        .filter_map(|(n, (sender, name, content, minutes))| {
            let id = MessageId::new(format!("demo-{n}")).ok()?;
            let message = Message::new(
                id,
                sender.clone(),
                content,
                start + Duration::minutes(minutes),
            );
            Some(match name {
                Some(name) => message.with_display_name(name),
                None => message,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_line_reads_text_message() {
        let line = r#"{"id":"m1","sender":"alice","display_name":"Alice","text":"Hi","timestamp":"2025-01-01T10:00:00Z"}"#;

        let message = parse_line(line).unwrap();

        assert_eq!(message.id().as_str(), "m1");
        assert_eq!(message.sender().as_str(), "alice");
        assert_eq!(message.display_name(), "Alice");
        assert_eq!(message.content(), &MessageContent::Text("Hi".to_string()));
        assert!(message.show_display_name());
    }

    #[test]
    fn parse_line_reads_media_with_missing_dimensions() {
        let line = r#"{"id":"m2","sender":"bob","media":{"kind":"video","width":12},"timestamp":"2025-01-01T10:00:00Z","show_display_name":false}"#;

        let message = parse_line(line).unwrap();

        match message.content() {
            MessageContent::Media(media) => {
                assert_eq!(media.kind(), MediaKind::Video);
                assert_eq!(media.dimensions(), None);
            }
            other => panic!("expected media, got {:?}", other),
        }
        assert!(!message.show_display_name());
    }

    #[test]
    fn parse_line_rejects_text_and_media_together() {
        let line = r#"{"id":"m3","sender":"bob","text":"x","media":{"kind":"image"},"timestamp":"2025-01-01T10:00:00Z"}"#;
        assert_eq!(parse_line(line), Err(LineError::AmbiguousContent));
    }

    #[test]
    fn parse_line_rejects_empty_id() {
        let line = r#"{"id":"","sender":"bob","text":"x","timestamp":"2025-01-01T10:00:00Z"}"#;
        assert!(matches!(parse_line(line), Err(LineError::Json(_))));
    }

    #[test]
    fn parse_line_rejects_bad_timestamp() {
        let line = r#"{"id":"m4","sender":"bob","text":"x","timestamp":"yesterday"}"#;
        assert!(matches!(parse_line(line), Err(LineError::Json(_))));
    }

    #[test]
    fn parse_transcript_skips_malformed_and_blank_lines() {
        let data = concat!(
            r#"{"id":"a","sender":"alice","text":"one","timestamp":"2025-01-01T10:00:00Z"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"id":"b","sender":"me","text":"two","timestamp":"2025-01-01T10:01:00Z"}"#,
            "\n",
        );

        let messages = parse_transcript(data.as_bytes()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id().as_str(), "a");
        assert_eq!(messages[1].id().as_str(), "b");
    }

    #[test]
    fn read_transcript_returns_file_not_found_for_missing_file() {
        let missing = std::env::temp_dir().join("chatlayout_missing_transcript_12345.jsonl");

        let result = read_transcript(&missing);

        match result {
            Err(TranscriptError::FileNotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn read_transcript_loads_file_contents() {
        let path = std::env::temp_dir().join("chatlayout_read_transcript_test.jsonl");
        fs::write(
            &path,
            r#"{"id":"x","sender":"alice","text":"hello","timestamp":"2025-01-01T10:00:00Z"}
"#,
        )
        .unwrap();

        let messages = read_transcript(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id().as_str(), "x");
    }

    #[test]
    fn demo_conversation_mixes_local_and_remote_senders() {
        let me = SenderId::new("me").unwrap();

        let messages = demo_conversation(&me);

        assert_eq!(messages.len(), 8);
        assert!(messages.iter().any(|m| m.sender() == &me));
        assert!(messages.iter().any(|m| m.sender() != &me));
        assert!(messages
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    }
}
