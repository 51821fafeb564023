//! Message types for chat entries.
//!
//! A [`Message`] is an immutable value owned by the caller's data source.
//! The layout engine only ever reads it.

use crate::model::{MessageId, SenderId};
use chrono::{DateTime, Utc};

// ===== MediaKind =====

/// Kind of media attached to a media message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip (rendered as its poster frame)
    Video,
    /// Map snapshot for a shared location
    Location,
    /// Audio clip (rendered as a player strip)
    Audio,
}

impl MediaKind {
    /// Short label shown in place of the media in text-only renderers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Location => "location",
            Self::Audio => "audio",
        }
    }
}

// ===== MediaDescriptor =====

/// Description of a media payload sufficient for sizing it.
///
/// Intrinsic dimensions may be unknown (still downloading, corrupt
/// metadata); such media cannot be measured and is laid out with a
/// placeholder size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaDescriptor {
    kind: MediaKind,
    width: Option<u16>,
    height: Option<u16>,
}

impl MediaDescriptor {
    /// Media with known intrinsic dimensions (in cells).
    pub fn new(kind: MediaKind, width: u16, height: u16) -> Self {
        Self {
            kind,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Media whose dimensions are not known yet.
    pub fn without_size(kind: MediaKind) -> Self {
        Self {
            kind,
            width: None,
            height: None,
        }
    }

    /// Build from optional dimensions as they arrive from a transcript.
    pub fn from_parts(kind: MediaKind, width: Option<u16>, height: Option<u16>) -> Self {
        Self {
            kind,
            width,
            height,
        }
    }

    /// Media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Intrinsic `(width, height)` when both are known and non-zero.
    pub fn dimensions(&self) -> Option<(u16, u16)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

// ===== MessageContent =====

/// Content of a message.
///
/// Sum type ensures exactly one representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageContent {
    /// Plain text body
    Text(String),
    /// Media attachment
    Media(MediaDescriptor),
}

// ===== Message =====

/// One chat entry.
///
/// Immutable once built. Edits are modelled as removing the message and
/// inserting a new one with a fresh [`MessageId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    sender: SenderId,
    display_name: Option<String>,
    content: MessageContent,
    timestamp: DateTime<Utc>,
    show_display_name: bool,
}

impl Message {
    /// Create a message. The sender name label is visible by default.
    pub fn new(
        id: MessageId,
        sender: SenderId,
        content: MessageContent,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender,
            display_name: None,
            content,
            timestamp,
            show_display_name: true,
        }
    }

    /// Convenience constructor for a text message.
    pub fn text(
        id: MessageId,
        sender: SenderId,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, sender, MessageContent::Text(text.into()), timestamp)
    }

    /// Attach a human readable sender name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set whether the sender name label may be shown for this message.
    pub fn with_display_name_visible(mut self, visible: bool) -> Self {
        self.show_display_name = visible;
        self
    }

    /// Stable identity.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Author.
    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    /// Name shown in the sender label; falls back to the sender id.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.sender.as_str())
    }

    /// Body.
    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Time the message was sent.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether the sender name label may be shown.
    pub fn show_display_name(&self) -> bool {
        self.show_display_name
    }
}
