//! Core identifier newtypes with smart constructors.
//!
//! All identifiers validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Stable identity of one message in the data set.
///
/// Messages are immutable; an edit produces a new message with a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Smart constructor: validates non-empty id
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidMessageId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidMessageId::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Identity of a message author.
///
/// Compared against the local sender to decide whether a message is
/// outgoing or incoming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(String);

impl SenderId {
    /// Smart constructor: validates non-empty sender id
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSenderId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidSenderId::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SenderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

// ===== Error Types =====

/// Rejected [`MessageId`] input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMessageId {
    /// The id was the empty string.
    #[error("Message ID cannot be empty")]
    Empty,
}

/// Rejected [`SenderId`] input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSenderId {
    /// The id was the empty string.
    #[error("Sender ID cannot be empty")]
    Empty,
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_rejects_empty() {
        assert_eq!(MessageId::new(""), Err(InvalidMessageId::Empty));
    }

    #[test]
    fn message_id_round_trips_raw_value() {
        let id = MessageId::new("m-1").expect("valid id");
        assert_eq!(id.as_str(), "m-1");
        assert_eq!(id.to_string(), "m-1");
    }

    #[test]
    fn sender_id_rejects_empty() {
        assert_eq!(SenderId::new(""), Err(InvalidSenderId::Empty));
    }

    #[test]
    fn sender_ids_compare_by_value() {
        let a = SenderId::new("alice").unwrap();
        let b = SenderId::new("alice").unwrap();
        let c = SenderId::new("bob").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn deserialize_rejects_empty_sender() {
        let result: Result<SenderId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_accepts_message_id() {
        let id: MessageId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
    }
}
