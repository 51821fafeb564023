//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod message;

// Re-export for convenience
pub use error::{AppError, ContentProblem, LayoutError, TranscriptError};
pub use identifiers::{InvalidMessageId, InvalidSenderId, MessageId, SenderId};
pub use message::{MediaDescriptor, MediaKind, Message, MessageContent};
