//! Error types for chatlayout.
//!
//! This module defines the error taxonomy using `thiserror` for structured
//! error handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error of the terminal viewer
//!   - [`ConfigError`] - Config file read/parse failures
//!   - [`LoggingError`] - Tracing subscriber setup failures
//!   - [`TranscriptError`] - Transcript file reading failures
//!   - [`LayoutError`] - Invalid initial layout context
//!   - [`InvalidSenderId`] - Empty configured local sender
//!   - `std::io::Error` - Terminal failures
//! - [`LayoutError`] - Failures inside the layout engine
//!
//! # Error Recovery Strategy
//!
//! Nothing the layout engine reports is fatal. Unmeasurable content is laid
//! out with a placeholder size, stale indices produce an empty result, and an
//! invalid context is rejected while the previous one stays active. Only the
//! impure shell (config, logging, terminal, transcript) has fatal errors.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::model::{InvalidSenderId, MediaKind};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error of the terminal viewer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Transcript could not be read.
    #[error("Failed to read transcript: {0}")]
    Transcript(#[from] TranscriptError),

    /// The configured layout style cannot be used.
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// The configured local sender id is invalid.
    #[error("Invalid local sender: {0}")]
    LocalSender(#[from] InvalidSenderId),

    /// Terminal or TUI rendering error.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Errors encountered when reading a transcript file.
///
/// Individual malformed lines are not errors; they are skipped with a
/// warning by the reader.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// The transcript path does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// Any other I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a message's content cannot be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentProblem {
    /// Text message with an empty body.
    EmptyText,
    /// Media whose intrinsic size is missing or zero.
    UnsizedMedia(MediaKind),
}

impl std::fmt::Display for ContentProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => f.write_str("text is empty"),
            Self::UnsizedMedia(kind) => write!(f, "{} has no resolvable size", kind.label()),
        }
    }
}

/// Errors raised inside the layout engine.
///
/// None of these escape the engine as faults: see the module docs for how
/// each one degrades.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Content cannot be measured. Recovered with a placeholder size.
    #[error("Invalid content: {0}")]
    InvalidContent(ContentProblem),

    /// Query for an index past the end of the data set, typically a race
    /// between a mutation notification and a render query.
    #[error("Stale index {index} (item count {count})")]
    StaleIndex {
        /// Requested index.
        index: usize,
        /// Item count at the time of the query.
        count: usize,
    },

    /// Rejected layout context. The previous context stays active.
    #[error("Invalid layout context: {0}")]
    ContextInvalid(&'static str),
}
