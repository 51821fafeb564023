//! Layout dimension constants for TUI rendering.

use std::time::Duration;

/// Height of the status bar in lines.
///
/// Single line for scroll state and keyboard hints.
pub const STATUS_BAR_HEIGHT: u16 = 1;

/// Items measured in the background on each side of the visible range.
pub const PREFETCH_LOOKAHEAD: usize = 32;

/// How long the event loop waits for input before checking on prefetch.
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Glyph drawn inside the typing indicator bubble.
pub const TYPING_GLYPH: &str = "•••";

/// Fill character for media placeholders.
pub const MEDIA_FILL: char = '░';

/// `chrono` format of the timestamp label under a bubble.
pub const TIMESTAMP_FORMAT: &str = "%H:%M";
