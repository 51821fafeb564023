//! Bubble styling.
//!
//! Incoming and outgoing bubbles get distinct border colors so the two sides
//! of the conversation read apart even when avatars are hidden.

use crate::view_state::ItemKind;
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Colors are disabled when the `NO_COLOR` environment variable is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Read `NO_COLOR` from the environment.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Explicitly enabled or disabled colors.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== BubbleStyles =====

/// Styles for the parts of a rendered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleStyles {
    incoming: Style,
    outgoing: Style,
    typing: Style,
    avatar: Style,
    sender_label: Style,
    timestamp_label: Style,
    media: Style,
    status_bar: Style,
}

impl BubbleStyles {
    /// Styles for the given color configuration.
    ///
    /// Without colors only modifiers (bold, dim) are kept.
    pub fn with_color_config(config: ColorConfig) -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        if config.colors_enabled() {
            Self {
                incoming: Style::default().fg(Color::Cyan),
                outgoing: Style::default().fg(Color::Green),
                typing: dim.fg(Color::Gray),
                avatar: bold.fg(Color::Black).bg(Color::Magenta),
                sender_label: bold.fg(Color::Cyan),
                timestamp_label: dim,
                media: dim.fg(Color::Yellow),
                status_bar: Style::default().fg(Color::Black).bg(Color::Gray),
            }
        } else {
            Self {
                incoming: Style::default(),
                outgoing: Style::default(),
                typing: dim,
                avatar: bold,
                sender_label: bold,
                timestamp_label: dim,
                media: dim,
                status_bar: Style::default().add_modifier(Modifier::REVERSED),
            }
        }
    }

    /// Bubble border and text style for an item kind.
    pub fn bubble(&self, kind: ItemKind) -> Style {
        match kind {
            ItemKind::IncomingMessage => self.incoming,
            ItemKind::OutgoingMessage => self.outgoing,
            ItemKind::TypingIndicator => self.typing,
        }
    }

    /// Avatar block style.
    pub fn avatar(&self) -> Style {
        self.avatar
    }

    /// Sender name label style.
    pub fn sender_label(&self) -> Style {
        self.sender_label
    }

    /// Timestamp label style.
    pub fn timestamp_label(&self) -> Style {
        self.timestamp_label
    }

    /// Media placeholder fill style.
    pub fn media(&self) -> Style {
        self.media
    }

    /// Status bar style.
    pub fn status_bar(&self) -> Style {
        self.status_bar
    }
}

impl Default for BubbleStyles {
    fn default() -> Self {
        Self::with_color_config(ColorConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_and_outgoing_differ_when_colors_enabled() {
        let styles = BubbleStyles::with_color_config(ColorConfig::new(true));
        assert_ne!(
            styles.bubble(ItemKind::IncomingMessage),
            styles.bubble(ItemKind::OutgoingMessage)
        );
    }

    #[test]
    fn no_color_drops_foreground_colors() {
        let styles = BubbleStyles::with_color_config(ColorConfig::new(false));
        assert_eq!(styles.bubble(ItemKind::IncomingMessage).fg, None);
        assert_eq!(styles.bubble(ItemKind::OutgoingMessage).fg, None);
        assert_eq!(styles.avatar().bg, None);
    }

    #[test]
    fn typing_indicator_is_dimmed() {
        let styles = BubbleStyles::with_color_config(ColorConfig::new(false));
        assert!(styles
            .bubble(ItemKind::TypingIndicator)
            .add_modifier
            .contains(Modifier::DIM));
    }
}
