//! Scroll anchoring: keep the newest message in view while the user follows
//! the conversation, leave the viewport alone once they scroll away.
//!
//! ```text
//!            user scrolls away from bottom
//!   Tracking ─────────────────────────────▶ Free
//!      ▲                                     │
//!      └─────────────────────────────────────┘
//!     viewport bottom within epsilon of content bottom
//!     (user scroll or content size change)
//! ```

use serde::Deserialize;
use tracing::debug;

/// Default distance in lines that still counts as "at the bottom".
pub const DEFAULT_EPSILON: usize = 1;

/// Scroll tuning (`[scroll]` config section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    /// Lines from the bottom that still count as at the bottom.
    pub epsilon: usize,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Geometry of the visible window over the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible line.
    pub offset: usize,
    /// Visible lines.
    pub height: usize,
    /// Total content lines.
    pub content_height: usize,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(offset: usize, height: usize, content_height: usize) -> Self {
        Self {
            offset,
            height,
            content_height,
        }
    }

    /// Offset that shows the last line of content at the bottom edge.
    pub fn bottom_offset(&self) -> usize {
        self.content_height.saturating_sub(self.height)
    }

    /// Whether the viewport bottom is within `epsilon` lines of the content
    /// bottom. Content shorter than the viewport is always at the bottom.
    pub fn is_at_bottom(&self, epsilon: usize) -> bool {
        self.offset.saturating_add(epsilon) >= self.bottom_offset()
    }
}

/// Anchor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorState {
    /// Following the newest item.
    #[default]
    Tracking,
    /// The user scrolled away; appends do not move the viewport.
    Free,
}

/// Instruction for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    /// Scroll so the last item is fully visible.
    ToBottom {
        /// Whether the host should animate the scroll.
        animated: bool,
    },
}

/// Decides on data mutation whether to auto-scroll to the newest item.
#[derive(Debug, Clone)]
pub struct ScrollAnchor {
    state: AnchorState,
    auto_scroll: bool,
    epsilon: usize,
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new(true, DEFAULT_EPSILON)
    }
}

impl ScrollAnchor {
    /// Create an anchor in the tracking state.
    ///
    /// With `auto_scroll` false no command is ever issued.
    pub fn new(auto_scroll: bool, epsilon: usize) -> Self {
        Self {
            state: AnchorState::Tracking,
            auto_scroll,
            epsilon,
        }
    }

    /// Current state.
    pub fn state(&self) -> AnchorState {
        self.state
    }

    /// Whether auto-scrolling is enabled at all.
    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Enable or disable auto-scrolling.
    pub fn set_auto_scroll(&mut self, auto_scroll: bool) {
        self.auto_scroll = auto_scroll;
    }

    /// Tolerance in lines.
    pub fn epsilon(&self) -> usize {
        self.epsilon
    }

    /// Whether `viewport` counts as at the bottom under this anchor's
    /// tolerance.
    pub fn is_at_bottom(&self, viewport: &Viewport) -> bool {
        viewport.is_at_bottom(self.epsilon)
    }

    /// New content was appended.
    ///
    /// `was_at_bottom` describes the viewport just before the append.
    pub fn on_content_appended(&mut self, was_at_bottom: bool, animated: bool) -> Option<ScrollCommand> {
        if was_at_bottom {
            self.transition(AnchorState::Tracking);
        }
        if !self.auto_scroll {
            return None;
        }
        match self.state {
            AnchorState::Tracking => Some(ScrollCommand::ToBottom { animated }),
            AnchorState::Free => None,
        }
    }

    /// The content size changed without an append (resize, typing toggle).
    pub fn on_content_size_changed(&mut self, viewport: &Viewport) {
        if self.is_at_bottom(viewport) {
            self.transition(AnchorState::Tracking);
        }
    }

    /// The user moved the viewport.
    pub fn on_user_scroll(&mut self, viewport: &Viewport) {
        let next = if self.is_at_bottom(viewport) {
            AnchorState::Tracking
        } else {
            AnchorState::Free
        };
        self.transition(next);
    }

    fn transition(&mut self, next: AnchorState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Scroll anchor state changed");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_bottom_offset() {
        assert_eq!(Viewport::new(0, 20, 100).bottom_offset(), 80);
        assert_eq!(Viewport::new(0, 20, 10).bottom_offset(), 0);
    }

    #[test]
    fn viewport_at_bottom_within_epsilon() {
        assert!(Viewport::new(80, 20, 100).is_at_bottom(0));
        assert!(Viewport::new(79, 20, 100).is_at_bottom(1));
        assert!(!Viewport::new(78, 20, 100).is_at_bottom(1));
    }

    #[test]
    fn short_content_is_always_at_bottom() {
        assert!(Viewport::new(0, 20, 5).is_at_bottom(0));
    }

    #[test]
    fn starts_tracking() {
        assert_eq!(ScrollAnchor::default().state(), AnchorState::Tracking);
    }

    #[test]
    fn tracking_append_scrolls_to_bottom() {
        let mut anchor = ScrollAnchor::default();
        assert_eq!(
            anchor.on_content_appended(true, true),
            Some(ScrollCommand::ToBottom { animated: true })
        );
    }

    #[test]
    fn scrolled_away_append_does_nothing() {
        let mut anchor = ScrollAnchor::default();
        anchor.on_user_scroll(&Viewport::new(500, 20, 1020));
        assert_eq!(anchor.state(), AnchorState::Free);
        assert_eq!(anchor.on_content_appended(false, false), None);
    }

    #[test]
    fn scrolling_back_resumes_tracking() {
        let mut anchor = ScrollAnchor::default();
        anchor.on_user_scroll(&Viewport::new(0, 20, 100));
        anchor.on_user_scroll(&Viewport::new(80, 20, 100));
        assert_eq!(anchor.state(), AnchorState::Tracking);
    }

    #[test]
    fn content_change_at_bottom_resumes_tracking() {
        let mut anchor = ScrollAnchor::default();
        anchor.on_user_scroll(&Viewport::new(0, 20, 100));
        anchor.on_content_size_changed(&Viewport::new(0, 20, 15));
        assert_eq!(anchor.state(), AnchorState::Tracking);
    }

    #[test]
    fn append_while_at_bottom_resumes_tracking() {
        let mut anchor = ScrollAnchor::default();
        anchor.on_user_scroll(&Viewport::new(0, 20, 100));
        assert!(anchor.on_content_appended(true, false).is_some());
        assert_eq!(anchor.state(), AnchorState::Tracking);
    }

    #[test]
    fn disabled_auto_scroll_never_commands() {
        let mut anchor = ScrollAnchor::new(false, 1);
        assert_eq!(anchor.on_content_appended(true, false), None);
        anchor.set_auto_scroll(true);
        assert!(anchor.on_content_appended(true, false).is_some());
    }
}
