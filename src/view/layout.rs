//! Screen layout: message list above a one-line status bar.

use crate::view::constants::STATUS_BAR_HEIGHT;
use crate::view_state::{AnchorState, ConversationView, Measure};
use ratatui::layout::{Constraint, Layout, Rect};

/// Split the frame into the list area and the status bar area.
pub fn split(area: Rect) -> (Rect, Rect) {
    let [list, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_BAR_HEIGHT)]).areas(area);
    (list, status)
}

/// Height available to the message list in a frame of `height` rows.
pub fn list_height(height: u16) -> u16 {
    height.saturating_sub(STATUS_BAR_HEIGHT)
}

/// Status bar text: counts, scroll position and key hints.
pub fn status_line<M: Measure>(conversation: &ConversationView<M>) -> String {
    let engine = conversation.engine();
    let follow = match conversation.anchor().state() {
        AnchorState::Tracking if conversation.anchor().auto_scroll() => "following",
        _ => "paused",
    };
    let typing = if engine.is_typing_indicator_visible() {
        " | typing"
    } else {
        ""
    };
    format!(
        " {} messages | line {}/{} | {}{} | ↑↓ PgUp PgDn Home End  t typing  q quit",
        conversation.len(),
        conversation.scroll_offset(),
        engine.content_height(),
        follow,
        typing,
    )
}
