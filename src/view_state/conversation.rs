//! View-state for a single conversation.
//!
//! [`ConversationView`] is the host-side facade: it owns the message list,
//! reports every mutation to the [`LayoutEngine`] in commit order, consults
//! the [`ScrollAnchor`] on appends and keeps a semantic [`ScrollPosition`].
//!
//! While the view is not following new content its position is stored
//! relative to an item (`AtItem`), so heights settling above the viewport
//! (late measurement, prefetch, edits) never move what the user is reading.

use super::anchor::{AnchorState, ScrollAnchor, ScrollCommand, Viewport};
use super::attributes::ItemAttributes;
use super::context::LayoutStyle;
use super::engine::{Change, LayoutEngine};
use super::measure::Measure;
use super::prefetch::PrefetchJob;
use super::scroll::ScrollPosition;
use super::types::LineOffset;
use crate::model::{LayoutError, Message};
use std::ops::Range;
use tracing::warn;

/// Upper bound on resolve passes per frame. Each pass replaces estimated
/// heights with real ones, which can shift the visible range.
const MAX_LAYOUT_PASSES: usize = 4;

/// One item inside the viewport, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleItem<'a> {
    /// Item index.
    pub index: usize,
    /// Top edge relative to the viewport top; negative when clipped.
    pub y: isize,
    /// Resolved geometry.
    pub attributes: ItemAttributes,
    /// The message, `None` for the typing indicator.
    pub message: Option<&'a Message>,
}

/// Messages, layout engine, scroll anchor and scroll position together.
#[derive(Debug)]
pub struct ConversationView<M> {
    messages: Vec<Message>,
    engine: LayoutEngine<M>,
    anchor: ScrollAnchor,
    scroll: ScrollPosition,
    viewport_height: usize,
}

impl<M: Measure> ConversationView<M> {
    /// Create an empty conversation.
    pub fn new(engine: LayoutEngine<M>, anchor: ScrollAnchor, viewport_height: usize) -> Self {
        Self {
            messages: Vec::new(),
            engine,
            anchor,
            scroll: ScrollPosition::Bottom,
            viewport_height,
        }
    }

    /// Replace the whole message list.
    pub fn load(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.engine.reload_data(self.messages.len());
        self.scroll = ScrollPosition::Bottom;
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The layout engine.
    pub fn engine(&self) -> &LayoutEngine<M> {
        &self.engine
    }

    /// Mutable access to the layout engine.
    pub fn engine_mut(&mut self) -> &mut LayoutEngine<M> {
        &mut self.engine
    }

    /// The scroll anchor.
    pub fn anchor(&self) -> &ScrollAnchor {
        &self.anchor
    }

    /// Current scroll position.
    pub fn scroll(&self) -> &ScrollPosition {
        &self.scroll
    }

    /// Visible lines.
    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Current first visible line.
    pub fn scroll_offset(&self) -> usize {
        let count = self.engine.item_count();
        // A pinned item past the end (trailing removals) resolves to the bottom.
        self.scroll
            .resolve(self.engine.content_height(), self.viewport_height, |index| {
                Some(LineOffset::new(self.engine.item_offset(index.min(count))))
            })
            .get()
    }

    /// Current viewport geometry.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.scroll_offset(),
            self.viewport_height,
            self.engine.content_height(),
        )
    }

    /// Append a message (sent or received) and apply the anchor's decision.
    ///
    /// A follow is requested animated. Without one the viewport stays on
    /// the lines it showed before the append.
    pub fn push_message(&mut self, message: Message) -> Option<ScrollCommand> {
        let viewport = self.viewport();
        let was_at_bottom = self.anchor.is_at_bottom(&viewport);
        let pinned = self.position_at(viewport.offset);
        let index = self.messages.len();
        self.messages.push(message);
        if let Err(err) = self.engine.data_set_mutated(Change::Inserted(index)) {
            warn!(error = %err, "Engine rejected append; reloading");
            self.engine.reload_data(self.messages.len());
        }
        self.engine.attributes_for(&self.messages, index);

        let command = self.anchor.on_content_appended(was_at_bottom, true);
        self.apply(command, pinned);
        command
    }

    /// Insert a message anywhere.
    ///
    /// # Errors
    /// `LayoutError::StaleIndex` when `index > len()`.
    pub fn insert_message(&mut self, index: usize, message: Message) -> Result<(), LayoutError> {
        if index > self.messages.len() {
            return Err(LayoutError::StaleIndex {
                index,
                count: self.messages.len(),
            });
        }
        self.messages.insert(index, message);
        self.shift_pinned_item(Change::Inserted(index));
        self.engine.data_set_mutated(Change::Inserted(index))
    }

    /// Remove the message at `index`.
    ///
    /// # Errors
    /// `LayoutError::StaleIndex` when `index >= len()`.
    pub fn remove_message(&mut self, index: usize) -> Result<Message, LayoutError> {
        if index >= self.messages.len() {
            return Err(LayoutError::StaleIndex {
                index,
                count: self.messages.len(),
            });
        }
        let removed = self.messages.remove(index);
        self.shift_pinned_item(Change::Removed(index));
        self.engine.data_set_mutated(Change::Removed(index))?;
        Ok(removed)
    }

    /// Replace the message at `index`, returning the old one.
    ///
    /// # Errors
    /// `LayoutError::StaleIndex` when `index >= len()`.
    pub fn replace_message(&mut self, index: usize, message: Message) -> Result<Message, LayoutError> {
        let Some(slot) = self.messages.get_mut(index) else {
            return Err(LayoutError::StaleIndex {
                index,
                count: self.messages.len(),
            });
        };
        let previous = std::mem::replace(slot, message);
        self.engine.data_set_mutated(Change::Replaced(index))?;
        Ok(previous)
    }

    /// Show or hide the typing indicator. Showing it counts as an append.
    pub fn set_typing(&mut self, visible: bool) -> Option<ScrollCommand> {
        if visible == self.engine.is_typing_indicator_visible() {
            return None;
        }
        let viewport = self.viewport();
        let was_at_bottom = self.anchor.is_at_bottom(&viewport);
        let pinned = self.position_at(viewport.offset);
        self.engine.set_typing_indicator_visible(visible);

        if visible {
            self.engine
                .attributes_for(&self.messages, self.messages.len());
            let command = self.anchor.on_content_appended(was_at_bottom, true);
            self.apply(command, pinned);
            command
        } else {
            let viewport = self.viewport();
            self.anchor.on_content_size_changed(&viewport);
            None
        }
    }

    /// The container was resized.
    ///
    /// # Errors
    /// `LayoutError::ContextInvalid` for a zero width; nothing changes.
    pub fn resize(&mut self, width: u16, height: usize) -> Result<(), LayoutError> {
        self.engine.on_container_resized(width)?;
        self.viewport_height = height;
        let viewport = self.viewport();
        self.anchor.on_content_size_changed(&viewport);
        Ok(())
    }

    /// Install a new style.
    ///
    /// # Errors
    /// `LayoutError::ContextInvalid` for an invalid style; nothing changes.
    pub fn set_style(&mut self, style: LayoutStyle) -> Result<(), LayoutError> {
        self.engine.on_style_changed(style)
    }

    /// User scroll by `delta` lines (negative is up).
    ///
    /// Reaching the very bottom with auto-scroll on resumes following;
    /// anywhere else the position is pinned to the item under the top row.
    pub fn scroll_by(&mut self, delta: isize) {
        let bottom = self
            .engine
            .content_height()
            .saturating_sub(self.viewport_height);
        let target = self.scroll_offset().saturating_add_signed(delta).min(bottom);
        self.scroll = self.position_at(target);

        let viewport = self.viewport();
        self.anchor.on_user_scroll(&viewport);
        if target == bottom
            && self.anchor.auto_scroll()
            && self.anchor.state() == AnchorState::Tracking
        {
            self.scroll = ScrollPosition::Bottom;
        }
    }

    /// Enable or disable following the newest item.
    pub fn set_auto_scroll(&mut self, auto_scroll: bool) {
        self.anchor.set_auto_scroll(auto_scroll);
    }

    /// User jump to the newest item.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = ScrollPosition::Bottom;
        let viewport = self.viewport();
        self.anchor.on_user_scroll(&viewport);
    }

    /// User jump to the oldest item.
    pub fn scroll_to_top(&mut self) {
        self.scroll = ScrollPosition::Top;
        let viewport = self.viewport();
        self.anchor.on_user_scroll(&viewport);
    }

    /// Resolve the items intersecting the viewport.
    pub fn visible_items(&mut self) -> Vec<VisibleItem<'_>> {
        let range = self.settle_visible_range();
        self.engine.visible_range_changed(range.clone());

        let resolved = self.engine.resolve_range(&self.messages, range);
        let offset = self.scroll_offset();
        resolved
            .into_iter()
            .map(|(index, attributes)| VisibleItem {
                index,
                y: self.engine.item_offset(index) as isize - offset as isize,
                attributes,
                message: self.messages.get(index),
            })
            .collect()
    }

    /// Snapshot `lookahead` items on each side of the visible range for
    /// background measurement.
    pub fn prefetch_job(&self, lookahead: usize) -> PrefetchJob {
        let visible = self.engine.visible_range();
        let start = visible.start.saturating_sub(lookahead);
        let end = visible.end.saturating_add(lookahead);
        self.engine.prefetch_job(&self.messages, start..end)
    }

    /// Record heights computed by a finished prefetch.
    pub fn adopt_prefetched(&mut self, range: Range<usize>) -> usize {
        self.engine.adopt_prefetched(&self.messages, range)
    }

    fn settle_visible_range(&mut self) -> Range<usize> {
        let mut range = 0..0;
        for _ in 0..MAX_LAYOUT_PASSES {
            let next = self
                .engine
                .visible_range_for(self.scroll_offset(), self.viewport_height);
            self.engine.resolve_range(&self.messages, next.clone());
            if next == range {
                break;
            }
            range = next;
        }
        range
    }

    /// Follow on a command; otherwise stop `Bottom` from re-resolving to
    /// the grown content by pinning the pre-append position.
    fn apply(&mut self, command: Option<ScrollCommand>, pinned: ScrollPosition) {
        match command {
            Some(ScrollCommand::ToBottom { .. }) => self.scroll = ScrollPosition::Bottom,
            None if self.scroll == ScrollPosition::Bottom => self.scroll = pinned,
            None => {}
        }
    }

    /// Item-relative position of line `offset`.
    fn position_at(&self, offset: usize) -> ScrollPosition {
        match self.engine.index_at_offset(offset) {
            Some(index) => ScrollPosition::AtItem {
                index,
                line_in_item: offset.saturating_sub(self.engine.item_offset(index)),
            },
            None => ScrollPosition::at_line(offset),
        }
    }

    /// Keep a pinned item pointing at the same message across an edit.
    fn shift_pinned_item(&mut self, change: Change) {
        let ScrollPosition::AtItem {
            index,
            line_in_item,
        } = &mut self.scroll
        else {
            return;
        };
        match change {
            Change::Inserted(at) if at <= *index => *index += 1,
            Change::Removed(at) if at < *index => *index -= 1,
            Change::Removed(at) if at == *index => *line_in_item = 0,
            Change::Inserted(_) | Change::Removed(_) | Change::Replaced(_) => {}
        }
    }
}
