//! Message list widget.
//!
//! Draws the items resolved by [`ConversationView::visible_items`] using the
//! geometry the layout engine computed. Nothing here measures text: rows,
//! bubble frames and labels are placed exactly where the attributes say.
//!
//! [`ConversationView::visible_items`]: crate::view_state::ConversationView::visible_items

use crate::model::{Message, MessageContent};
use crate::view::constants::{MEDIA_FILL, TIMESTAMP_FORMAT, TYPING_GLYPH};
use crate::view::styles::BubbleStyles;
use crate::view_state::context::TextStyle;
use crate::view_state::measure::wrap_lines;
use crate::view_state::types;
use crate::view_state::{ItemKind, VisibleItem};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::Line,
    widgets::{Block, BorderType, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Widget drawing a slice of visible items into the list area.
///
/// Item `y` offsets are relative to the top of the area; items that start
/// above it or run past its bottom are clipped row by row.
pub struct MessageList<'a> {
    items: &'a [VisibleItem<'a>],
    text: &'a TextStyle,
    styles: &'a BubbleStyles,
}

impl<'a> MessageList<'a> {
    /// Create the widget.
    pub fn new(items: &'a [VisibleItem<'a>], text: &'a TextStyle, styles: &'a BubbleStyles) -> Self {
        Self {
            items,
            text,
            styles,
        }
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        if self.items.is_empty() {
            Paragraph::new(Line::from("No messages yet..."))
                .alignment(Alignment::Center)
                .style(self.styles.timestamp_label())
                .render(area, buf);
            return;
        }

        let mut ordered: Vec<&VisibleItem<'_>> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.attributes.z_index());

        for item in ordered {
            let height = item.attributes.height();
            if height == 0 {
                continue;
            }
            let width = item.attributes.size().width.min(area.width);
            let mut scratch = Buffer::empty(Rect::new(0, 0, width, height));
            render_item(item, self.text, self.styles, &mut scratch);
            blit(&scratch, item.y, area, buf);
        }
    }
}

/// Copy the rows of `scratch` that fall inside `area` when its top is
/// placed `y` rows below the top of `area`.
fn blit(scratch: &Buffer, y: isize, area: Rect, buf: &mut Buffer) {
    let source = scratch.area;
    for row in 0..source.height {
        let Ok(target_row) = u16::try_from(y + row as isize) else {
            continue;
        };
        if target_row >= area.height {
            break;
        }
        for col in 0..source.width.min(area.width) {
            let (Some(cell), Some(target)) = (
                scratch.cell((col, row)),
                buf.cell_mut((area.x + col, area.y + target_row)),
            ) else {
                continue;
            };
            *target = cell.clone();
        }
    }
}

/// Draw one item into a buffer whose origin is the item's origin.
fn render_item(item: &VisibleItem<'_>, text: &TextStyle, styles: &BubbleStyles, buf: &mut Buffer) {
    let attributes = &item.attributes;
    let kind = attributes.kind();
    let bubble = clip(to_tui(attributes.bubble_frame()), buf.area);
    let style = styles.bubble(kind);

    let Some(message) = item.message else {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(style)
            .render(bubble, buf);
        let inner = clip(to_tui(attributes.content_frame()), buf.area);
        let glyph_area = if attributes.content_insets().vertical() == 0 {
            shrink(bubble)
        } else {
            inner
        };
        centered(TYPING_GLYPH, glyph_area, style, buf);
        return;
    };

    if attributes.top_label_height() > 0 {
        aligned_label(
            message.display_name(),
            0,
            kind,
            bubble,
            styles.sender_label(),
            buf,
        );
    }

    if let Some(avatar) = attributes.avatar_frame() {
        let avatar = clip(to_tui(avatar), buf.area);
        buf.set_style(avatar, styles.avatar());
        centered(&initials(message), avatar, styles.avatar(), buf);
    }

    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(style)
        .render(bubble, buf);

    let content = clip(to_tui(attributes.content_frame()), buf.area);
    render_content(message, content, text, style, styles, buf);

    let bottom = attributes.bottom_label_height();
    if bottom > 0 {
        let row = attributes.height().saturating_sub(bottom);
        let stamp = message.timestamp().format(TIMESTAMP_FORMAT).to_string();
        aligned_label(&stamp, row, kind, bubble, styles.timestamp_label(), buf);
    }
}

fn render_content(
    message: &Message,
    area: Rect,
    text: &TextStyle,
    style: Style,
    styles: &BubbleStyles,
    buf: &mut Buffer,
) {
    if area.is_empty() {
        return;
    }
    match message.content() {
        MessageContent::Text(body) => {
            let rows = wrap_lines(body, area.width, text);
            for (offset, row) in (0..area.height).zip(rows.iter()) {
                buf.set_stringn(area.x, area.y + offset, row, usize::from(area.width), style);
            }
        }
        MessageContent::Media(media) => {
            let fill = MEDIA_FILL.to_string().repeat(usize::from(area.width));
            for offset in 0..area.height {
                buf.set_stringn(area.x, area.y + offset, &fill, usize::from(area.width), styles.media());
            }
            let kind = media.kind().label();
            let mut labels = vec![format!("[{kind}]"), kind.to_string()];
            if let Some((w, h)) = media.dimensions() {
                labels.insert(0, format!("[{kind} {w}x{h}]"));
            }
            // Longest label that fits; the last one is clipped if none does.
            let label = labels
                .iter()
                .find(|label| label.width() <= usize::from(area.width))
                .or(labels.last());
            if let Some(label) = label {
                centered(label, area, styles.media(), buf);
            }
        }
    }
}

/// Label placed on `row`, flush with the bubble's outer edge.
fn aligned_label(
    label: &str,
    row: u16,
    kind: ItemKind,
    bubble: Rect,
    style: Style,
    buf: &mut Buffer,
) {
    if row >= buf.area.height || label.is_empty() {
        return;
    }
    let width = u16::try_from(label.width()).unwrap_or(u16::MAX);
    let x = match kind {
        ItemKind::OutgoingMessage => bubble.right().saturating_sub(width),
        ItemKind::IncomingMessage | ItemKind::TypingIndicator => bubble.x,
    };
    let room = buf.area.width.saturating_sub(x);
    buf.set_stringn(x, row, label, usize::from(room), style);
}

fn centered(label: &str, area: Rect, style: Style, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let width = u16::try_from(label.width()).unwrap_or(u16::MAX).min(area.width);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + area.height.saturating_sub(1) / 2;
    buf.set_stringn(x, y, label, usize::from(width), style);
}

/// First letter of the sender's display name.
fn initials(message: &Message) -> String {
    message
        .display_name()
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

fn to_tui(rect: types::Rect) -> Rect {
    Rect::new(rect.x, rect.y, rect.width, rect.height)
}

fn clip(rect: Rect, bounds: Rect) -> Rect {
    rect.intersection(bounds)
}

fn shrink(rect: Rect) -> Rect {
    Rect::new(
        rect.x.saturating_add(1),
        rect.y.saturating_add(1),
        rect.width.saturating_sub(2),
        rect.height.saturating_sub(2),
    )
}
