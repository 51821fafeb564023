//! Per-item layout attributes and the placement policy that produces them.
//!
//! [`compute_attributes`] is a pure function of the item, the context and
//! the two logical neighbors. It never touches the cache; the engine
//! memoizes its results by fingerprint.
//!
//! # Placement
//! ```text
//!  incoming                               outgoing
//!  ┌────────────────────────────────────────────────┐
//!  │   Alice            <- top label (sender)       │
//!  │   ╭──────────╮                                 │
//!  │[A]│ Hi       │                  ╭───────────╮  │
//!  │   ╰──────────╯                  │ Hello     │[M]
//!  │   10:30            <- bottom label (timestamp) │
//!  └────────────────────────────────────────────────┘
//! ```
//! Avatars sit on the leading edge for incoming items and on the trailing
//! edge for outgoing ones, bottom-aligned with the bubble. The avatar column
//! is reserved even when a particular avatar is hidden so bubbles in a run
//! stay aligned.

use super::context::{AvatarPolicy, LayoutContext};
use super::measure::Measure;
use super::types::{Insets, Rect, Size};
use crate::model::{LayoutError, Message, MessageContent, SenderId};
use tracing::warn;

/// Closed set of item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Message from the local sender.
    OutgoingMessage,
    /// Message from anyone else.
    IncomingMessage,
    /// Synthetic trailing "is typing" bubble.
    TypingIndicator,
}

/// One row of the list, resolved against the local sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    /// Message sent by the local user.
    Outgoing(&'a Message),
    /// Message received from another sender.
    Incoming(&'a Message),
    /// The typing indicator pseudo-item.
    TypingIndicator,
}

impl<'a> Item<'a> {
    /// Classify a message as outgoing or incoming.
    pub fn classify(message: &'a Message, local_sender: &SenderId) -> Self {
        if message.sender() == local_sender {
            Self::Outgoing(message)
        } else {
            Self::Incoming(message)
        }
    }

    /// Discriminant.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Outgoing(_) => ItemKind::OutgoingMessage,
            Self::Incoming(_) => ItemKind::IncomingMessage,
            Self::TypingIndicator => ItemKind::TypingIndicator,
        }
    }

    /// Underlying message, if this is a real item.
    pub fn message(&self) -> Option<&'a Message> {
        match self {
            Self::Outgoing(message) | Self::Incoming(message) => Some(message),
            Self::TypingIndicator => None,
        }
    }

    fn sender(&self) -> Option<&'a SenderId> {
        self.message().map(Message::sender)
    }
}

/// Neighbor-dependent facts about an item.
///
/// These are the only inputs besides the item itself and the context that
/// affect geometry, so they take part in the layout fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Adjacency {
    /// Draw the avatar next to this item.
    pub show_avatar: bool,
    /// Draw the sender name above this item.
    pub show_sender_label: bool,
    /// Draw a timestamp below this item.
    pub timestamp_anchor: bool,
}

impl Adjacency {
    /// Derive adjacency facts from the neighbors. Cheap: no measurement.
    pub fn resolve(
        item: Item<'_>,
        context: &LayoutContext,
        before: Option<Item<'_>>,
        after: Option<Item<'_>>,
    ) -> Self {
        let Some(message) = item.message() else {
            return Self::default();
        };
        let style = context.style();

        let starts_run = match before {
            None => true,
            Some(previous) => previous.sender() != Some(message.sender()),
        };

        let avatar_enabled = !avatar_size(item.kind(), context).is_empty();
        let show_avatar =
            avatar_enabled && (starts_run || style.avatar_policy == AvatarPolicy::EveryMessage);

        let show_sender_label = item.kind() == ItemKind::IncomingMessage
            && message.show_display_name()
            && starts_run;

        let policy = &style.timestamps;
        let gap_exceeded = before
            .and_then(|previous| previous.message())
            .is_some_and(|previous| {
                message.timestamp() - previous.timestamp() > policy.gap_threshold()
            });
        let timestamp_anchor = (policy.first_item && before.is_none())
            || gap_exceeded
            || (policy.last_item && after.is_none());

        Self {
            show_avatar,
            show_sender_label,
            timestamp_anchor,
        }
    }
}

/// Computed geometry for one item.
///
/// Produced only by the layout model; immutable once built. All rectangles
/// are relative to the item's own origin (top-left of its row).
///
/// # Invariants
/// - `bubble_frame` and `avatar_frame` lie within `size`
/// - `size.width` equals the container width of the context it was built in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAttributes {
    kind: ItemKind,
    size: Size,
    bubble_frame: Rect,
    content_insets: Insets,
    avatar_frame: Option<Rect>,
    top_label_height: u16,
    bottom_label_height: u16,
    z_index: i32,
}

impl ItemAttributes {
    /// Item kind these attributes were computed for.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Overall frame size of the row.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Row height.
    pub fn height(&self) -> u16 {
        self.size.height
    }

    /// Bubble rectangle.
    pub fn bubble_frame(&self) -> Rect {
        self.bubble_frame
    }

    /// Padding between bubble edge and content.
    pub fn content_insets(&self) -> Insets {
        self.content_insets
    }

    /// Content rectangle: the bubble minus its insets.
    pub fn content_frame(&self) -> Rect {
        let bubble = self.bubble_frame;
        let insets = self.content_insets;
        Rect::new(
            bubble.x.saturating_add(insets.left),
            bubble.y.saturating_add(insets.top),
            bubble.width.saturating_sub(insets.horizontal()),
            bubble.height.saturating_sub(insets.vertical()),
        )
    }

    /// Avatar rectangle, `None` when no avatar is drawn for this item.
    pub fn avatar_frame(&self) -> Option<Rect> {
        self.avatar_frame
    }

    /// Height of the sender name label above the bubble.
    pub fn top_label_height(&self) -> u16 {
        self.top_label_height
    }

    /// Height of the timestamp label below the bubble.
    pub fn bottom_label_height(&self) -> u16 {
        self.bottom_label_height
    }

    /// Stacking order; higher draws above.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }
}

/// Compute the attributes of `item` given its neighbors.
///
/// Pure: same arguments, same result. Does not consult any cache.
///
/// # Errors
/// `LayoutError::InvalidContent` when the message content cannot be
/// measured. Use [`compute_attributes_or_placeholder`] where failure is not
/// an option.
pub fn compute_attributes<M: Measure + ?Sized>(
    measurer: &M,
    item: Item<'_>,
    context: &LayoutContext,
    before: Option<Item<'_>>,
    after: Option<Item<'_>>,
) -> Result<ItemAttributes, LayoutError> {
    let adjacency = Adjacency::resolve(item, context, before, after);
    layout_item(measurer, item, context, adjacency)
}

/// Like [`compute_attributes`], substituting the context's placeholder size
/// for content that cannot be measured.
pub fn compute_attributes_or_placeholder<M: Measure + ?Sized>(
    measurer: &M,
    item: Item<'_>,
    context: &LayoutContext,
    before: Option<Item<'_>>,
    after: Option<Item<'_>>,
) -> ItemAttributes {
    let adjacency = Adjacency::resolve(item, context, before, after);
    layout_item_or_placeholder(measurer, item, context, adjacency)
}

pub(crate) fn layout_item_or_placeholder<M: Measure + ?Sized>(
    measurer: &M,
    item: Item<'_>,
    context: &LayoutContext,
    adjacency: Adjacency,
) -> ItemAttributes {
    match layout_item(measurer, item, context, adjacency) {
        Ok(attributes) => attributes,
        Err(err) => {
            if let Some(message) = item.message() {
                warn!(message_id = %message.id(), error = %err, "Substituting placeholder size");
            }
            let frame = BubbleFrame::new(item.kind(), context, content_insets(item, context));
            assemble(item.kind(), context, adjacency, &frame, context.style().placeholder_size)
        }
    }
}

pub(crate) fn layout_item<M: Measure + ?Sized>(
    measurer: &M,
    item: Item<'_>,
    context: &LayoutContext,
    adjacency: Adjacency,
) -> Result<ItemAttributes, LayoutError> {
    let kind = item.kind();
    let frame = BubbleFrame::new(kind, context, content_insets(item, context));

    match item {
        Item::TypingIndicator => Ok(typing_indicator(context)),
        Item::Outgoing(message) | Item::Incoming(message) => {
            let content = measurer.measure(
                message.content(),
                frame.max_content_width(),
                &context.style().text,
            )?;
            Ok(assemble(kind, context, adjacency, &frame, content))
        }
    }
}

/// Horizontal budget of a bubble for one item kind.
///
/// In a container too narrow for margins, avatar column and a one-cell
/// bubble, the avatar column is dropped first, then the margins shrink.
struct BubbleFrame {
    insets: Insets,
    margin: u16,
    avatar_column: u16,
    min_width: u16,
    max_width: u16,
}

impl BubbleFrame {
    fn new(kind: ItemKind, context: &LayoutContext, insets: Insets) -> Self {
        let style = context.style();
        let container = context.container_width();
        let margin = style.bubble.margin.min(container.saturating_sub(1) / 2);

        let avatar = avatar_size(kind, context);
        let avatar_column = if avatar.is_empty() {
            0
        } else {
            avatar.width.saturating_add(margin)
        };
        let needed = u32::from(margin) * 2 + u32::from(avatar_column);
        let avatar_column = if needed < u32::from(container) {
            avatar_column
        } else {
            0
        };

        let available = container
            .saturating_sub(margin.saturating_mul(2))
            .saturating_sub(avatar_column);
        let max_width = context.max_bubble_width().min(available).max(1);
        let min_width = style.bubble.min_width.min(max_width);

        Self {
            insets,
            margin,
            avatar_column,
            min_width,
            max_width,
        }
    }

    fn max_content_width(&self) -> u16 {
        self.max_width.saturating_sub(self.insets.horizontal()).max(1)
    }
}

fn avatar_size(kind: ItemKind, context: &LayoutContext) -> Size {
    let avatars = &context.style().avatars;
    match kind {
        ItemKind::IncomingMessage => avatars.incoming,
        ItemKind::OutgoingMessage => avatars.outgoing,
        ItemKind::TypingIndicator => Size::ZERO,
    }
}

fn content_insets(item: Item<'_>, context: &LayoutContext) -> Insets {
    let bubble = &context.style().bubble;
    match item.message().map(Message::content) {
        Some(MessageContent::Media(_)) => bubble.media_insets,
        Some(MessageContent::Text(_)) | None => bubble.text_insets,
    }
}

fn assemble(
    kind: ItemKind,
    context: &LayoutContext,
    adjacency: Adjacency,
    frame: &BubbleFrame,
    content: Size,
) -> ItemAttributes {
    let style = context.style();
    let container = context.container_width();
    let margin = frame.margin;

    let bubble_width = content
        .width
        .saturating_add(frame.insets.horizontal())
        .clamp(frame.min_width, frame.max_width);
    let bubble_height = content.height.saturating_add(frame.insets.vertical()).max(1);

    let top = if adjacency.show_sender_label {
        style.sender_label_height
    } else {
        0
    };
    let bottom = if adjacency.timestamp_anchor {
        style.timestamp_label_height
    } else {
        0
    };

    let avatar = avatar_size(kind, context);
    let show_avatar = adjacency.show_avatar && frame.avatar_column > 0;
    let avatar_height = if show_avatar { avatar.height } else { 0 };
    let row_height = bubble_height.max(avatar_height);

    let bubble_x = match kind {
        ItemKind::OutgoingMessage => container
            .saturating_sub(margin)
            .saturating_sub(frame.avatar_column)
            .saturating_sub(bubble_width),
        ItemKind::IncomingMessage | ItemKind::TypingIndicator => {
            margin.saturating_add(frame.avatar_column)
        }
    };
    let bubble_y = top.saturating_add(row_height - bubble_height);

    let avatar_frame = show_avatar.then(|| {
        let x = match kind {
            ItemKind::OutgoingMessage => container.saturating_sub(margin).saturating_sub(avatar.width),
            _ => margin,
        };
        Rect::new(
            x,
            top.saturating_add(row_height - avatar.height),
            avatar.width,
            avatar.height,
        )
    });

    ItemAttributes {
        kind,
        size: Size::new(
            container,
            top.saturating_add(row_height).saturating_add(bottom),
        ),
        bubble_frame: Rect::new(bubble_x, bubble_y, bubble_width, bubble_height),
        content_insets: frame.insets,
        avatar_frame,
        top_label_height: top,
        bottom_label_height: bottom,
        z_index: 0,
    }
}

/// Sits where an incoming bubble would, sharing its avatar column.
fn typing_indicator(context: &LayoutContext) -> ItemAttributes {
    let requested = context.style().typing_indicator_size;
    let incoming = BubbleFrame::new(ItemKind::IncomingMessage, context, Insets::ZERO);
    let width = requested.width.clamp(incoming.min_width, incoming.max_width);
    let height = requested.height.max(1);
    let x = incoming.margin.saturating_add(incoming.avatar_column);

    ItemAttributes {
        kind: ItemKind::TypingIndicator,
        size: Size::new(context.container_width(), height),
        bubble_frame: Rect::new(x, 0, width, height),
        content_insets: Insets::ZERO,
        avatar_frame: None,
        top_label_height: 0,
        bottom_label_height: 0,
        z_index: 1,
    }
}
