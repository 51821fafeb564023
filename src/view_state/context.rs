//! Global layout context and its generation counter.
//!
//! A [`LayoutContext`] bundles every parameter that affects item geometry
//! and is not a property of the item itself: the container width and the
//! [`LayoutStyle`]. Any change produces a new context with a bumped
//! [`ContextGeneration`], which invalidates the whole layout cache.

use super::types::{Insets, Size};
use crate::model::LayoutError;
use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Text wrapping mode used by the measurement primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Long lines wrap onto additional rows.
    #[default]
    Wrap,
    /// Long lines are clipped to the bubble width.
    NoWrap,
}

/// When an avatar is drawn next to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarPolicy {
    /// Only on the first message of a run from the same sender.
    #[default]
    FirstInRun,
    /// On every message.
    EveryMessage,
}

/// Avatar sizes per side. A zero size disables avatars on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvatarStyle {
    /// Avatar size next to incoming messages.
    pub incoming: Size,
    /// Avatar size next to outgoing messages.
    pub outgoing: Size,
}

impl Default for AvatarStyle {
    fn default() -> Self {
        Self {
            incoming: Size::new(3, 1),
            outgoing: Size::new(3, 1),
        }
    }
}

/// Bubble sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BubbleStyle {
    /// Narrowest bubble, insets included.
    pub min_width: u16,
    /// Widest bubble as a percentage of the container width (1..=100).
    pub max_width_percent: u8,
    /// Padding around text content (border included).
    pub text_insets: Insets,
    /// Padding around media content (border included).
    pub media_insets: Insets,
    /// Gap between the container edge and the avatar column or bubble.
    pub margin: u16,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            min_width: 5,
            max_width_percent: 75,
            text_insets: Insets::new(1, 2, 1, 2),
            media_insets: Insets::new(1, 1, 1, 1),
            margin: 1,
        }
    }
}

/// Which items carry a timestamp label below their bubble.
///
/// The exact rule is a deployment choice, so every part of it is
/// configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimestampPolicy {
    /// Label an item whose gap since the previous item is strictly greater
    /// than this many seconds.
    pub gap_threshold_secs: u64,
    /// Label the first item of the list.
    pub first_item: bool,
    /// Label the last real item while nothing (not even the typing
    /// indicator) follows it.
    pub last_item: bool,
}

impl TimestampPolicy {
    /// The gap threshold as a chrono delta.
    pub fn gap_threshold(&self) -> TimeDelta {
        let secs = i64::try_from(self.gap_threshold_secs).unwrap_or(i64::MAX);
        TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self {
            gap_threshold_secs: 15 * 60,
            first_item: true,
            last_item: false,
        }
    }
}

/// Text measurement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextStyle {
    /// Wrapping mode.
    pub wrap: WrapMode,
    /// Columns a tab expands to.
    pub tab_width: u8,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            wrap: WrapMode::Wrap,
            tab_width: 4,
        }
    }
}

/// Style parameters shared by every item.
///
/// Loaded from the `[layout]` config section; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutStyle {
    /// Avatar sizes.
    pub avatars: AvatarStyle,
    /// Avatar visibility rule.
    pub avatar_policy: AvatarPolicy,
    /// Bubble sizing.
    pub bubble: BubbleStyle,
    /// Height of the sender name label above incoming bubbles.
    pub sender_label_height: u16,
    /// Height of the timestamp label below anchor items.
    pub timestamp_label_height: u16,
    /// Bubble size of the typing indicator.
    pub typing_indicator_size: Size,
    /// Timestamp label rule.
    pub timestamps: TimestampPolicy,
    /// Text measurement.
    pub text: TextStyle,
    /// Content size substituted for content that cannot be measured.
    pub placeholder_size: Size,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            avatars: AvatarStyle::default(),
            avatar_policy: AvatarPolicy::default(),
            bubble: BubbleStyle::default(),
            sender_label_height: 1,
            timestamp_label_height: 1,
            typing_indicator_size: Size::new(7, 3),
            timestamps: TimestampPolicy::default(),
            text: TextStyle::default(),
            // Fits the widest unsized media label, `[location]`.
            placeholder_size: Size::new(10, 1),
        }
    }
}

/// Monotonic counter bumped on every context change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContextGeneration(u64);

impl ContextGeneration {
    /// Raw counter value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The following generation.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Validated layout parameters plus the generation they were installed at.
///
/// # Equality Semantics
/// `params_key` digests the container width and the full style, so two
/// contexts with equal keys produce identical layouts. The generation does
/// not take part in the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutContext {
    container_width: u16,
    style: LayoutStyle,
    generation: ContextGeneration,
    params_key: u64,
}

impl LayoutContext {
    /// Validate and build a context at generation 0.
    ///
    /// # Errors
    /// `LayoutError::ContextInvalid` for a zero container width or a
    /// max bubble width percentage outside `1..=100`.
    pub fn new(container_width: u16, style: LayoutStyle) -> Result<Self, LayoutError> {
        if container_width == 0 {
            return Err(LayoutError::ContextInvalid("container width must be positive"));
        }
        if !(1..=100).contains(&style.bubble.max_width_percent) {
            return Err(LayoutError::ContextInvalid(
                "max bubble width percent must be within 1..=100",
            ));
        }

        let mut hasher = DefaultHasher::new();
        container_width.hash(&mut hasher);
        style.hash(&mut hasher);

        Ok(Self {
            container_width,
            style,
            generation: ContextGeneration::default(),
            params_key: hasher.finish(),
        })
    }

    /// Same parameters with a different container width.
    pub fn with_width(&self, container_width: u16) -> Result<Self, LayoutError> {
        Self::new(container_width, self.style.clone())
    }

    /// Same container width with a different style.
    pub fn with_style(&self, style: LayoutStyle) -> Result<Self, LayoutError> {
        Self::new(self.container_width, style)
    }

    pub(crate) fn at_generation(mut self, generation: ContextGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Container width in columns.
    pub fn container_width(&self) -> u16 {
        self.container_width
    }

    /// Style parameters.
    pub fn style(&self) -> &LayoutStyle {
        &self.style
    }

    /// Generation this context was installed at.
    pub fn generation(&self) -> ContextGeneration {
        self.generation
    }

    /// Digest of width + style, used in fingerprints.
    pub fn params_key(&self) -> u64 {
        self.params_key
    }

    /// Widest bubble allowed by the percentage rule.
    pub fn max_bubble_width(&self) -> u16 {
        let scaled = u32::from(self.container_width) * u32::from(self.style.bubble.max_width_percent) / 100;
        u16::try_from(scaled).unwrap_or(u16::MAX)
    }
}
