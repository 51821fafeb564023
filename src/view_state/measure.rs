//! Content measurement primitive.
//!
//! The layout engine is written against the [`Measure`] trait. The only
//! contract is referential transparency: the same content, width bound and
//! text style must always produce the same size. [`CellMeasurer`] is the
//! terminal implementation, built on `unicode-width` display widths.
//!
//! [`wrap_lines`] is THE canonical line breaking routine. The renderer uses
//! it too, so measured heights always match what is drawn.

use super::context::{TextStyle, WrapMode};
use super::types::Size;
use crate::model::{ContentProblem, LayoutError, MessageContent};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Deterministic sizing function for message content.
pub trait Measure {
    /// Bounding size of `content` when laid out at most `max_width` columns
    /// wide.
    ///
    /// # Errors
    /// `LayoutError::InvalidContent` when the content has nothing to measure.
    fn measure(
        &self,
        content: &MessageContent,
        max_width: u16,
        text: &TextStyle,
    ) -> Result<Size, LayoutError>;
}

impl<M: Measure + ?Sized> Measure for &M {
    fn measure(
        &self,
        content: &MessageContent,
        max_width: u16,
        text: &TextStyle,
    ) -> Result<Size, LayoutError> {
        (**self).measure(content, max_width, text)
    }
}

impl<M: Measure + ?Sized> Measure for std::sync::Arc<M> {
    fn measure(
        &self,
        content: &MessageContent,
        max_width: u16,
        text: &TextStyle,
    ) -> Result<Size, LayoutError> {
        (**self).measure(content, max_width, text)
    }
}

/// Terminal cell measurer.
///
/// - Text: hard-wrapped at `max_width` display columns, tabs expanded.
/// - Media: intrinsic size, scaled down proportionally to fit `max_width`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasurer;

impl Measure for CellMeasurer {
    fn measure(
        &self,
        content: &MessageContent,
        max_width: u16,
        text: &TextStyle,
    ) -> Result<Size, LayoutError> {
        let max_width = max_width.max(1);

        match content {
            MessageContent::Text(body) => {
                if body.is_empty() {
                    return Err(LayoutError::InvalidContent(ContentProblem::EmptyText));
                }
                let rows = wrap_lines(body, max_width, text);
                let width = rows.iter().map(|row| row.width()).max().unwrap_or(0);
                Ok(Size::new(saturate(width), saturate(rows.len())))
            }
            MessageContent::Media(media) => {
                let (width, height) = media
                    .dimensions()
                    .ok_or(LayoutError::InvalidContent(ContentProblem::UnsizedMedia(
                        media.kind(),
                    )))?;
                if width <= max_width {
                    return Ok(Size::new(width, height));
                }
                // Scale proportionally; never collapse below one row.
                let scaled = u32::from(height) * u32::from(max_width) / u32::from(width);
                Ok(Size::new(max_width, saturate(scaled as usize).max(1)))
            }
        }
    }
}

/// Break `text` into display rows no wider than `max_width` columns.
///
/// Every logical line yields at least one row (possibly empty). In
/// `NoWrap` mode each logical line is clipped instead of wrapped.
pub fn wrap_lines(text: &str, max_width: u16, style: &TextStyle) -> Vec<String> {
    let max_width = usize::from(max_width.max(1));
    let tab = " ".repeat(usize::from(style.tab_width));
    let mut rows = Vec::new();

    for line in text.lines() {
        let line = line.replace('\t', &tab);
        let mut row = String::new();
        let mut row_width = 0usize;

        for ch in line.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if row_width + ch_width > max_width && !row.is_empty() {
                if style.wrap == WrapMode::NoWrap {
                    break;
                }
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(ch);
            row_width += ch_width;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        // Text consisting only of a line terminator.
        rows.push(String::new());
    }
    rows
}

fn saturate(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
