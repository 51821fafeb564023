//! Where the message list is scrolled to, expressed as intent.

use super::types::LineOffset;

/// Scroll position kept by the conversation view.
///
/// Stored as intent rather than a raw offset so a resize or a late
/// measurement re-resolves it against the new content height. `Bottom` is
/// what the scroll anchor parks on while it is tracking new messages;
/// `AtItem` holds the user's place once they scroll away.
///
/// Every variant resolves into `[0, content_height - viewport_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollPosition {
    /// First line of the first message.
    Top,

    /// Last line of the newest item in the bottom row of the viewport.
    #[default]
    Bottom,

    /// Absolute line offset.
    AtLine(LineOffset),

    /// A line inside an item, pinned to the viewport top.
    AtItem {
        /// Index of the item.
        index: usize,
        /// Line offset within the item (0 = top of item).
        line_in_item: usize,
    },
}

impl ScrollPosition {
    /// Line offset for this position. `item_lookup` maps an item index to
    /// its top edge; an unknown item resolves to the top.
    pub fn resolve<F>(&self, total_height: usize, viewport_height: usize, item_lookup: F) -> LineOffset
    where
        F: Fn(usize) -> Option<LineOffset>,
    {
        let max_offset = total_height.saturating_sub(viewport_height);

        let raw = match self {
            Self::Top => 0,
            Self::Bottom => max_offset,
            Self::AtLine(offset) => offset.get(),
            Self::AtItem {
                index,
                line_in_item,
            } => item_lookup(*index)
                .map(|top| top.get().saturating_add(*line_in_item))
                .unwrap_or(0),
        };

        LineOffset::new(raw.min(max_offset))
    }

    /// Line `offset` counted from the top.
    pub fn at_line(offset: usize) -> Self {
        Self::AtLine(LineOffset::new(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_bottom() {
        assert_eq!(ScrollPosition::default(), ScrollPosition::Bottom);
    }

    #[test]
    fn at_line_constructor_wraps_offset() {
        assert_eq!(
            ScrollPosition::at_line(42),
            ScrollPosition::AtLine(LineOffset::new(42))
        );
    }

    mod resolve {
        use super::*;

        fn no_items(_idx: usize) -> Option<LineOffset> {
            None
        }

        fn mock_lookup(idx: usize) -> Option<LineOffset> {
            match idx {
                0 => Some(LineOffset::new(0)),
                1 => Some(LineOffset::new(10)),
                2 => Some(LineOffset::new(25)),
                _ => None,
            }
        }

        #[test]
        fn top_resolves_to_zero() {
            assert_eq!(ScrollPosition::Top.resolve(100, 20, no_items).get(), 0);
        }

        #[test]
        fn bottom_resolves_to_max_offset() {
            assert_eq!(ScrollPosition::Bottom.resolve(100, 20, no_items).get(), 80);
        }

        #[test]
        fn bottom_clamps_to_zero_when_viewport_exceeds_content() {
            assert_eq!(ScrollPosition::Bottom.resolve(10, 50, no_items).get(), 0);
        }

        #[test]
        fn at_line_returns_exact_offset_when_in_range() {
            let pos = ScrollPosition::at_line(30);
            assert_eq!(pos.resolve(100, 20, no_items).get(), 30);
        }

        #[test]
        fn at_line_clamps_to_max_offset_when_beyond_range() {
            let pos = ScrollPosition::at_line(95);
            assert_eq!(pos.resolve(100, 20, no_items).get(), 80);
        }

        #[test]
        fn at_item_uses_lookup() {
            let pos = ScrollPosition::AtItem {
                index: 1,
                line_in_item: 0,
            };
            assert_eq!(pos.resolve(100, 20, mock_lookup).get(), 10);
        }

        #[test]
        fn at_item_adds_line_in_item_offset() {
            let pos = ScrollPosition::AtItem {
                index: 2,
                line_in_item: 5,
            };
            assert_eq!(pos.resolve(100, 20, mock_lookup).get(), 30);
        }

        #[test]
        fn at_item_returns_zero_when_item_not_found() {
            let pos = ScrollPosition::AtItem {
                index: 999,
                line_in_item: 0,
            };
            assert_eq!(pos.resolve(100, 20, mock_lookup).get(), 0);
        }

        #[test]
        fn at_item_clamps_computed_offset_to_max() {
            let pos = ScrollPosition::AtItem {
                index: 2,
                line_in_item: 70,
            };
            assert_eq!(pos.resolve(100, 20, mock_lookup).get(), 80);
        }

        #[test]
        fn empty_document_all_positions_resolve_to_zero() {
            let positions = vec![
                ScrollPosition::Top,
                ScrollPosition::Bottom,
                ScrollPosition::at_line(100),
                ScrollPosition::AtItem {
                    index: 5,
                    line_in_item: 0,
                },
            ];

            for pos in positions {
                let result = pos.resolve(0, 10, no_items);
                assert_eq!(result.get(), 0, "position {:?} should resolve to 0", pos);
            }
        }
    }
}
