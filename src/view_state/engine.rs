//! The layout engine.
//!
//! Resolves item geometry on demand: for an index it builds the item's
//! fingerprint from the current context and its two logical neighbors,
//! answers from the [`LayoutCache`] when it can and computes otherwise.
//!
//! The engine does not own messages. The host owns a [`MessageDataSource`]
//! and reports every mutation through [`LayoutEngine::data_set_mutated`]
//! before the next query. Per index the engine remembers the fingerprint it
//! last resolved and the item height, which back surgical invalidation and
//! the [`HeightIndex`] used for scroll math.
//!
//! # Invalidation
//!
//! | Trigger | Scope |
//! |---------|-------|
//! | `Inserted` / `Removed` / `Replaced` at `i` | fingerprints at `i-1`, `i`, `i+1` |
//! | typing indicator toggled | last real item |
//! | context change | whole cache (lazy, new epoch) |

use super::attributes::{layout_item_or_placeholder, Adjacency, Item, ItemAttributes};
use super::cache::{CacheConfig, CacheStats, LayoutCache};
use super::context::{ContextGeneration, LayoutContext, LayoutStyle};
use super::fingerprint::Fingerprint;
use super::height_index::HeightIndex;
use super::measure::Measure;
use super::prefetch::{PrefetchItem, PrefetchJob};
use crate::model::{LayoutError, Message, SenderId};
use std::ops::Range;
use tracing::{debug, info};

/// Read access to the ordered message list the host owns.
pub trait MessageDataSource {
    /// Number of messages.
    fn message_count(&self) -> usize;

    /// Message at `index`, `None` when out of range.
    fn message_at(&self, index: usize) -> Option<&Message>;
}

impl MessageDataSource for [Message] {
    fn message_count(&self) -> usize {
        self.len()
    }

    fn message_at(&self, index: usize) -> Option<&Message> {
        self.get(index)
    }
}

impl MessageDataSource for Vec<Message> {
    fn message_count(&self) -> usize {
        self.len()
    }

    fn message_at(&self, index: usize) -> Option<&Message> {
        self.get(index)
    }
}

/// A single committed mutation of the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A message was inserted at this index.
    Inserted(usize),
    /// The message at this index was removed.
    Removed(usize),
    /// The message at this index was replaced in place.
    Replaced(usize),
}

/// Engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Shared cache counters.
    pub cache: CacheStats,
    /// Items including the typing indicator.
    pub item_count: usize,
    /// Items whose height comes from real attributes rather than an estimate.
    pub measured_items: usize,
    /// Active context generation.
    pub generation: ContextGeneration,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    fingerprint: Option<Fingerprint>,
    measured: bool,
}

/// Lookup-or-compute layout over a host-owned data source.
#[derive(Debug)]
pub struct LayoutEngine<M> {
    measurer: M,
    local_sender: SenderId,
    context: LayoutContext,
    cache: LayoutCache,
    cache_config: CacheConfig,
    message_count: usize,
    typing_visible: bool,
    slots: Vec<Slot>,
    heights: HeightIndex,
    visible: Range<usize>,
}

impl<M: Measure> LayoutEngine<M> {
    /// Create an engine with an empty data set.
    pub fn new(
        measurer: M,
        local_sender: SenderId,
        context: LayoutContext,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            measurer,
            local_sender,
            context: context.at_generation(ContextGeneration::default()),
            cache: LayoutCache::from_config(&cache_config),
            cache_config,
            message_count: 0,
            typing_visible: false,
            slots: Vec::new(),
            heights: HeightIndex::new(64),
            visible: 0..0,
        }
    }

    /// Active context.
    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    /// Sender whose messages are laid out as outgoing.
    pub fn local_sender(&self) -> &SenderId {
        &self.local_sender
    }

    /// Shared cache handle.
    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Measurement primitive.
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Number of items, typing indicator included.
    pub fn item_count(&self) -> usize {
        self.message_count + usize::from(self.typing_visible)
    }

    /// Number of real messages the engine knows about.
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Whether the typing indicator occupies the trailing slot.
    pub fn is_typing_indicator_visible(&self) -> bool {
        self.typing_visible
    }

    /// Last range reported through [`visible_range_changed`](Self::visible_range_changed).
    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    /// Attributes of the item at `index`, `None` for a stale index.
    pub fn attributes_for<S: MessageDataSource + ?Sized>(
        &mut self,
        source: &S,
        index: usize,
    ) -> Option<ItemAttributes> {
        match self.try_attributes_for(source, index) {
            Ok(attributes) => Some(attributes),
            Err(err) => {
                debug!(index, error = %err, "Layout query for stale index");
                None
            }
        }
    }

    /// Like [`attributes_for`](Self::attributes_for), reporting why nothing
    /// was returned.
    ///
    /// # Errors
    /// `LayoutError::StaleIndex` when `index` is past the last item or the
    /// source no longer has a message there.
    pub fn try_attributes_for<S: MessageDataSource + ?Sized>(
        &mut self,
        source: &S,
        index: usize,
    ) -> Result<ItemAttributes, LayoutError> {
        let stale = LayoutError::StaleIndex {
            index,
            count: self.item_count(),
        };
        let item = self.item_at(source, index).ok_or(stale)?;
        let adjacency = self.adjacency(source, index, item);
        let fingerprint = Fingerprint::of(item, adjacency, &self.context);

        let attributes = match self.cache.get(&fingerprint) {
            Some(attributes) => attributes,
            None => {
                debug!(index, kind = ?item.kind(), "Layout cache miss");
                let attributes =
                    layout_item_or_placeholder(&self.measurer, item, &self.context, adjacency);
                self.cache.put(fingerprint, attributes);
                attributes
            }
        };

        self.record(index, fingerprint, attributes.height());
        Ok(attributes)
    }

    /// Resolve every item in `range`, skipping stale indices.
    pub fn resolve_range<S: MessageDataSource + ?Sized>(
        &mut self,
        source: &S,
        range: Range<usize>,
    ) -> Vec<(usize, ItemAttributes)> {
        let end = range.end.min(self.item_count());
        (range.start..end)
            .filter_map(|index| {
                self.attributes_for(source, index)
                    .map(|attributes| (index, attributes))
            })
            .collect()
    }

    /// The host's visible window moved. Resizes the cache to cover it.
    pub fn visible_range_changed(&mut self, range: Range<usize>) {
        let capacity = self.cache_config.capacity_for(range.len());
        self.cache.resize(capacity);
        self.visible = range;
    }

    /// Apply one committed mutation.
    ///
    /// # Errors
    /// `LayoutError::StaleIndex` when the index does not fit the engine's
    /// message count; nothing is changed in that case.
    pub fn data_set_mutated(&mut self, change: Change) -> Result<(), LayoutError> {
        let count = self.message_count;
        let stale = move |index| LayoutError::StaleIndex { index, count };
        debug!(?change, "Data set mutated");

        match change {
            Change::Inserted(at) => {
                if at > self.message_count {
                    return Err(stale(at));
                }
                if let Some(previous) = at.checked_sub(1) {
                    self.invalidate_slot(previous);
                }
                self.invalidate_slot(at);
                let estimate = self.estimated_height();
                self.slots.insert(at, Slot::default());
                self.heights.insert(at, estimate);
                self.message_count += 1;
            }
            Change::Removed(at) => {
                if at >= self.message_count {
                    return Err(stale(at));
                }
                if let Some(previous) = at.checked_sub(1) {
                    self.invalidate_slot(previous);
                }
                self.invalidate_slot(at);
                self.invalidate_slot(at + 1);
                self.slots.remove(at);
                self.heights.remove(at);
                self.message_count -= 1;
            }
            Change::Replaced(at) => {
                if at >= self.message_count {
                    return Err(stale(at));
                }
                if let Some(previous) = at.checked_sub(1) {
                    self.invalidate_slot(previous);
                }
                self.invalidate_slot(at);
                self.invalidate_slot(at + 1);
            }
        }
        Ok(())
    }

    /// Apply an ordered batch of mutations, stopping at the first bad one.
    ///
    /// # Errors
    /// The first `LayoutError::StaleIndex` encountered.
    pub fn apply_changes(
        &mut self,
        changes: impl IntoIterator<Item = Change>,
    ) -> Result<(), LayoutError> {
        changes
            .into_iter()
            .try_for_each(|change| self.data_set_mutated(change))
    }

    /// Forget per-index state and adopt a data set of `message_count`
    /// messages. Cached attributes stay valid: they are keyed by content.
    pub fn reload_data(&mut self, message_count: usize) {
        debug!(message_count, "Reloading data");
        self.message_count = message_count;
        let items = self.item_count();
        self.slots = vec![Slot::default(); items];
        let estimate = self.estimated_height();
        self.heights = HeightIndex::from_heights(std::iter::repeat(estimate).take(items));
    }

    /// Install a new context and invalidate the whole cache.
    ///
    /// Heights resolved under the old context remain as estimates until the
    /// items are queried again.
    pub fn context_changed(&mut self, context: LayoutContext) {
        if context.params_key() == self.context.params_key() {
            return;
        }
        let generation = self.context.generation().next();
        info!(
            generation = generation.get(),
            width = context.container_width(),
            "Layout context changed"
        );
        self.context = context.at_generation(generation);
        self.cache.invalidate_all();
        for slot in &mut self.slots {
            *slot = Slot::default();
        }
    }

    /// Host hook for a container width change.
    ///
    /// # Errors
    /// `LayoutError::ContextInvalid` for a zero width; the previous context
    /// stays active.
    pub fn on_container_resized(&mut self, width: u16) -> Result<(), LayoutError> {
        let context = self.context.with_width(width)?;
        self.context_changed(context);
        Ok(())
    }

    /// Host hook for a style change.
    ///
    /// # Errors
    /// `LayoutError::ContextInvalid` for an invalid style; the previous
    /// context stays active.
    pub fn on_style_changed(&mut self, style: LayoutStyle) -> Result<(), LayoutError> {
        let context = self.context.with_style(style)?;
        self.context_changed(context);
        Ok(())
    }

    /// Show or hide the trailing typing indicator.
    pub fn set_typing_indicator_visible(&mut self, visible: bool) {
        if visible == self.typing_visible {
            return;
        }
        debug!(visible, "Typing indicator toggled");

        if let Some(last) = self.message_count.checked_sub(1) {
            self.invalidate_slot(last);
        }
        if visible {
            let estimate = self.estimated_height();
            self.slots.push(Slot::default());
            self.heights.push(estimate);
        } else {
            self.invalidate_slot(self.message_count);
            self.slots.truncate(self.message_count);
            self.heights.truncate(self.message_count);
        }
        self.typing_visible = visible;
    }

    /// Total height of all items, estimates included.
    pub fn content_height(&self) -> usize {
        self.heights.total()
    }

    /// Vertical offset of the top of `index`.
    pub fn item_offset(&self, index: usize) -> usize {
        self.heights.offset_of(index)
    }

    /// Index of the item covering vertical offset `y`.
    pub fn index_at_offset(&self, y: usize) -> Option<usize> {
        self.heights.lower_bound(y)
    }

    /// Indices of items intersecting `[offset, offset + height)`.
    pub fn visible_range_for(&self, offset: usize, height: usize) -> Range<usize> {
        let count = self.item_count();
        let start = self.heights.lower_bound(offset).unwrap_or(count);
        if height == 0 {
            return start..start;
        }
        let last = offset.saturating_add(height - 1);
        let end = self
            .heights
            .lower_bound(last)
            .map_or(count, |index| index + 1);
        start..end.max(start)
    }

    /// Snapshot `range` for background measurement.
    ///
    /// Items whose attributes are already cached are left out.
    pub fn prefetch_job<S: MessageDataSource + ?Sized>(
        &self,
        source: &S,
        range: Range<usize>,
    ) -> PrefetchJob {
        let end = range.end.min(self.item_count());
        let items = (range.start..end)
            .filter_map(|index| {
                let item = self.item_at(source, index)?;
                let adjacency = self.adjacency(source, index, item);
                let fingerprint = Fingerprint::of(item, adjacency, &self.context);
                if self.cache.peek(&fingerprint).is_some() {
                    return None;
                }
                Some(PrefetchItem::new(
                    fingerprint,
                    item.message().cloned(),
                    item.kind(),
                    adjacency,
                ))
            })
            .collect();

        PrefetchJob::new(items, self.context.clone(), self.cache.clone())
    }

    /// Record heights for indices in `range` whose attributes a prefetch
    /// already placed in the cache. Returns how many were adopted.
    pub fn adopt_prefetched<S: MessageDataSource + ?Sized>(
        &mut self,
        source: &S,
        range: Range<usize>,
    ) -> usize {
        let end = range.end.min(self.item_count());
        let mut adopted = 0;
        for index in range.start..end {
            let Some(item) = self.item_at(source, index) else {
                continue;
            };
            let adjacency = self.adjacency(source, index, item);
            let fingerprint = Fingerprint::of(item, adjacency, &self.context);
            if let Some(attributes) = self.cache.peek(&fingerprint) {
                self.record(index, fingerprint, attributes.height());
                adopted += 1;
            }
        }
        adopted
    }

    /// Counters.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache: self.cache.stats(),
            item_count: self.item_count(),
            measured_items: self.slots.iter().filter(|slot| slot.measured).count(),
            generation: self.context.generation(),
        }
    }

    fn item_at<'s, S: MessageDataSource + ?Sized>(
        &self,
        source: &'s S,
        index: usize,
    ) -> Option<Item<'s>> {
        if index < self.message_count {
            source
                .message_at(index)
                .map(|message| Item::classify(message, &self.local_sender))
        } else if index == self.message_count && self.typing_visible {
            Some(Item::TypingIndicator)
        } else {
            None
        }
    }

    fn adjacency<S: MessageDataSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
        item: Item<'_>,
    ) -> Adjacency {
        let before = index
            .checked_sub(1)
            .and_then(|previous| self.item_at(source, previous));
        let after = self.item_at(source, index + 1);
        Adjacency::resolve(item, &self.context, before, after)
    }

    fn record(&mut self, index: usize, fingerprint: Fingerprint, height: u16) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.fingerprint = Some(fingerprint);
            slot.measured = true;
            self.heights.set(index, height);
        }
    }

    fn invalidate_slot(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            if let Some(fingerprint) = slot.fingerprint.take() {
                self.cache.invalidate(&fingerprint);
            }
            slot.measured = false;
        }
    }

    fn estimated_height(&self) -> u16 {
        self.context
            .style()
            .bubble
            .text_insets
            .vertical()
            .saturating_add(1)
    }
}
