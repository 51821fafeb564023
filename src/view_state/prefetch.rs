//! Background measurement ahead of the render pass.
//!
//! A [`PrefetchJob`] is a snapshot: owned copies of the messages, their
//! adjacency facts and fingerprints, the context and the cache epoch. It can
//! run on any thread. Results are merged into the shared cache in one batch,
//! and only while the cache is still in the epoch the snapshot was taken
//! in; a context change in the meantime discards them.
//!
//! Cancellation is cooperative: the token is checked between items, so an
//! item already being measured finishes and whatever was computed so far is
//! still merged.

use super::attributes::{layout_item_or_placeholder, Adjacency, Item, ItemAttributes, ItemKind};
use super::cache::LayoutCache;
use super::context::LayoutContext;
use super::fingerprint::Fingerprint;
use super::measure::Measure;
use crate::model::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Shared flag used to stop a running prefetch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One item captured for background measurement.
#[derive(Debug, Clone)]
pub struct PrefetchItem {
    fingerprint: Fingerprint,
    message: Option<Message>,
    kind: ItemKind,
    adjacency: Adjacency,
}

impl PrefetchItem {
    pub(crate) fn new(
        fingerprint: Fingerprint,
        message: Option<Message>,
        kind: ItemKind,
        adjacency: Adjacency,
    ) -> Self {
        Self {
            fingerprint,
            message,
            kind,
            adjacency,
        }
    }

    fn item(&self) -> Item<'_> {
        match (&self.message, self.kind) {
            (Some(message), ItemKind::OutgoingMessage) => Item::Outgoing(message),
            (Some(message), ItemKind::IncomingMessage) => Item::Incoming(message),
            _ => Item::TypingIndicator,
        }
    }
}

/// What a finished job did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchOutcome {
    /// Items measured.
    pub computed: usize,
    /// Whether the results reached the cache.
    pub merged: bool,
    /// Whether the job stopped early.
    pub cancelled: bool,
}

/// Snapshot of items to measure off the render path.
#[derive(Debug, Clone)]
pub struct PrefetchJob {
    items: Vec<PrefetchItem>,
    context: LayoutContext,
    cache: LayoutCache,
    epoch: u64,
}

impl PrefetchJob {
    pub(crate) fn new(items: Vec<PrefetchItem>, context: LayoutContext, cache: LayoutCache) -> Self {
        let epoch = cache.epoch();
        Self {
            items,
            context,
            cache,
            epoch,
        }
    }

    /// Number of items to measure.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there is nothing to measure.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Measure every item and merge the results into the cache.
    pub fn run<M: Measure + ?Sized>(&self, measurer: &M, token: &CancellationToken) -> PrefetchOutcome {
        let mut batch: Vec<(Fingerprint, ItemAttributes)> = Vec::with_capacity(self.items.len());
        let mut cancelled = false;

        for item in &self.items {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
            let attributes =
                layout_item_or_placeholder(measurer, item.item(), &self.context, item.adjacency);
            batch.push((item.fingerprint, attributes));
        }

        let computed = batch.len();
        let merged = self.cache.merge(self.epoch, batch);
        debug!(computed, merged, cancelled, "Prefetch finished");

        PrefetchOutcome {
            computed,
            merged,
            cancelled,
        }
    }
}

/// Handle to a prefetch running on a background thread.
#[derive(Debug)]
pub struct PrefetchHandle {
    token: CancellationToken,
    thread: JoinHandle<PrefetchOutcome>,
}

impl PrefetchHandle {
    /// Ask the job to stop after the item it is measuring.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job. `None` if the thread panicked.
    pub fn join(self) -> Option<PrefetchOutcome> {
        self.thread.join().ok()
    }
}

/// Run `job` on a new thread.
///
/// # Errors
/// Returns the OS error if the thread could not be spawned.
pub fn spawn_prefetch<M>(job: PrefetchJob, measurer: M) -> std::io::Result<PrefetchHandle>
where
    M: Measure + Send + 'static,
{
    let token = CancellationToken::default();
    let worker_token = token.clone();
    let thread = thread::Builder::new()
        .name("layout-prefetch".to_string())
        .spawn(move || job.run(&measurer, &worker_token))?;
    Ok(PrefetchHandle { token, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayoutError, MessageContent, MessageId, SenderId};
    use crate::view_state::context::{LayoutStyle, TextStyle};
    use crate::view_state::engine::LayoutEngine;
    use crate::view_state::measure::CellMeasurer;
    use crate::view_state::cache::CacheConfig;
    use crate::view_state::types::Size;

    fn messages(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                Message::text(
                    MessageId::new(format!("m{i}")).unwrap(),
                    SenderId::new("alice").unwrap(),
                    format!("prefetched message {i}"),
                    "2025-12-25T10:30:00Z".parse().unwrap(),
                )
            })
            .collect()
    }

    fn engine() -> LayoutEngine<CellMeasurer> {
        LayoutEngine::new(
            CellMeasurer,
            SenderId::new("me").unwrap(),
            LayoutContext::new(80, LayoutStyle::default()).unwrap(),
            CacheConfig::default(),
        )
    }

    /// Measurer that cancels its token after the first call.
    struct CancelAfterFirst(CancellationToken);

    impl Measure for CancelAfterFirst {
        fn measure(
            &self,
            content: &MessageContent,
            max_width: u16,
            text: &TextStyle,
        ) -> Result<Size, LayoutError> {
            self.0.cancel();
            CellMeasurer.measure(content, max_width, text)
        }
    }

    #[test]
    fn token_starts_uncancelled() {
        let token = CancellationToken::default();
        assert!(!token.is_cancelled());
        token.clone().cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn run_populates_cache() {
        let source = messages(5);
        let mut engine = engine();
        engine.reload_data(source.len());

        let job = engine.prefetch_job(&source, 0..5);
        let outcome = job.run(&CellMeasurer, &CancellationToken::default());

        assert_eq!(
            outcome,
            PrefetchOutcome {
                computed: 5,
                merged: true,
                cancelled: false
            }
        );
        assert_eq!(engine.cache().len(), 5);
    }

    #[test]
    fn prefetched_attributes_match_direct_computation() {
        let source = messages(3);
        let mut engine = engine();
        engine.reload_data(source.len());
        engine.prefetch_job(&source, 0..3).run(&CellMeasurer, &CancellationToken::default());

        let prefetched: Vec<_> = (0..3).map(|i| engine.attributes_for(&source, i)).collect();
        engine.cache().invalidate_all();
        let direct: Vec<_> = (0..3).map(|i| engine.attributes_for(&source, i)).collect();

        assert_eq!(prefetched, direct);
    }

    #[test]
    fn cancelled_before_start_computes_nothing() {
        let source = messages(5);
        let mut engine = engine();
        engine.reload_data(source.len());

        let token = CancellationToken::default();
        token.cancel();
        let outcome = engine.prefetch_job(&source, 0..5).run(&CellMeasurer, &token);

        assert!(outcome.cancelled);
        assert_eq!(outcome.computed, 0);
    }

    #[test]
    fn cancellation_lets_current_item_finish() {
        let source = messages(5);
        let mut engine = engine();
        engine.reload_data(source.len());

        let token = CancellationToken::default();
        let outcome = engine
            .prefetch_job(&source, 0..5)
            .run(&CancelAfterFirst(token.clone()), &token);

        assert!(outcome.cancelled);
        assert_eq!(outcome.computed, 1);
        assert!(outcome.merged);
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn context_change_discards_results() {
        let source = messages(5);
        let mut engine = engine();
        engine.reload_data(source.len());

        let job = engine.prefetch_job(&source, 0..5);
        engine.on_container_resized(40).unwrap();
        let outcome = job.run(&CellMeasurer, &CancellationToken::default());

        assert!(!outcome.merged);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn spawned_job_reports_outcome() {
        let source = messages(8);
        let mut engine = engine();
        engine.reload_data(source.len());

        let handle = spawn_prefetch(engine.prefetch_job(&source, 0..8), CellMeasurer).unwrap();
        let outcome = handle.join().expect("prefetch thread");

        assert_eq!(outcome.computed, 8);
        assert!(!outcome.cancelled);
        assert_eq!(engine.cache().len(), 8);
    }
}
