//! View-state layer - Layout, sizing, caching and scrolling
//!
//! This module implements the layout engine for chat-style message lists:
//! per-item geometry, its cache, invalidation on data and context changes,
//! and the scroll anchor that keeps the newest message in view.
//!
//! # Module Structure
//!
//! - `types`: Geometry primitives (Size, Rect, Insets, LineOffset)
//! - `context`: LayoutContext / LayoutStyle - global layout parameters
//! - `measure`: Measure trait and the terminal CellMeasurer
//! - `attributes`: Item, ItemAttributes and the placement policy
//! - `fingerprint`: Fingerprint - cache key for item geometry
//! - `cache`: LayoutCache - shared LRU of computed attributes
//! - `height_index`: HeightIndex - O(log n) prefix sums via Fenwick tree
//! - `engine`: LayoutEngine - lookup-or-compute and invalidation
//! - `prefetch`: Background measurement with cooperative cancellation
//! - `anchor`: ScrollAnchor - auto-scroll to the newest item
//! - `scroll`: ScrollPosition - semantic scroll position enum
//! - `conversation`: ConversationView - messages + engine + anchor facade

pub mod anchor;
pub mod attributes;
pub mod cache;
pub mod context;
pub mod conversation;
pub mod engine;
pub mod fingerprint;
pub mod height_index;
pub mod measure;
pub mod prefetch;
pub mod scroll;
pub mod types;

pub use anchor::{AnchorState, ScrollAnchor, ScrollCommand, ScrollConfig, Viewport};
pub use attributes::{
    compute_attributes, compute_attributes_or_placeholder, Adjacency, Item, ItemAttributes,
    ItemKind,
};
pub use cache::{CacheConfig, CacheStats, LayoutCache};
pub use context::{LayoutContext, LayoutStyle};
pub use conversation::{ConversationView, VisibleItem};
pub use engine::{Change, EngineStats, LayoutEngine, MessageDataSource};
pub use fingerprint::Fingerprint;
pub use measure::{CellMeasurer, Measure};
pub use prefetch::{spawn_prefetch, CancellationToken, PrefetchHandle, PrefetchJob, PrefetchOutcome};
pub use scroll::ScrollPosition;
