//! Layout fingerprints: cache keys for item geometry.

use super::attributes::{Adjacency, Item, ItemKind};
use super::context::LayoutContext;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Digest of everything that affects one item's geometry.
///
/// Equal fingerprints imply identical attributes. The kind is kept outside
/// the digest so a typing indicator can never collide with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: ItemKind,
    hash: u64,
}

impl Fingerprint {
    /// Fingerprint `item` with its resolved adjacency under `context`.
    pub fn of(item: Item<'_>, adjacency: Adjacency, context: &LayoutContext) -> Self {
        let mut hasher = DefaultHasher::new();
        context.params_key().hash(&mut hasher);
        adjacency.hash(&mut hasher);

        if let Some(message) = item.message() {
            message.id().hash(&mut hasher);
            message.sender().hash(&mut hasher);
            message.content().hash(&mut hasher);
            message.show_display_name().hash(&mut hasher);
        }

        Self {
            kind: item.kind(),
            hash: hasher.finish(),
        }
    }

    /// Item kind the fingerprint was taken from.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }
}
