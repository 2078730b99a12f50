use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite display-order key assigned by entry producers.
///
/// Ordering is lexicographic: section first, then the index within the section.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct OrderKey {
    /// Section the row belongs to.
    pub section: u32,
    /// Position of the row inside its section.
    pub index: u32,
}

impl OrderKey {
    pub const fn new(section: u32, index: u32) -> Self {
        Self { section, index }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.index)
    }
}

/// One logical row of a snapshot: identity, display order and comparable content.
///
/// The row kind lives inside `content`; identity and ordering never depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry<I, K, C> {
    /// Identity used to match the same row across snapshots.
    pub stable_id: I,
    /// Display-order key. Snapshots are diffed in arrival order, never re-sorted.
    pub order_key: K,
    /// Payload compared by value to detect in-place updates.
    pub content: C,
}

impl<I, K, C> Entry<I, K, C> {
    pub fn new(stable_id: I, order_key: K, content: C) -> Self {
        Self {
            stable_id,
            order_key,
            content,
        }
    }

    /// Wrap the content with the appearance it is rendered under.
    pub fn themed(self, appearance: Appearance) -> Entry<I, K, Themed<C>> {
        Entry {
            stable_id: self.stable_id,
            order_key: self.order_key,
            content: Themed {
                value: self.content,
                appearance,
            },
        }
    }
}

/// Opaque appearance generation (theme, font scale, ...) rows are rendered with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Appearance(pub u64);

/// Content paired with its appearance.
///
/// Changing the appearance makes every retained row compare unequal, so a
/// theme switch reconciles into updates for all rows instead of a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Themed<C> {
    pub value: C,
    pub appearance: Appearance,
}

/// Which edge of the viewport should stay pinned while a transition is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VisibleEdge {
    /// Edge nearest to sequence index 0.
    Leading,
    /// Edge nearest to the last sequence index.
    Trailing,
}

impl VisibleEdge {
    /// The same physical edge seen from the opposite index direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Leading => Self::Trailing,
            Self::Trailing => Self::Leading,
        }
    }
}

/// Where a revealed row should end up inside the viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Center,
    End,
}

/// Scroll behaviour requested by a producer, addressed by stable id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrollRequest<I> {
    /// Leave scrolling to the view.
    None,
    /// Keep the rows at one edge of the viewport visually stable.
    PreserveVisible(VisibleEdge),
    /// Scroll so that the row with this identity becomes visible.
    Reveal { stable_id: I, anchor: Anchor },
}

impl<I> Default for ScrollRequest<I> {
    fn default() -> Self {
        Self::None
    }
}

/// Entry sequence submitted to a screen pipeline for one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<I, K, C> {
    /// Entries in final display order.
    pub entries: Vec<Entry<I, K, C>>,
    /// Optional scroll request resolved against `entries`.
    pub scroll: ScrollRequest<I>,
}

impl<I, K, C> Snapshot<I, K, C> {
    pub fn new(entries: Vec<Entry<I, K, C>>) -> Self {
        Self {
            entries,
            scroll: ScrollRequest::None,
        }
    }

    pub fn with_scroll(mut self, scroll: ScrollRequest<I>) -> Self {
        self.scroll = scroll;
        self
    }
}

impl<I, K, C> From<Vec<Entry<I, K, C>>> for Snapshot<I, K, C> {
    fn from(entries: Vec<Entry<I, K, C>>) -> Self {
        Self::new(entries)
    }
}
