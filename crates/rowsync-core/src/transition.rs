use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Anchor, VisibleEdge};

/// Scroll behaviour resolved to view coordinates for one transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScrollIntent {
    #[default]
    None,
    /// Keep the rows at this edge of the viewport where they are.
    PreserveVisible(VisibleEdge),
    /// Scroll the row at `position` (new-sequence coordinates) into view.
    Reveal { position: usize, anchor: Anchor },
}

/// Row-level edit script turning one rendered sequence into the next.
///
/// Positions are sorted ascending in every set. Views remove `deleted`
/// back-to-front, then insert `inserted` front-to-back, then replace `updated`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition<T> {
    /// Positions in the old sequence to remove.
    pub deleted: Vec<usize>,
    /// Rows to insert, positioned in the new sequence.
    pub inserted: Vec<(usize, T)>,
    /// Retained rows whose content changed, positioned in the new sequence.
    pub updated: Vec<(usize, T)>,
    /// Length of the sequence `deleted` refers to.
    pub old_len: usize,
    /// Length of the sequence `inserted` and `updated` refer to.
    pub new_len: usize,
    pub animated: bool,
    pub scroll: ScrollIntent,
}

impl<T> Transition<T> {
    /// Transition that changes nothing on a sequence of `len` rows.
    pub fn empty(len: usize) -> Self {
        Self {
            deleted: Vec::new(),
            inserted: Vec::new(),
            updated: Vec::new(),
            old_len: len,
            new_len: len,
            animated: false,
            scroll: ScrollIntent::None,
        }
    }

    /// `true` when no rows are deleted, inserted or updated.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty() && self.updated.is_empty()
    }

    pub fn with_animation(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollIntent) -> Self {
        self.scroll = scroll;
        self
    }

    /// Convert carried content into view rows, keeping every position.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Transition<U> {
        Transition {
            deleted: self.deleted,
            inserted: self
                .inserted
                .into_iter()
                .map(|(position, item)| (position, f(item)))
                .collect(),
            updated: self
                .updated
                .into_iter()
                .map(|(position, item)| (position, f(item)))
                .collect(),
            old_len: self.old_len,
            new_len: self.new_len,
            animated: self.animated,
            scroll: self.scroll,
        }
    }

    /// Remap into the coordinates of a view that renders index 0 last.
    ///
    /// Deletions mirror against `old_len`, insertions, updates and reveal
    /// targets against `new_len`. Every set stays ascending. Inverting twice
    /// yields the original transition.
    pub fn inverted(self) -> Self {
        let old_len = self.old_len;
        let new_len = self.new_len;
        let mirror_new = |position: usize| mirror(new_len, position);

        Self {
            deleted: self
                .deleted
                .into_iter()
                .rev()
                .map(|position| mirror(old_len, position))
                .collect(),
            inserted: self
                .inserted
                .into_iter()
                .rev()
                .map(|(position, item)| (mirror_new(position), item))
                .collect(),
            updated: self
                .updated
                .into_iter()
                .rev()
                .map(|(position, item)| (mirror_new(position), item))
                .collect(),
            old_len,
            new_len,
            animated: self.animated,
            scroll: match self.scroll {
                ScrollIntent::None => ScrollIntent::None,
                ScrollIntent::PreserveVisible(edge) => ScrollIntent::PreserveVisible(edge.flipped()),
                ScrollIntent::Reveal { position, anchor } => ScrollIntent::Reveal {
                    position: mirror_new(position),
                    anchor,
                },
            },
        }
    }

    /// Apply the screen's coordinate convention: inverted when `reverse` is set.
    pub fn oriented(self, reverse: bool) -> Self {
        if reverse { self.inverted() } else { self }
    }
}

fn mirror(len: usize, position: usize) -> usize {
    debug_assert!(
        position < len,
        "position {position} outside sequence of length {len}"
    );
    len.saturating_sub(1).saturating_sub(position)
}

impl<T> fmt::Display for Transition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted: {}, updated: {}, deleted: {}, animated: {}",
            self.inserted.len(),
            self.updated.len(),
            self.deleted.len(),
            self.animated
        )
    }
}
