use std::{
    collections::{HashMap, hash_map},
    fmt,
    hash::Hash,
};

use thiserror::Error;

use crate::types::Entry;

/// Producer contract violations detected in a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two entries share a stable id.
    #[error("stable id {id} appears at positions {first} and {second}")]
    DuplicateStableId {
        id: String,
        first: usize,
        second: usize,
    },
    /// An order key is not greater than the one before it.
    #[error("order key at position {position} does not follow its predecessor")]
    OrderKeyRegression { position: usize },
}

/// Check that a snapshot has unique stable ids and strictly increasing order keys.
///
/// Reports the first violation found, scanning front to back.
pub fn validate_snapshot<I, K, C>(entries: &[Entry<I, K, C>]) -> Result<(), SnapshotError>
where
    I: Hash + Eq + fmt::Debug,
    K: Ord,
{
    let mut seen: HashMap<&I, usize> = HashMap::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        if let hash_map::Entry::Occupied(first) = seen.entry(&entry.stable_id) {
            return Err(SnapshotError::DuplicateStableId {
                id: format!("{:?}", entry.stable_id),
                first: *first.get(),
                second: position,
            });
        }
        seen.insert(&entry.stable_id, position);

        if position > 0 && entries[position - 1].order_key >= entry.order_key {
            return Err(SnapshotError::OrderKeyRegression { position });
        }
    }
    Ok(())
}
