//! Stable-identity list diffing.
//!
//! Rows are matched across snapshots by stable id. The longest run of matched
//! rows whose relative order is unchanged stays in place; among equally long
//! runs the one made of the earliest rows of the new snapshot wins. Every other
//! matched row is moved as a deletion plus an insertion.

use std::{
    collections::{HashMap, hash_map},
    fmt,
    hash::Hash,
};

use tracing::{trace, warn};

use crate::{transition::Transition, types::Entry};

/// Diff two snapshots into a transition in natural (front-to-back) coordinates.
///
/// Both snapshots must carry unique stable ids. A duplicate panics in debug
/// builds; release builds keep the first occurrence and treat later ones as
/// plain insertions or deletions.
pub fn reconcile<I, K, C>(old: &[Entry<I, K, C>], new: &[Entry<I, K, C>]) -> Transition<C>
where
    I: Hash + Eq + fmt::Debug,
    C: PartialEq + Clone,
{
    let mut old_positions: HashMap<&I, usize> = HashMap::with_capacity(old.len());
    for (position, entry) in old.iter().enumerate() {
        match old_positions.entry(&entry.stable_id) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(position);
            }
            hash_map::Entry::Occupied(first) => {
                duplicate_stable_id("old", &entry.stable_id, *first.get(), position)
            }
        }
    }

    // (new position, old position) for every row present in both snapshots.
    let mut matched: Vec<(usize, usize)> = Vec::with_capacity(new.len().min(old.len()));
    let mut new_positions: HashMap<&I, usize> = HashMap::with_capacity(new.len());
    for (new_position, entry) in new.iter().enumerate() {
        if let hash_map::Entry::Occupied(first) = new_positions.entry(&entry.stable_id) {
            duplicate_stable_id("new", &entry.stable_id, *first.get(), new_position);
            continue;
        }
        new_positions.insert(&entry.stable_id, new_position);

        if let Some(&old_position) = old_positions.get(&entry.stable_id) {
            matched.push((new_position, old_position));
        }
    }

    let old_order: Vec<usize> = matched.iter().map(|(_, old_position)| *old_position).collect();
    let kept = earliest_longest_increasing(&old_order);

    let mut retained_old = vec![false; old.len()];
    let mut retained_new = vec![false; new.len()];
    let mut updated = Vec::new();
    for (match_index, &(new_position, old_position)) in matched.iter().enumerate() {
        if !kept[match_index] {
            continue;
        }
        retained_old[old_position] = true;
        retained_new[new_position] = true;
        let content = &new[new_position].content;
        if old[old_position].content != *content {
            updated.push((new_position, content.clone()));
        }
    }

    let deleted: Vec<usize> = retained_old
        .iter()
        .enumerate()
        .filter_map(|(position, retained)| (!retained).then_some(position))
        .collect();
    let inserted: Vec<(usize, C)> = new
        .iter()
        .enumerate()
        .filter(|(position, _)| !retained_new[*position])
        .map(|(position, entry)| (position, entry.content.clone()))
        .collect();

    trace!(
        old_len = old.len(),
        new_len = new.len(),
        retained = matched.len() - kept.iter().filter(|kept| !**kept).count(),
        deleted = deleted.len(),
        inserted = inserted.len(),
        updated = updated.len(),
        "reconciled snapshots"
    );

    Transition {
        deleted,
        inserted,
        updated,
        old_len: old.len(),
        new_len: new.len(),
        animated: true,
        scroll: Default::default(),
    }
}

/// Mark the members of a longest strictly increasing subsequence of `values`.
///
/// `values` must be distinct. When several subsequences share the maximum
/// length, the lexicographically smallest by index is chosen. Runs in
/// O(n log n).
fn earliest_longest_increasing(values: &[usize]) -> Vec<bool> {
    // run_from[i]: length of the longest increasing run starting at i.
    let mut run_from = vec![0usize; values.len()];
    // best_start[k]: largest starting value among runs of length k + 1. Strictly decreasing.
    let mut best_start: Vec<usize> = Vec::new();
    for (i, &value) in values.iter().enumerate().rev() {
        let slot = best_start.partition_point(|&start| start > value);
        if slot == best_start.len() {
            best_start.push(value);
        } else {
            best_start[slot] = value;
        }
        run_from[i] = slot + 1;
    }

    let mut kept = vec![false; values.len()];
    let mut needed = best_start.len();
    let mut floor: Option<usize> = None;
    for (i, &value) in values.iter().enumerate() {
        if needed == 0 {
            break;
        }
        if run_from[i] == needed && floor.is_none_or(|floor| value > floor) {
            kept[i] = true;
            floor = Some(value);
            needed -= 1;
        }
    }
    kept
}

fn duplicate_stable_id<I: fmt::Debug>(side: &str, id: &I, first: usize, second: usize) {
    if cfg!(debug_assertions) {
        panic!("duplicate stable id {id:?} in {side} snapshot at positions {first} and {second}");
    }
    warn!(
        side,
        id = ?id,
        first,
        second,
        "duplicate stable id; later occurrence is not matched"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderKey;

    type TestEntry = Entry<char, OrderKey, u32>;

    fn entries(rows: &[(char, u32)]) -> Vec<TestEntry> {
        rows.iter()
            .enumerate()
            .map(|(index, &(id, content))| Entry::new(id, OrderKey::new(0, index as u32), content))
            .collect()
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let a = entries(&[('a', 1), ('b', 2), ('c', 3)]);
        let transition = reconcile(&a, &a);
        assert!(transition.is_empty());
        assert_eq!((transition.old_len, transition.new_len), (3, 3));
    }

    #[test]
    fn deletes_updates_and_inserts_in_one_pass() {
        let old = entries(&[('a', 1), ('b', 2), ('c', 3)]);
        let new = entries(&[('a', 1), ('c', 5), ('d', 4)]);

        let transition = reconcile(&old, &new);
        assert_eq!(transition.deleted, vec![1]);
        assert_eq!(transition.updated, vec![(1, 5)]);
        assert_eq!(transition.inserted, vec![(2, 4)]);
    }

    #[test]
    fn swap_keeps_the_earliest_new_row_in_place() {
        let old = entries(&[('a', 1), ('b', 2)]);
        let new = entries(&[('b', 2), ('a', 1)]);

        for _ in 0..3 {
            let transition = reconcile(&old, &new);
            assert_eq!(transition.deleted, vec![0]);
            assert_eq!(transition.inserted, vec![(1, 1)]);
            assert!(transition.updated.is_empty());
        }
    }

    #[test]
    fn moving_one_row_keeps_the_longest_run() {
        let old = entries(&[('a', 1), ('b', 2), ('c', 3), ('d', 4)]);
        let new = entries(&[('d', 4), ('a', 1), ('b', 2), ('c', 3)]);

        let transition = reconcile(&old, &new);
        assert_eq!(transition.deleted, vec![3]);
        assert_eq!(transition.inserted, vec![(0, 4)]);
        assert!(transition.updated.is_empty());
    }

    #[test]
    fn equal_length_runs_break_ties_towards_earliest_new_rows() {
        let old = entries(&[('a', 1), ('b', 2), ('c', 3), ('d', 4)]);
        let new = entries(&[('c', 3), ('d', 4), ('a', 1), ('b', 2)]);

        let transition = reconcile(&old, &new);
        assert_eq!(transition.deleted, vec![0, 1]);
        assert_eq!(transition.inserted, vec![(2, 1), (3, 2)]);
    }

    #[test]
    fn changed_content_in_place_is_an_update_not_a_move() {
        let old = entries(&[('a', 1), ('x', 10), ('b', 2)]);
        let new = entries(&[('a', 1), ('x', 11), ('b', 2)]);

        let transition = reconcile(&old, &new);
        assert_eq!(transition.updated, vec![(1, 11)]);
        assert!(transition.deleted.is_empty());
        assert!(transition.inserted.is_empty());
    }

    #[test]
    fn moved_row_with_changed_content_is_reinserted_with_new_content() {
        let old = entries(&[('a', 1), ('b', 2), ('c', 3)]);
        let new = entries(&[('c', 9), ('a', 1), ('b', 2)]);

        let transition = reconcile(&old, &new);
        assert_eq!(transition.deleted, vec![2]);
        assert_eq!(transition.inserted, vec![(0, 9)]);
        assert!(transition.updated.is_empty());
    }

    #[test]
    fn empty_old_inserts_everything() {
        let new = entries(&[('a', 1), ('b', 2), ('c', 3)]);
        let transition = reconcile(&[], &new);
        assert_eq!(transition.inserted, vec![(0, 1), (1, 2), (2, 3)]);
        assert!(transition.deleted.is_empty());
        assert!(transition.updated.is_empty());
    }

    #[test]
    fn empty_new_deletes_everything() {
        let old = entries(&[('a', 1), ('b', 2), ('c', 3)]);
        let transition = reconcile(&old, &[]);
        assert_eq!(transition.deleted, vec![0, 1, 2]);
        assert!(transition.inserted.is_empty());
        assert_eq!(transition.new_len, 0);
    }

    #[test]
    fn increasing_run_prefers_lowest_indices() {
        assert_eq!(
            earliest_longest_increasing(&[2, 3, 0, 1]),
            vec![true, true, false, false]
        );
        assert_eq!(
            earliest_longest_increasing(&[3, 0, 1, 2]),
            vec![false, true, true, true]
        );
        assert_eq!(earliest_longest_increasing(&[1, 0]), vec![true, false]);
        assert!(earliest_longest_increasing(&[]).is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate stable id")]
    fn duplicate_ids_panic_in_debug_builds() {
        let old = entries(&[('a', 1), ('a', 2)]);
        let _ = reconcile(&old, &[]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate stable id")]
    fn duplicate_ids_only_in_new_snapshot_panic_in_debug_builds() {
        let new = entries(&[('x', 7), ('x', 7)]);
        let _ = reconcile(&[], &new);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate stable id")]
    fn duplicate_ids_in_new_matching_old_panic_in_debug_builds() {
        let old = entries(&[('a', 1)]);
        let new = entries(&[('a', 1), ('b', 2), ('a', 3)]);
        let _ = reconcile(&old, &new);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn duplicate_ids_in_new_become_plain_insertions_in_release_builds() {
        let old = entries(&[('a', 1)]);
        let new = entries(&[('x', 7), ('a', 1), ('x', 8)]);

        let transition = reconcile(&old, &new);
        assert!(transition.deleted.is_empty());
        assert_eq!(transition.inserted, vec![(0, 7), (2, 8)]);
        assert!(transition.updated.is_empty());
    }
}
