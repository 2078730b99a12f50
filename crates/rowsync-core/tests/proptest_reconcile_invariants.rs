//! Property-based invariant tests for snapshot reconciliation.
//!
//! These tests verify:
//!
//! 1. Applying a transition to the old rows yields the new rows
//! 2. The same holds for reversed rendering
//! 3. Reconciling a snapshot with itself changes nothing
//! 4. Inversion is an involution and keeps every set ascending
//! 5. Determinism: same inputs yield the same transition
//! 6. Disjoint snapshots produce only deletes and inserts
//! 7. Retained rows form the earliest longest order-preserving run

use proptest::prelude::*;
use rowsync_core::{Entry, OrderKey, RowList, Transition, reconcile};

type Row = Entry<u32, OrderKey, u8>;

// ── Strategies ──────────────────────────────────────────────────────────

/// Snapshot with unique ids drawn from `0..universe`, in arbitrary order.
fn snapshot_strategy(universe: u32) -> impl Strategy<Value = Vec<Row>> {
    let ids: Vec<u32> = (0..universe).collect();
    prop::sample::subsequence(ids, 0..=universe as usize)
        .prop_shuffle()
        .prop_flat_map(|ids| {
            let len = ids.len();
            (Just(ids), prop::collection::vec(0u8..3, len))
        })
        .prop_map(|(ids, contents)| {
            ids.into_iter()
                .zip(contents)
                .enumerate()
                .map(|(index, (id, content))| Entry::new(id, OrderKey::new(0, index as u32), content))
                .collect()
        })
}

fn contents(entries: &[Row]) -> Vec<u8> {
    entries.iter().map(|entry| entry.content).collect()
}

/// Exhaustive reference: new positions of the longest run of matched rows whose
/// old positions increase, preferring the lexicographically smallest run.
fn earliest_longest_run_by_search(old: &[Row], new: &[Row]) -> Vec<usize> {
    let matched: Vec<(usize, usize)> = new
        .iter()
        .enumerate()
        .filter_map(|(new_position, entry)| {
            old.iter()
                .position(|candidate| candidate.stable_id == entry.stable_id)
                .map(|old_position| (new_position, old_position))
        })
        .collect();

    let mut best: Vec<usize> = Vec::new();
    for mask in 0u32..(1 << matched.len()) {
        let picked: Vec<(usize, usize)> = (0..matched.len())
            .filter(|bit| mask & (1 << bit) != 0)
            .map(|bit| matched[bit])
            .collect();
        if !picked.windows(2).all(|pair| pair[0].1 < pair[1].1) {
            continue;
        }
        let run: Vec<usize> = picked.iter().map(|(new_position, _)| *new_position).collect();
        if run.len() > best.len() || (run.len() == best.len() && run < best) {
            best = run;
        }
    }
    best
}

fn is_ascending(positions: impl IntoIterator<Item = usize>) -> bool {
    let positions: Vec<usize> = positions.into_iter().collect();
    positions.windows(2).all(|pair| pair[0] < pair[1])
}

// ═══════════════════════════════════════════════════════════════════════
// 1-2. Transform law
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn applying_transition_converges_on_new_rows(
        old in snapshot_strategy(24),
        new in snapshot_strategy(24),
    ) {
        let transition = reconcile(&old, &new);
        prop_assert_eq!(transition.old_len, old.len());
        prop_assert_eq!(transition.new_len, new.len());
        prop_assert!(is_ascending(transition.deleted.iter().copied()));
        prop_assert!(is_ascending(transition.inserted.iter().map(|(p, _)| *p)));
        prop_assert!(is_ascending(transition.updated.iter().map(|(p, _)| *p)));

        let mut list = RowList::from_rows(contents(&old));
        list.apply(transition).expect("transition should fit the old rows");
        prop_assert_eq!(list.into_rows(), contents(&new));
    }

    #[test]
    fn reversed_transition_converges_on_reversed_rows(
        old in snapshot_strategy(24),
        new in snapshot_strategy(24),
    ) {
        let transition = reconcile(&old, &new).oriented(true);

        let mut old_rows = contents(&old);
        old_rows.reverse();
        let mut expected = contents(&new);
        expected.reverse();

        let mut list = RowList::from_rows(old_rows);
        list.apply(transition).expect("inverted transition should fit the reversed rows");
        prop_assert_eq!(list.into_rows(), expected);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Idempotence
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identical_snapshots_reconcile_to_nothing(snapshot in snapshot_strategy(32)) {
        let transition = reconcile(&snapshot, &snapshot);
        prop_assert!(transition.is_empty());
        prop_assert_eq!(transition.old_len, transition.new_len);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Inversion
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn inversion_is_an_involution(
        old in snapshot_strategy(16),
        new in snapshot_strategy(16),
    ) {
        let transition: Transition<u8> = reconcile(&old, &new);
        let inverted = transition.clone().inverted();

        prop_assert!(is_ascending(inverted.deleted.iter().copied()));
        prop_assert!(is_ascending(inverted.inserted.iter().map(|(p, _)| *p)));
        prop_assert!(is_ascending(inverted.updated.iter().map(|(p, _)| *p)));
        prop_assert_eq!(inverted.deleted.len(), transition.deleted.len());

        prop_assert_eq!(inverted.inverted(), transition.clone());
        prop_assert_eq!(transition.clone().oriented(false), transition);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Determinism
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reconcile_is_deterministic(
        old in snapshot_strategy(20),
        new in snapshot_strategy(20),
    ) {
        prop_assert_eq!(reconcile(&old, &new), reconcile(&old, &new));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Disjoint snapshots
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn disjoint_snapshots_replace_every_row(
        old in snapshot_strategy(10),
        new in snapshot_strategy(10),
    ) {
        let shifted: Vec<Row> = new
            .into_iter()
            .map(|entry| Entry::new(entry.stable_id + 100, entry.order_key, entry.content))
            .collect();

        let transition = reconcile(&old, &shifted);
        prop_assert_eq!(transition.deleted, (0..old.len()).collect::<Vec<_>>());
        prop_assert_eq!(
            transition.inserted.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            (0..shifted.len()).collect::<Vec<_>>()
        );
        prop_assert!(transition.updated.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Maximal retention with earliest-first tie-break
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn retained_rows_match_exhaustive_search(
        old in snapshot_strategy(8),
        new in snapshot_strategy(8),
    ) {
        let transition = reconcile(&old, &new);
        let retained: Vec<usize> = (0..new.len())
            .filter(|position| !transition.inserted.iter().any(|(p, _)| p == position))
            .collect();

        prop_assert_eq!(&retained, &earliest_longest_run_by_search(&old, &new));
        prop_assert_eq!(old.len() - transition.deleted.len(), retained.len());
    }

    #[test]
    fn swapped_halves_keep_the_leading_half(split in 1usize..8, len in 2usize..9) {
        let split = split.min(len - 1);
        let old: Vec<Row> = (0..len as u32)
            .map(|id| Entry::new(id, OrderKey::new(0, id), 0))
            .collect();
        let mut new = old[split..].to_vec();
        new.extend_from_slice(&old[..split]);

        let transition = reconcile(&old, &new);
        let retained: Vec<usize> = (0..new.len())
            .filter(|position| !transition.inserted.iter().any(|(p, _)| p == position))
            .collect();
        prop_assert_eq!(retained, earliest_longest_run_by_search(&old, &new));
    }
}
