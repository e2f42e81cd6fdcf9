//! Property-based tests for the diff engine and the auto-diff source.
//!
//! Alphabets are small so generated sequences are full of repeated elements.

use horizon_sections::source::diff::{diff, diff_by_key};
use horizon_sections::source::{
    AutoDiffConfig, AutoDiffSource, DataSource, Section, SectionMirror,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

// =============================================================================
// Helpers
// =============================================================================

/// Textbook dynamic-programming LCS length.
fn lcs_len(old: &[u8], new: &[u8]) -> usize {
    let mut table = vec![vec![0_usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table[0][0]
}

fn items() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0_u8..4, 0..12)
}

fn sections() -> impl Strategy<Value = Vec<(u8, Vec<u8>)>> {
    prop::collection::vec((0_u8..5, items()), 0..6)
}

fn to_sections(raw: &[(u8, Vec<u8>)]) -> Vec<Section<u8>> {
    raw.iter()
        .map(|(id, items)| Section::new(items.clone()).with_supplementary("id", *id))
        .collect()
}

/// Distinct values in random order, so no class repeats.
fn distinct_items() -> impl Strategy<Value = Vec<u8>> {
    prop::sample::subsequence((0_u8..16).collect::<Vec<_>>(), 0..=16).prop_shuffle()
}

/// A length and two indices at least two apart.
fn swap_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (3_usize..12)
        .prop_flat_map(|len| (Just(len), 0..len - 2))
        .prop_flat_map(|(len, i)| (Just(len), Just(i), i + 2..len))
}

fn same_id(a: &Section<u8>, b: &Section<u8>) -> bool {
    a.supplementary_as::<u8>("id") == b.supplementary_as::<u8>("id")
}

/// Sets `old`, attaches a mirror, sets `new` and returns what the mirror saw.
fn mirror_after(old: &[(u8, Vec<u8>)], new: &[(u8, Vec<u8>)], moves: bool) -> Vec<Vec<u8>> {
    let source = Arc::new(AutoDiffSource::new(
        to_sections(old),
        AutoDiffConfig::with_item_equality(same_id).with_item_moves(moves),
    ));
    let mirror = Arc::new(Mutex::new(SectionMirror::from_source(&*source).unwrap()));

    let (mirror_clone, source_clone) = (mirror.clone(), source.clone());
    source.events().connect(move |batch| {
        mirror_clone.lock().apply(batch, &*source_clone).unwrap();
    });

    source.set_sections(to_sections(new));
    let result = mirror.lock().clone().into_sections();
    source.events().disconnect_all();
    result
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    /// Applying the published batch to a mirror of the old state yields the new state.
    #[test]
    fn round_trip(old in sections(), new in sections(), moves in any::<bool>()) {
        let expected: Vec<Vec<u8>> = new.iter().map(|(_, items)| items.clone()).collect();
        prop_assert_eq!(mirror_after(&old, &new, moves), expected);
    }

    /// Deletes plus inserts never exceed |old| + |new| - 2 * LCS.
    #[test]
    fn minimality_bound(old in items(), new in items(), moves in any::<bool>()) {
        let script = diff(&old, &new, |a, b| a == b, moves);
        let bound = old.len() + new.len() - 2 * lcs_len(&old, &new);
        let structural = script.deletes().len() + script.inserts().len();
        prop_assert!(structural <= bound, "{structural} > {bound}");
        if !moves {
            prop_assert_eq!(structural, bound);
        }
    }

    /// Diffing a snapshot against itself is empty, at both levels.
    #[test]
    fn idempotence(raw in sections(), moves in any::<bool>()) {
        for (_, items) in &raw {
            prop_assert!(diff(items, items, |a, b| a == b, moves).is_empty());
        }

        let source = AutoDiffSource::new(
            to_sections(&raw),
            AutoDiffConfig::with_item_equality(same_id).with_item_moves(moves),
        );
        prop_assert!(source.set_sections(to_sections(&raw)).is_empty());
    }

    /// Swapping two non-adjacent distinct elements: two moves, or two delete + insert pairs.
    #[test]
    fn move_toggle((len, i, j) in swap_strategy()) {
        let old: Vec<usize> = (0..len).collect();
        let mut new = old.clone();
        new.swap(i, j);

        let with_moves = diff(&old, &new, |a, b| a == b, true);
        prop_assert_eq!(with_moves.moves().len(), 2);
        prop_assert!(with_moves.deletes().is_empty() && with_moves.inserts().is_empty());

        let without_moves = diff(&old, &new, |a, b| a == b, false);
        prop_assert!(without_moves.moves().is_empty());
        prop_assert_eq!(without_moves.deletes().len(), 2);
        prop_assert_eq!(without_moves.inserts().len(), 2);
    }

    /// Without repeated elements the stable part is still a longest common subsequence.
    #[test]
    fn distinct_alignment_is_exact(old in distinct_items(), new in distinct_items(), moves in any::<bool>()) {
        let script = diff(&old, &new, |a, b| a == b, moves);
        let stable = script.matches().len() - script.moves().len();
        prop_assert_eq!(stable, lcs_len(&old, &new));

        let by_key = diff_by_key(&old, &new, |x| *x, moves);
        prop_assert_eq!(by_key, script);
    }

    /// Moves never report an element that could have stayed in place.
    #[test]
    fn moves_only_cover_leftovers(old in items(), new in items()) {
        let script = diff(&old, &new, |a, b| a == b, true);
        let stable = script.matches().len() - script.moves().len();
        prop_assert_eq!(stable, lcs_len(&old, &new));
    }
}
