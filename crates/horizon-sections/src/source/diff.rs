//! Auto-diff engine.
//!
//! Given an old and a new ordered collection and a way to tell which
//! elements correspond, [`diff`] computes an [`EditScript`]: the deletes,
//! inserts and (optionally) moves that turn the old collection into the new
//! one. The same engine runs at both levels of a sectioned source: once over
//! sections, then once per matched section pair over items.
//!
//! # Algorithm
//!
//! 1. Every element is assigned an equivalence class. With only an equality
//!    predicate this is a linear scan over class representatives; with a
//!    hashable key ([`diff_by_key`]) it is a hash lookup.
//! 2. The stable alignment is a longest common subsequence over class ids.
//!    When no class repeats on either side (always the case for identity
//!    keys) it is the longest increasing run of old indices taken in new
//!    order, found by patience sorting in O(n log n). Otherwise Myers'
//!    algorithm is used. Stable pairs never produce events: their index
//!    changes are fully explained by the surrounding inserts and deletes.
//! 3. With move detection on, the elements left over on both sides are
//!    paired up as moves:
//!    - classes occurring exactly once on each side are anchored first;
//!    - matches are then extended to equal neighbours, forward and backward,
//!      so runs of adjacent elements move together;
//!    - whatever is left pairs up per class in order of occurrence.
//! 4. Unpaired old elements are deletes, unpaired new elements are inserts.
//!
//! The output order is fixed: deletes by descending old index, inserts by
//! ascending new index, moves and reloads by ascending new index.
//!
//! # Example
//!
//! ```
//! use horizon_sections::source::diff::{diff, Move};
//!
//! let old = ["a", "b", "c", "d", "e"];
//! let new = ["d", "b", "c", "a", "e"];
//!
//! let script = diff(&old, &new, |a, b| a == b, true);
//! assert_eq!(script.moves(), &[Move { from: 3, to: 0 }, Move { from: 0, to: 3 }]);
//! assert!(script.deletes().is_empty() && script.inserts().is_empty());
//!
//! let script = diff(&old, &new, |a, b| a == b, false);
//! assert_eq!(script.deletes(), &[3, 0]);
//! assert_eq!(script.inserts(), &[0, 3]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::hash::Hash;

use horizon_sections_core::logging::targets;
use similar::algorithms::{myers, DiffHook};

use super::event::{ChangeBatch, ChangeEvent, Position};

/// One element relocated from an old index to a new index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Index in the old collection.
    pub from: usize,
    /// Index in the new collection.
    pub to: usize,
}

/// The result of diffing two ordered collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    deletes: Vec<usize>,
    inserts: Vec<usize>,
    moves: Vec<Move>,
    reloads: Vec<usize>,
    matches: Vec<(usize, usize)>,
}

impl EditScript {
    /// Old indices to delete, descending.
    pub fn deletes(&self) -> &[usize] {
        &self.deletes
    }

    /// New indices to insert, ascending.
    pub fn inserts(&self) -> &[usize] {
        &self.inserts
    }

    /// Moves, ascending by destination.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// New indices of matched elements whose content changed, ascending.
    pub fn reloads(&self) -> &[usize] {
        &self.reloads
    }

    /// Every matched `(old, new)` pair, moved or not, ascending by new index.
    pub fn matches(&self) -> &[(usize, usize)] {
        &self.matches
    }

    /// Returns `true` if the collections are equivalent.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
            && self.inserts.is_empty()
            && self.moves.is_empty()
            && self.reloads.is_empty()
    }

    /// Appends this script as section-level events.
    pub fn append_section_events(&self, batch: &mut ChangeBatch) {
        if !self.deletes.is_empty() {
            batch.push(ChangeEvent::DeleteSections(self.deletes.clone()));
        }
        if !self.inserts.is_empty() {
            batch.push(ChangeEvent::InsertSections(self.inserts.clone()));
        }
        for &Move { from, to } in &self.moves {
            batch.push(ChangeEvent::MoveSection { from, to });
        }
        if !self.reloads.is_empty() {
            batch.push(ChangeEvent::ReloadSections(self.reloads.clone()));
        }
    }

    /// Appends this script as item-level events for `section`.
    ///
    /// `section` is the section's index in the new state.
    pub fn append_item_events(&self, section: usize, batch: &mut ChangeBatch) {
        let at = |item: usize| Position::new(section, item);

        if !self.deletes.is_empty() {
            batch.push(ChangeEvent::DeleteItems(self.deletes.iter().map(|&i| at(i)).collect()));
        }
        if !self.inserts.is_empty() {
            batch.push(ChangeEvent::InsertItems(self.inserts.iter().map(|&i| at(i)).collect()));
        }
        for &Move { from, to } in &self.moves {
            batch.push(ChangeEvent::MoveItem {
                from: at(from),
                to: at(to),
            });
        }
        if !self.reloads.is_empty() {
            batch.push(ChangeEvent::ReloadItems(self.reloads.iter().map(|&i| at(i)).collect()));
        }
    }

    /// This script as a batch of section-level events.
    pub fn section_events(&self) -> ChangeBatch {
        let mut batch = ChangeBatch::new();
        self.append_section_events(&mut batch);
        batch
    }

    /// This script as a batch of item-level events for `section`.
    pub fn item_events(&self, section: usize) -> ChangeBatch {
        let mut batch = ChangeBatch::new();
        self.append_item_events(section, &mut batch);
        batch
    }
}

/// Diffs two collections using an equality predicate.
///
/// `equal` must behave as an equivalence relation. Classification costs
/// O((n + m) * k) comparisons for k distinct classes; use [`diff_by_key`]
/// when a hashable projection is available.
pub fn diff<E, F>(old: &[E], new: &[E], equal: F, detect_moves: bool) -> EditScript
where
    F: Fn(&E, &E) -> bool,
{
    let (old_ids, new_ids) = classify_by_predicate(old, new, &equal);
    build_script(&old_ids, &new_ids, detect_moves, None::<fn(usize, usize) -> bool>)
}

/// Diffs two collections whose elements correspond when their keys are equal.
///
/// With unique keys the whole diff runs in O((n + m) log(n + m)).
pub fn diff_by_key<E, K, F>(old: &[E], new: &[E], key: F, detect_moves: bool) -> EditScript
where
    F: Fn(&E) -> K,
    K: Hash + Eq,
{
    let (old_ids, new_ids) = classify_by_key(old, new, key);
    build_script(&old_ids, &new_ids, detect_moves, None::<fn(usize, usize) -> bool>)
}

/// Diffs with a second, content-level comparison.
///
/// Elements are matched with `equal`; every matched pair for which
/// `same_content` returns `false` is reported as a reload at its new index.
pub fn diff_with_content<E, F, C>(
    old: &[E],
    new: &[E],
    equal: F,
    same_content: C,
    detect_moves: bool,
) -> EditScript
where
    F: Fn(&E, &E) -> bool,
    C: Fn(&E, &E) -> bool,
{
    let (old_ids, new_ids) = classify_by_predicate(old, new, &equal);
    build_script(
        &old_ids,
        &new_ids,
        detect_moves,
        Some(|i: usize, j: usize| same_content(&old[i], &new[j])),
    )
}

// -----------------------------------------------------------------------------
// Classification
// -----------------------------------------------------------------------------

fn classify_by_predicate<'a, E, F>(
    old: &'a [E],
    new: &'a [E],
    equal: &F,
) -> (Vec<usize>, Vec<usize>)
where
    F: Fn(&E, &E) -> bool,
{
    let mut representatives: Vec<&'a E> = Vec::new();
    let mut class_of = |element: &'a E| -> usize {
        if let Some(id) = representatives.iter().position(|rep| equal(*rep, element)) {
            return id;
        }
        representatives.push(element);
        representatives.len() - 1
    };

    let old_ids: Vec<usize> = old.iter().map(&mut class_of).collect();
    let new_ids: Vec<usize> = new.iter().map(&mut class_of).collect();
    (old_ids, new_ids)
}

fn classify_by_key<E, K, F>(old: &[E], new: &[E], key: F) -> (Vec<usize>, Vec<usize>)
where
    F: Fn(&E) -> K,
    K: Hash + Eq,
{
    let mut classes: HashMap<K, usize> = HashMap::with_capacity(old.len().max(new.len()));
    let mut class_of = |element: &E| -> usize {
        let next = classes.len();
        *classes.entry(key(element)).or_insert(next)
    };

    let old_ids: Vec<usize> = old.iter().map(&mut class_of).collect();
    let new_ids: Vec<usize> = new.iter().map(&mut class_of).collect();
    (old_ids, new_ids)
}

// -----------------------------------------------------------------------------
// Alignment
// -----------------------------------------------------------------------------

/// Collects the equal runs reported by Myers.
struct EqualRuns<'a> {
    alignment: &'a mut Alignment,
}

impl DiffHook for EqualRuns<'_> {
    type Error = Infallible;

    fn equal(&mut self, old_index: usize, new_index: usize, len: usize) -> Result<(), Infallible> {
        for k in 0..len {
            self.alignment.pair(old_index + k, new_index + k);
        }
        Ok(())
    }
}

/// Index correspondence between the two sides.
struct Alignment {
    old_to_new: Vec<Option<usize>>,
    new_to_old: Vec<Option<usize>>,
    moves: Vec<Move>,
}

impl Alignment {
    fn new(old_len: usize, new_len: usize) -> Self {
        Self {
            old_to_new: vec![None; old_len],
            new_to_old: vec![None; new_len],
            moves: Vec::new(),
        }
    }

    fn pair(&mut self, old: usize, new: usize) {
        self.old_to_new[old] = Some(new);
        self.new_to_old[new] = Some(old);
    }

    fn pair_moved(&mut self, old: usize, new: usize) {
        self.pair(old, new);
        self.moves.push(Move { from: old, to: new });
    }

    fn is_free(&self, old: usize, new: usize) -> bool {
        self.old_to_new[old].is_none() && self.new_to_old[new].is_none()
    }
}

fn build_script<C>(
    old_ids: &[usize],
    new_ids: &[usize],
    detect_moves: bool,
    same_content: Option<C>,
) -> EditScript
where
    C: Fn(usize, usize) -> bool,
{
    let _span = tracing::trace_span!(
        target: targets::DIFF,
        "diff",
        old_len = old_ids.len(),
        new_len = new_ids.len(),
        detect_moves
    )
    .entered();

    let mut alignment = Alignment::new(old_ids.len(), new_ids.len());

    match unique_positions(old_ids, new_ids) {
        Some(old_position) => align_unique(&mut alignment, &old_position, new_ids),
        None => {
            let mut runs = EqualRuns {
                alignment: &mut alignment,
            };
            if let Err(never) = myers::diff(
                &mut runs,
                old_ids,
                0..old_ids.len(),
                new_ids,
                0..new_ids.len(),
            ) {
                match never {}
            }
        }
    }

    if detect_moves {
        pair_moves(&mut alignment, old_ids, new_ids);
    }

    let deletes: Vec<usize> = (0..old_ids.len())
        .rev()
        .filter(|&i| alignment.old_to_new[i].is_none())
        .collect();
    let inserts: Vec<usize> = (0..new_ids.len())
        .filter(|&j| alignment.new_to_old[j].is_none())
        .collect();
    let matches: Vec<(usize, usize)> = alignment
        .new_to_old
        .iter()
        .enumerate()
        .filter_map(|(j, old)| old.map(|i| (i, j)))
        .collect();
    let reloads: Vec<usize> = match same_content {
        Some(same) => matches
            .iter()
            .filter(|&&(i, j)| !same(i, j))
            .map(|&(_, j)| j)
            .collect(),
        None => Vec::new(),
    };
    let mut moves = alignment.moves;
    moves.sort_unstable_by_key(|m| m.to);

    tracing::trace!(
        target: targets::DIFF,
        deletes = deletes.len(),
        inserts = inserts.len(),
        moves = moves.len(),
        reloads = reloads.len(),
        "diff computed"
    );

    EditScript {
        deletes,
        inserts,
        moves,
        reloads,
        matches,
    }
}

/// Old index per class, or `None` if some class repeats on either side.
fn unique_positions(old_ids: &[usize], new_ids: &[usize]) -> Option<Vec<Option<usize>>> {
    let class_count = class_count(old_ids, new_ids);

    let mut old_position = vec![None; class_count];
    for (i, &class) in old_ids.iter().enumerate() {
        if old_position[class].replace(i).is_some() {
            return None;
        }
    }
    let mut seen = vec![false; class_count];
    for &class in new_ids {
        if std::mem::replace(&mut seen[class], true) {
            return None;
        }
    }
    Some(old_position)
}

/// Aligns sequences without repeated classes by patience sorting.
///
/// Every common class yields a candidate `(old, new)` pair; walking them in
/// new order, the longest strictly increasing run of old indices is a
/// longest common subsequence.
fn align_unique(alignment: &mut Alignment, old_position: &[Option<usize>], new_ids: &[usize]) {
    let candidates: Vec<(usize, usize)> = new_ids
        .iter()
        .enumerate()
        .filter_map(|(j, &class)| old_position[class].map(|i| (i, j)))
        .collect();

    // tails[k] is the candidate ending the best run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; candidates.len()];
    for (c, &(i, _)) in candidates.iter().enumerate() {
        let pile = tails.partition_point(|&t| candidates[t].0 < i);
        previous[c] = pile.checked_sub(1).map(|p| tails[p]);
        if pile == tails.len() {
            tails.push(c);
        } else {
            tails[pile] = c;
        }
    }

    let mut cursor = tails.last().copied();
    while let Some(c) = cursor {
        let (i, j) = candidates[c];
        alignment.pair(i, j);
        cursor = previous[c];
    }
}

fn class_count(old_ids: &[usize], new_ids: &[usize]) -> usize {
    old_ids
        .iter()
        .chain(new_ids)
        .max()
        .map_or(0, |&max| max + 1)
}

/// Pairs elements left over by the stable alignment as moves.
fn pair_moves(alignment: &mut Alignment, old_ids: &[usize], new_ids: &[usize]) {
    let class_count = class_count(old_ids, new_ids);

    // Leftover old indices per class, in order of occurrence.
    let mut old_by_class: Vec<VecDeque<usize>> = vec![VecDeque::new(); class_count];
    for (i, &class) in old_ids.iter().enumerate() {
        if alignment.old_to_new[i].is_none() {
            old_by_class[class].push_back(i);
        }
    }
    let mut new_counts = vec![0_usize; class_count];
    for (j, &class) in new_ids.iter().enumerate() {
        if alignment.new_to_old[j].is_none() {
            new_counts[class] += 1;
        }
    }

    // Anchors: classes left over exactly once on each side.
    for (j, &class) in new_ids.iter().enumerate() {
        if alignment.new_to_old[j].is_none()
            && new_counts[class] == 1
            && old_by_class[class].len() == 1
        {
            if let Some(i) = old_by_class[class].pop_front() {
                alignment.pair_moved(i, j);
            }
        }
    }

    // Extend matches to equal free neighbours.
    for j in 0..new_ids.len().saturating_sub(1) {
        if let Some(i) = alignment.new_to_old[j] {
            let (i, j) = (i + 1, j + 1);
            if i < old_ids.len() && alignment.is_free(i, j) && old_ids[i] == new_ids[j] {
                take_old(&mut old_by_class[old_ids[i]], i);
                alignment.pair_moved(i, j);
            }
        }
    }
    for j in (1..new_ids.len()).rev() {
        if let Some(i) = alignment.new_to_old[j] {
            if i == 0 {
                continue;
            }
            let (i, j) = (i - 1, j - 1);
            if alignment.is_free(i, j) && old_ids[i] == new_ids[j] {
                take_old(&mut old_by_class[old_ids[i]], i);
                alignment.pair_moved(i, j);
            }
        }
    }

    // Remaining candidates, first come first served.
    for (j, &class) in new_ids.iter().enumerate() {
        if alignment.new_to_old[j].is_none() {
            if let Some(i) = old_by_class[class].pop_front() {
                alignment.pair_moved(i, j);
            }
        }
    }
}

fn take_old(queue: &mut VecDeque<usize>, index: usize) {
    if let Some(pos) = queue.iter().position(|&i| i == index) {
        queue.remove(pos);
    }
}
