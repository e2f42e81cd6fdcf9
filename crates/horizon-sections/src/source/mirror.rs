//! Reference consumer that keeps a local copy in sync with a source.
//!
//! [`SectionMirror::apply`] is the canonical way to apply a [`ChangeBatch`].
//! A batch is applied in two phases against the state that preceded it:
//!
//! 1. **Sections.** Deleted sections and the sources of section moves are
//!    removed (previous-state indices, descending). Inserted sections and the
//!    destinations of moves are then inserted (new-state indices, ascending);
//!    a moved section keeps its items.
//! 2. **Items.** The same procedure runs for items, grouped by their
//!    section's new index. Reloaded items are then re-read.
//!
//! Reloaded sections are re-read last. A batch containing `ReloadAll` is
//! handled by re-reading everything.
//!
//! Inserted and reloaded values are read from the source, which already
//! holds the new state when the batch is delivered.

use std::collections::{BTreeMap, HashMap};

use super::error::{SourceError, SourceResult};
use super::event::{ChangeBatch, ChangeEvent, Position};
use super::traits::DataSource;

/// A plain copy of a source's sections, updated from change batches.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{DataSource, MutableSource, SectionMirror};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// let source = Arc::new(MutableSource::new(vec!['a', 'b', 'c']));
/// let mirror = Arc::new(Mutex::new(SectionMirror::from_source(&*source).unwrap()));
///
/// let (mirror_clone, source_clone) = (mirror.clone(), source.clone());
/// source.events().connect(move |batch| {
///     mirror_clone.lock().apply(batch, &*source_clone).unwrap();
/// });
///
/// source.move_item(0, 2).unwrap();
/// source.delete(0..1).unwrap();
/// assert_eq!(mirror.lock().sections(), &[vec!['c', 'a']]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMirror<T> {
    sections: Vec<Vec<T>>,
}

/// Item-phase work for one section.
struct ItemOps {
    removals: Vec<usize>,
    insertions: Vec<(usize, Option<Position>)>,
}

impl ItemOps {
    fn new() -> Self {
        Self {
            removals: Vec::new(),
            insertions: Vec::new(),
        }
    }
}

impl<T: Clone> SectionMirror<T> {
    /// Creates a mirror holding `sections`.
    pub fn new(sections: Vec<Vec<T>>) -> Self {
        Self { sections }
    }

    /// Reads every section of `source`.
    pub fn from_source<S>(source: &S) -> SourceResult<Self>
    where
        S: DataSource<Item = T> + ?Sized,
    {
        let sections = (0..source.section_count())
            .map(|section| source.section_items(section))
            .collect::<SourceResult<Vec<_>>>()?;
        Ok(Self { sections })
    }

    /// The mirrored sections.
    pub fn sections(&self) -> &[Vec<T>] {
        &self.sections
    }

    /// Number of mirrored sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Consumes the mirror, returning its sections.
    pub fn into_sections(self) -> Vec<Vec<T>> {
        self.sections
    }

    /// Applies `batch`, reading new values from `source`.
    ///
    /// An error means the batch does not fit the mirrored state; the mirror
    /// may then be partially updated and should be rebuilt with
    /// [`from_source`](Self::from_source).
    pub fn apply<S>(&mut self, batch: &ChangeBatch, source: &S) -> SourceResult<()>
    where
        S: DataSource<Item = T> + ?Sized,
    {
        if batch.iter().any(|event| matches!(event, ChangeEvent::ReloadAll)) {
            *self = Self::from_source(source)?;
            return Ok(());
        }

        self.apply_sections(batch, source)?;
        self.apply_items(batch, source)?;

        for event in batch {
            if let ChangeEvent::ReloadSections(sections) = event {
                for &section in sections {
                    let items = source.section_items(section)?;
                    let count = self.sections.len();
                    let slot = self
                        .sections
                        .get_mut(section)
                        .ok_or_else(|| SourceError::section(section, count))?;
                    *slot = items;
                }
            }
        }
        Ok(())
    }

    fn apply_sections<S>(&mut self, batch: &ChangeBatch, source: &S) -> SourceResult<()>
    where
        S: DataSource<Item = T> + ?Sized,
    {
        let mut removals = Vec::new();
        let mut insertions = Vec::new();
        for event in batch {
            match event {
                ChangeEvent::DeleteSections(sections) => removals.extend_from_slice(sections),
                ChangeEvent::InsertSections(sections) => {
                    insertions.extend(sections.iter().map(|&section| (section, None)));
                }
                ChangeEvent::MoveSection { from, to } => {
                    removals.push(*from);
                    insertions.push((*to, Some(*from)));
                }
                _ => {}
            }
        }

        removals.sort_unstable_by(|a, b| b.cmp(a));
        removals.dedup();
        let old_count = self.sections.len();
        let mut removed = HashMap::with_capacity(removals.len());
        for section in removals {
            if section >= self.sections.len() {
                return Err(SourceError::section(section, old_count));
            }
            removed.insert(section, self.sections.remove(section));
        }

        insertions.sort_unstable_by_key(|&(section, _)| section);
        for (section, moved_from) in insertions {
            if section > self.sections.len() {
                return Err(SourceError::section(section, self.sections.len()));
            }
            let items = match moved_from {
                Some(from) => removed
                    .remove(&from)
                    .ok_or_else(|| SourceError::section(from, old_count))?,
                None => source.section_items(section)?,
            };
            self.sections.insert(section, items);
        }
        Ok(())
    }

    fn apply_items<S>(&mut self, batch: &ChangeBatch, source: &S) -> SourceResult<()>
    where
        S: DataSource<Item = T> + ?Sized,
    {
        let mut ops: BTreeMap<usize, ItemOps> = BTreeMap::new();
        for event in batch {
            match event {
                ChangeEvent::DeleteItems(positions) => {
                    for p in positions {
                        ops.entry(p.section).or_insert_with(ItemOps::new).removals.push(p.item);
                    }
                }
                ChangeEvent::InsertItems(positions) => {
                    for p in positions {
                        ops.entry(p.section)
                            .or_insert_with(ItemOps::new)
                            .insertions
                            .push((p.item, None));
                    }
                }
                ChangeEvent::MoveItem { from, to } => {
                    ops.entry(from.section).or_insert_with(ItemOps::new).removals.push(from.item);
                    ops.entry(to.section)
                        .or_insert_with(ItemOps::new)
                        .insertions
                        .push((to.item, Some(*from)));
                }
                _ => {}
            }
        }

        let section_count = self.sections.len();
        let mut removed: HashMap<Position, T> = HashMap::new();
        let mut old_counts: HashMap<usize, usize> = HashMap::new();
        for (&section, op) in ops.iter_mut() {
            let items = self
                .sections
                .get_mut(section)
                .ok_or_else(|| SourceError::section(section, section_count))?;
            op.removals.sort_unstable_by(|a, b| b.cmp(a));
            op.removals.dedup();
            let old_count = items.len();
            old_counts.insert(section, old_count);
            for &item in &op.removals {
                if item >= items.len() {
                    return Err(SourceError::item(section, item, old_count));
                }
                removed.insert(Position::new(section, item), items.remove(item));
            }
        }

        for (section, mut op) in ops {
            op.insertions.sort_unstable_by_key(|&(item, _)| item);
            for (item, moved_from) in op.insertions {
                let value = match moved_from {
                    Some(from) => removed.remove(&from).ok_or_else(|| {
                        // Only reachable when two moves share a source.
                        match old_counts.get(&from.section) {
                            Some(&count) => SourceError::item(from.section, from.item, count),
                            None => SourceError::section(from.section, section_count),
                        }
                    })?,
                    None => source.item(Position::new(section, item))?,
                };
                let items = self
                    .sections
                    .get_mut(section)
                    .ok_or_else(|| SourceError::section(section, section_count))?;
                if item > items.len() {
                    return Err(SourceError::item(section, item, items.len()));
                }
                items.insert(item, value);
            }
        }

        for event in batch {
            if let ChangeEvent::ReloadItems(positions) = event {
                for &position in positions {
                    let value = source.item(position)?;
                    let items = self
                        .sections
                        .get_mut(position.section)
                        .ok_or_else(|| SourceError::section(position.section, section_count))?;
                    let count = items.len();
                    let slot = items
                        .get_mut(position.item)
                        .ok_or_else(|| SourceError::item(position.section, position.item, count))?;
                    *slot = value;
                }
            }
        }
        Ok(())
    }
}
