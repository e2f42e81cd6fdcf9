//! Directly editable single-section source.
//!
//! `MutableSource<T>` owns one ordered list of items (section 0) and turns
//! every successful mutation into exactly one change event. Bounds are
//! checked before anything is touched, so a rejected call neither mutates
//! nor emits.

use std::any::Any;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use horizon_sections_core::Signal;
use horizon_sections_core::logging::targets;
use parking_lot::RwLock;

use super::error::{SourceError, SourceResult};
use super::event::{ChangeBatch, ChangeEvent, Position};
use super::section::Supplementary;
use super::traits::DataSource;

const SECTION: usize = 0;

/// A single-section data source mutated through explicit calls.
///
/// # Emitted Events
///
/// | Call | Event |
/// |------|-------|
/// | [`insert`](Self::insert) / [`push`](Self::push) | `InsertItems` for the new positions |
/// | [`delete`](Self::delete) / [`remove`](Self::remove) / [`clear`](Self::clear) | `DeleteItems`, descending |
/// | [`replace`](Self::replace) | `ReloadItems` for that position |
/// | [`move_item`](Self::move_item) | one `MoveItem` |
/// | [`replace_all`](Self::replace_all) | `ReloadSections([0])` |
/// | [`reload_all`](Self::reload_all) | `ReloadAll` |
///
/// Calls that change nothing (inserting no items, deleting an empty range,
/// moving an item onto itself) emit nothing.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{ChangeEvent, DataSource, MutableSource, Position};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// let source = MutableSource::new(vec![1, 2, 3, 4, 5]);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let seen_clone = seen.clone();
/// source.events().connect(move |batch| seen_clone.lock().push(batch.clone()));
///
/// source.insert(vec![42], 2).unwrap();
/// assert_eq!(source.len(), 6);
/// assert_eq!(
///     seen.lock()[0].events(),
///     &[ChangeEvent::InsertItems(vec![Position::new(0, 2)])]
/// );
/// ```
pub struct MutableSource<T> {
    items: RwLock<Vec<T>>,
    supplementary: RwLock<HashMap<String, Supplementary>>,
    events: Signal<ChangeBatch>,
}

impl<T: Send + Sync + 'static> MutableSource<T> {
    /// Creates a source holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            supplementary: RwLock::new(HashMap::new()),
            events: Signal::new(),
        }
    }

    /// Creates an empty source.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns a reference to the items (read-only access).
    ///
    /// Mutating the source while the guard is alive deadlocks.
    pub fn items(&self) -> impl std::ops::Deref<Target = Vec<T>> + '_ {
        self.items.read()
    }

    /// Inserts `new_items` so the first of them lands at `index`.
    ///
    /// `index` may equal `len()`.
    pub fn insert(&self, new_items: Vec<T>, index: usize) -> SourceResult<()> {
        let count = new_items.len();
        {
            let mut items = self.items.write();
            if index > items.len() {
                return Err(SourceError::item(SECTION, index, items.len()));
            }
            if count == 0 {
                return Ok(());
            }
            items.splice(index..index, new_items);
        }

        tracing::debug!(target: targets::SOURCE, index, count, "inserted items");
        self.publish(ChangeEvent::InsertItems(
            (index..index + count).map(at).collect(),
        ));
        Ok(())
    }

    /// Appends one item.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.write();
            items.push(item);
            items.len() - 1
        };

        tracing::debug!(target: targets::SOURCE, index, "pushed item");
        self.publish(ChangeEvent::InsertItems(vec![at(index)]));
    }

    /// Deletes the items in `range`.
    pub fn delete(&self, range: Range<usize>) -> SourceResult<()> {
        {
            let mut items = self.items.write();
            if range.start > range.end || range.end > items.len() {
                return Err(SourceError::range(&range, items.len()));
            }
            if range.is_empty() {
                return Ok(());
            }
            items.drain(range.clone());
        }

        tracing::debug!(
            target: targets::SOURCE,
            start = range.start,
            end = range.end,
            "deleted items"
        );
        self.publish(ChangeEvent::DeleteItems(range.rev().map(at).collect()));
        Ok(())
    }

    /// Removes and returns the item at `index`.
    pub fn remove(&self, index: usize) -> SourceResult<T> {
        let removed = {
            let mut items = self.items.write();
            if index >= items.len() {
                return Err(SourceError::item(SECTION, index, items.len()));
            }
            items.remove(index)
        };

        tracing::debug!(target: targets::SOURCE, index, "removed item");
        self.publish(ChangeEvent::DeleteItems(vec![at(index)]));
        Ok(removed)
    }

    /// Deletes every item.
    pub fn clear(&self) {
        let count = std::mem::take(&mut *self.items.write()).len();
        if count == 0 {
            return;
        }

        tracing::debug!(target: targets::SOURCE, count, "cleared items");
        self.publish(ChangeEvent::DeleteItems((0..count).rev().map(at).collect()));
    }

    /// Overwrites the item at `index` in place.
    pub fn replace(&self, index: usize, item: T) -> SourceResult<()> {
        {
            let mut items = self.items.write();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| SourceError::item(SECTION, index, len))?;
            *slot = item;
        }

        tracing::debug!(target: targets::SOURCE, index, "replaced item");
        self.publish(ChangeEvent::ReloadItems(vec![at(index)]));
        Ok(())
    }

    /// Moves the item at `from` so that it ends up at `to`.
    ///
    /// Both indices address the current list; the result is the same as
    /// removing at `from` and then inserting at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> SourceResult<()> {
        {
            let mut items = self.items.write();
            let len = items.len();
            if from >= len {
                return Err(SourceError::item(SECTION, from, len));
            }
            if to >= len {
                return Err(SourceError::item(SECTION, to, len));
            }
            if from == to {
                return Ok(());
            }
            let item = items.remove(from);
            items.insert(to, item);
        }

        tracing::debug!(target: targets::SOURCE, from, to, "moved item");
        self.publish(ChangeEvent::MoveItem {
            from: at(from),
            to: at(to),
        });
        Ok(())
    }

    /// Replaces the whole item list.
    ///
    /// Consumers are told to reload section 0; no item-level delta is computed.
    pub fn replace_all(&self, items: Vec<T>) {
        let count = items.len();
        *self.items.write() = items;

        tracing::debug!(target: targets::SOURCE, count, "replaced all items");
        self.publish(ChangeEvent::ReloadSections(vec![SECTION]));
    }

    /// Tells consumers to re-read everything without changing any state.
    pub fn reload_all(&self) {
        self.publish(ChangeEvent::ReloadAll);
    }

    /// Stores a supplementary value under `kind`. Emits nothing.
    pub fn set_supplementary<V>(&self, kind: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.supplementary.write().insert(kind.into(), Arc::new(value));
    }

    /// Removes and returns the payload under `kind`. Emits nothing.
    pub fn remove_supplementary(&self, kind: &str) -> Option<Supplementary> {
        self.supplementary.write().remove(kind)
    }

    fn publish(&self, event: ChangeEvent) {
        self.events.emit(ChangeBatch::single(event));
    }
}

impl<T: Clone + Send + Sync + 'static> MutableSource<T> {
    /// Returns a clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }
}

impl<T: Send + Sync + 'static> Default for MutableSource<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MutableSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.supplementary.read().keys().cloned().collect();
        kinds.sort_unstable();
        f.debug_struct("MutableSource")
            .field("items", &*self.items.read())
            .field("supplementary", &kinds)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> DataSource for MutableSource<T> {
    type Item = T;

    fn section_count(&self) -> usize {
        1
    }

    fn item_count(&self, section: usize) -> SourceResult<usize> {
        if section != SECTION {
            return Err(SourceError::section(section, 1));
        }
        Ok(self.len())
    }

    fn item(&self, position: Position) -> SourceResult<T> {
        if position.section != SECTION {
            return Err(SourceError::section(position.section, 1));
        }
        let items = self.items.read();
        items
            .get(position.item)
            .cloned()
            .ok_or_else(|| SourceError::item(SECTION, position.item, items.len()))
    }

    fn supplementary(&self, kind: &str, section: usize) -> Option<Supplementary> {
        if section != SECTION {
            return None;
        }
        self.supplementary.read().get(kind).cloned()
    }

    fn events(&self) -> &Signal<ChangeBatch> {
        &self.events
    }
}

fn at(item: usize) -> Position {
    Position::new(SECTION, item)
}

static_assertions::assert_impl_all!(MutableSource<String>: Send, Sync);
