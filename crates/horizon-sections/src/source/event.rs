//! Change events emitted by data sources.
//!
//! A data source never tells its consumers "everything changed" unless it
//! has to. Instead it publishes a [`ChangeBatch`]: an ordered list of
//! [`ChangeEvent`]s describing the structural edits between the previous
//! state and the current one.
//!
//! # Index Spaces
//!
//! A batch is applied as one unit against the state that preceded it:
//!
//! - Delete indices and move sources refer to the **previous** state.
//! - Insert indices, move destinations and reloads refer to the **new** state.
//! - The section of an item-level position is always the section's index in
//!   the **new** state.
//!
//! Sources emit section-level events first (deletes descending, inserts
//! ascending, moves ascending by destination), then item-level events grouped
//! by section in ascending order. See [`SectionMirror`](super::SectionMirror)
//! for the reference application procedure.

use std::fmt;

/// A two-level address: section index and item index within that section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Zero-based section index.
    pub section: usize,
    /// Zero-based item index within the section.
    pub item: usize,
}

impl Position {
    /// Creates a position.
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

/// The kind of a [`ChangeEvent`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    InsertSections,
    DeleteSections,
    ReloadSections,
    MoveSection,
    InsertItems,
    DeleteItems,
    ReloadItems,
    MoveItem,
    ReloadAll,
}

/// A single structural edit.
///
/// Index-set variants must never be empty; [`ChangeBatch::push`] refuses
/// empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeEvent {
    /// Sections inserted at these new-state indices.
    InsertSections(Vec<usize>),
    /// Sections deleted from these previous-state indices.
    DeleteSections(Vec<usize>),
    /// Sections whose whole content should be re-read.
    ReloadSections(Vec<usize>),
    /// One section moved from a previous-state index to a new-state index.
    MoveSection { from: usize, to: usize },
    /// Items inserted at these positions.
    InsertItems(Vec<Position>),
    /// Items deleted from these positions.
    DeleteItems(Vec<Position>),
    /// Items whose content should be re-read.
    ReloadItems(Vec<Position>),
    /// One item moved within its section.
    MoveItem { from: Position, to: Position },
    /// Everything should be re-read.
    ReloadAll,
}

impl ChangeEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::InsertSections(_) => ChangeKind::InsertSections,
            Self::DeleteSections(_) => ChangeKind::DeleteSections,
            Self::ReloadSections(_) => ChangeKind::ReloadSections,
            Self::MoveSection { .. } => ChangeKind::MoveSection,
            Self::InsertItems(_) => ChangeKind::InsertItems,
            Self::DeleteItems(_) => ChangeKind::DeleteItems,
            Self::ReloadItems(_) => ChangeKind::ReloadItems,
            Self::MoveItem { .. } => ChangeKind::MoveItem,
            Self::ReloadAll => ChangeKind::ReloadAll,
        }
    }

    /// Returns `true` for events addressing whole sections (including `ReloadAll`).
    pub fn is_section_level(&self) -> bool {
        matches!(
            self,
            Self::InsertSections(_)
                | Self::DeleteSections(_)
                | Self::ReloadSections(_)
                | Self::MoveSection { .. }
                | Self::ReloadAll
        )
    }

    /// Returns `true` for events addressing individual items.
    pub fn is_item_level(&self) -> bool {
        !self.is_section_level()
    }

    /// Returns `true` for an index-set event that carries no indices.
    ///
    /// Such an event is malformed and is never emitted by this crate.
    pub fn is_empty(&self) -> bool {
        self.index_count() == 0
    }

    /// Number of sections or items this event addresses.
    ///
    /// Moves count as one; `ReloadAll` counts as one.
    pub fn index_count(&self) -> usize {
        match self {
            Self::InsertSections(v) | Self::DeleteSections(v) | Self::ReloadSections(v) => v.len(),
            Self::InsertItems(v) | Self::DeleteItems(v) | Self::ReloadItems(v) => v.len(),
            Self::MoveSection { .. } | Self::MoveItem { .. } | Self::ReloadAll => 1,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::InsertSections(v) => write!(f, "insert sections {}", join(v)),
            Self::DeleteSections(v) => write!(f, "delete sections {}", join(v)),
            Self::ReloadSections(v) => write!(f, "reload sections {}", join(v)),
            Self::MoveSection { from, to } => write!(f, "move section {from} -> {to}"),
            Self::InsertItems(v) => write!(f, "insert items {}", join(v)),
            Self::DeleteItems(v) => write!(f, "delete items {}", join(v)),
            Self::ReloadItems(v) => write!(f, "reload items {}", join(v)),
            Self::MoveItem { from, to } => write!(f, "move item {from} -> {to}"),
            Self::ReloadAll => write!(f, "reload all"),
        }
    }
}

/// The ordered events produced by one diff or one mutation.
///
/// Consumers must apply a batch as a unit; see the module docs for the
/// index spaces involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeBatch {
    events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch holding a single event.
    pub fn single(event: ChangeEvent) -> Self {
        let mut batch = Self::new();
        batch.push(event);
        batch
    }

    /// Appends an event.
    ///
    /// Events with an empty index set are dropped; producing one is a bug in
    /// the producer and trips a debug assertion.
    pub fn push(&mut self, event: ChangeEvent) {
        debug_assert!(!event.is_empty(), "empty change event: {event:?}");
        if !event.is_empty() {
            self.events.push(event);
        }
    }

    /// Appends every event of another batch.
    pub fn extend(&mut self, other: ChangeBatch) {
        self.events.extend(other.events);
    }

    /// The events in emission order.
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Iterates over the events in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of inserted sections and items.
    pub fn insert_count(&self) -> usize {
        self.count_where(|kind| matches!(kind, ChangeKind::InsertSections | ChangeKind::InsertItems))
    }

    /// Number of deleted sections and items.
    pub fn delete_count(&self) -> usize {
        self.count_where(|kind| matches!(kind, ChangeKind::DeleteSections | ChangeKind::DeleteItems))
    }

    /// Number of move events.
    pub fn move_count(&self) -> usize {
        self.count_where(|kind| matches!(kind, ChangeKind::MoveSection | ChangeKind::MoveItem))
    }

    /// Number of reloaded sections and items (`ReloadAll` counts as one).
    pub fn reload_count(&self) -> usize {
        self.count_where(|kind| {
            matches!(
                kind,
                ChangeKind::ReloadSections | ChangeKind::ReloadItems | ChangeKind::ReloadAll
            )
        })
    }

    fn count_where(&self, pred: impl Fn(ChangeKind) -> bool) -> usize {
        self.events
            .iter()
            .filter(|event| pred(event.kind()))
            .map(ChangeEvent::index_count)
            .sum()
    }

    /// Consumes the batch, returning its events.
    pub fn into_events(self) -> Vec<ChangeEvent> {
        self.events
    }
}

impl IntoIterator for ChangeBatch {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeBatch {
    type Item = &'a ChangeEvent;
    type IntoIter = std::slice::Iter<'a, ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl From<ChangeEvent> for ChangeBatch {
    fn from(event: ChangeEvent) -> Self {
        Self::single(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        let mut positions = vec![Position::new(1, 0), Position::new(0, 3), Position::new(0, 1)];
        positions.sort();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 3), Position::new(1, 0)]
        );
        assert_eq!(Position::new(2, 5).to_string(), "[2, 5]");
    }

    #[test]
    fn test_event_levels() {
        assert!(ChangeEvent::ReloadAll.is_section_level());
        assert!(ChangeEvent::MoveSection { from: 0, to: 1 }.is_section_level());
        assert!(ChangeEvent::InsertItems(vec![Position::new(0, 0)]).is_item_level());
        assert_eq!(
            ChangeEvent::DeleteItems(vec![Position::new(0, 0)]).kind(),
            ChangeKind::DeleteItems
        );
    }

    #[test]
    fn test_batch_counts() {
        let mut batch = ChangeBatch::new();
        batch.push(ChangeEvent::DeleteSections(vec![3, 1]));
        batch.push(ChangeEvent::InsertSections(vec![0]));
        batch.push(ChangeEvent::MoveSection { from: 2, to: 1 });
        batch.push(ChangeEvent::InsertItems(vec![
            Position::new(1, 0),
            Position::new(1, 1),
        ]));
        batch.push(ChangeEvent::ReloadItems(vec![Position::new(1, 4)]));

        assert_eq!(batch.len(), 5);
        assert_eq!(batch.delete_count(), 2);
        assert_eq!(batch.insert_count(), 3);
        assert_eq!(batch.move_count(), 1);
        assert_eq!(batch.reload_count(), 1);
    }

    #[test]
    fn test_display() {
        let event = ChangeEvent::DeleteItems(vec![Position::new(0, 2), Position::new(0, 1)]);
        assert_eq!(event.to_string(), "delete items [0, 2], [0, 1]");
        assert_eq!(
            ChangeEvent::MoveSection { from: 0, to: 1 }.to_string(),
            "move section 0 -> 1"
        );
    }

    #[test]
    fn test_batch_iteration_preserves_order() {
        let batch: ChangeBatch = ChangeEvent::ReloadAll.into();
        let mut other = ChangeBatch::single(ChangeEvent::ReloadSections(vec![0]));
        other.extend(batch);

        let kinds: Vec<_> = other.iter().map(ChangeEvent::kind).collect();
        assert_eq!(kinds, vec![ChangeKind::ReloadSections, ChangeKind::ReloadAll]);
    }
}
