//! The data source contract.
//!
//! Every source variant implements [`DataSource`]; binding layers and the
//! reference [`SectionMirror`](super::SectionMirror) depend on the trait, not
//! on concrete types.

use horizon_sections_core::Signal;

use super::error::{SourceError, SourceResult};
use super::event::{ChangeBatch, Position};
use super::section::Supplementary;

/// The capability interface of a sectioned data source.
///
/// Reads have no side effects. [`events`](DataSource::events) exposes the
/// channel batches are published on; connecting to it does not replay
/// earlier batches.
///
/// # Implementation Requirements
///
/// - Publish a batch only after the state it describes is readable, so a
///   slot reacting to the batch sees the new state.
/// - Never publish an empty batch.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{DataSource, MutableSource, Position};
///
/// let source = MutableSource::new(vec!["a", "b"]);
/// let subscription = source.events().subscribe(|batch| {
///     println!("{} event(s)", batch.len());
/// });
///
/// source.push("c");
/// assert_eq!(source.item(Position::new(0, 2)).unwrap(), "c");
/// subscription.dispose();
/// ```
pub trait DataSource: Send + Sync {
    /// The item type.
    type Item: Clone + Send + Sync + 'static;

    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of items in `section`.
    fn item_count(&self, section: usize) -> SourceResult<usize>;

    /// The item at `position` (a clone; sources own their items).
    fn item(&self, position: Position) -> SourceResult<Self::Item>;

    /// Supplementary payload of `kind` for `section`, if any.
    fn supplementary(&self, kind: &str, section: usize) -> Option<Supplementary>;

    /// The channel change batches are published on.
    fn events(&self) -> &Signal<ChangeBatch>;

    // -------------------------------------------------------------------------
    // Provided methods
    // -------------------------------------------------------------------------

    /// Returns `true` if there are no sections.
    fn is_empty(&self) -> bool {
        self.section_count() == 0
    }

    /// Number of items across all sections.
    fn total_item_count(&self) -> usize {
        (0..self.section_count())
            .filter_map(|section| self.item_count(section).ok())
            .sum()
    }

    /// Clones every item of `section`.
    fn section_items(&self, section: usize) -> SourceResult<Vec<Self::Item>> {
        let count = self.item_count(section)?;
        (0..count)
            .map(|item| self.item(Position::new(section, item)))
            .collect()
    }

    /// Checks that `position` addresses an existing item.
    fn check_position(&self, position: Position) -> SourceResult<()> {
        let count = self.item_count(position.section)?;
        if position.item < count {
            Ok(())
        } else {
            Err(SourceError::item(position.section, position.item, count))
        }
    }
}
