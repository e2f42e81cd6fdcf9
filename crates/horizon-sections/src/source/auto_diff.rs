//! Section source that diffs every replacement against the previous snapshot.

use std::fmt;
use std::sync::Arc;

use horizon_sections_core::logging::targets;
use horizon_sections_core::{PerfSpan, Property, ReadOnlyProperty, Signal};

use super::diff::{diff, diff_with_content};
use super::error::{SourceError, SourceResult};
use super::event::{ChangeBatch, Position};
use super::section::{Section, Supplementary};
use super::traits::DataSource;

/// Decides whether two sections are the same section.
pub type SectionCompareFn<T> = Arc<dyn Fn(&Section<T>, &Section<T>) -> bool + Send + Sync>;

/// Compares two items.
pub type ItemCompareFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// How an [`AutoDiffSource`] matches sections and items.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{AutoDiffConfig, Section};
///
/// let config = AutoDiffConfig::<u32>::with_item_equality(|a: &Section<u32>, b: &Section<u32>| {
///     a.supplementary_as::<&str>("id") == b.supplementary_as::<&str>("id")
/// })
/// .with_item_moves(true);
///
/// assert!(config.find_item_moves);
/// ```
pub struct AutoDiffConfig<T> {
    /// Section identity.
    pub compare_sections: SectionCompareFn<T>,
    /// Item identity within a matched section pair.
    pub compare_items: ItemCompareFn<T>,
    /// Content comparison for matched items; a difference becomes a reload.
    pub item_content: Option<ItemCompareFn<T>>,
    /// Emit moves instead of delete + insert pairs.
    pub find_item_moves: bool,
}

impl<T> AutoDiffConfig<T> {
    /// Creates a configuration from the two identity comparators.
    ///
    /// Move detection is off and no content comparison is made.
    pub fn new<S, I>(compare_sections: S, compare_items: I) -> Self
    where
        S: Fn(&Section<T>, &Section<T>) -> bool + Send + Sync + 'static,
        I: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            compare_sections: Arc::new(compare_sections),
            compare_items: Arc::new(compare_items),
            item_content: None,
            find_item_moves: false,
        }
    }

    /// Enables or disables move detection.
    pub fn with_item_moves(mut self, find_item_moves: bool) -> Self {
        self.find_item_moves = find_item_moves;
        self
    }

    /// Adds a content comparison for matched items.
    pub fn with_item_content<F>(mut self, same_content: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.item_content = Some(Arc::new(same_content));
        self
    }
}

impl<T: PartialEq + 'static> AutoDiffConfig<T> {
    /// Creates a configuration that compares items with `==`.
    pub fn with_item_equality<S>(compare_sections: S) -> Self
    where
        S: Fn(&Section<T>, &Section<T>) -> bool + Send + Sync + 'static,
    {
        Self::new(compare_sections, |a: &T, b: &T| a == b)
    }
}

impl<T> Clone for AutoDiffConfig<T> {
    fn clone(&self) -> Self {
        Self {
            compare_sections: self.compare_sections.clone(),
            compare_items: self.compare_items.clone(),
            item_content: self.item_content.clone(),
            find_item_moves: self.find_item_moves,
        }
    }
}

impl<T> fmt::Debug for AutoDiffConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoDiffConfig")
            .field("item_content", &self.item_content.is_some())
            .field("find_item_moves", &self.find_item_moves)
            .finish_non_exhaustive()
    }
}

/// Computes the batch that turns `old` into `new`.
///
/// Section-level events come first; item-level events follow for every
/// matched section pair, addressed by the section's new index.
pub fn diff_sections<T>(
    old: &[Section<T>],
    new: &[Section<T>],
    config: &AutoDiffConfig<T>,
) -> ChangeBatch {
    let _span = tracing::trace_span!(
        target: targets::DIFF,
        "diff_sections",
        old_sections = old.len(),
        new_sections = new.len()
    )
    .entered();

    let compare_sections = &*config.compare_sections;
    let compare_items = &*config.compare_items;

    let sections = diff(old, new, compare_sections, config.find_item_moves);

    let mut batch = ChangeBatch::new();
    sections.append_section_events(&mut batch);

    for &(old_index, new_index) in sections.matches() {
        let (old_items, new_items) = (old[old_index].items(), new[new_index].items());
        let items = match config.item_content.as_deref() {
            Some(same_content) => diff_with_content(
                old_items,
                new_items,
                compare_items,
                same_content,
                config.find_item_moves,
            ),
            None => diff(old_items, new_items, compare_items, config.find_item_moves),
        };
        items.append_item_events(new_index, &mut batch);
    }

    batch
}

/// A data source over a replaceable collection of sections.
///
/// Every [`set_sections`](Self::set_sections) diffs the new collection
/// against the current one and publishes the result as one batch before
/// returning. Reads always reflect the most recently set collection.
///
/// Writers are expected to be serialized by the caller; two concurrent
/// `set_sections` calls may publish their batches in either order.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{AutoDiffConfig, AutoDiffSource, ChangeEvent, DataSource, Section};
///
/// let config = AutoDiffConfig::with_item_equality(|a: &Section<i32>, b: &Section<i32>| {
///     a.supplementary_as::<&str>("id") == b.supplementary_as::<&str>("id")
/// });
/// let source = AutoDiffSource::new(
///     vec![Section::new(vec![1, 2, 3]).with_supplementary("id", "numbers")],
///     config,
/// );
///
/// let batch = source.set_sections(vec![
///     Section::new(vec![1, 3, 4]).with_supplementary("id", "numbers"),
/// ]);
/// assert_eq!(batch.delete_count(), 1);
/// assert_eq!(batch.insert_count(), 1);
/// assert_eq!(source.item_count(0).unwrap(), 3);
/// ```
pub struct AutoDiffSource<T> {
    sections: Property<Vec<Section<T>>>,
    config: AutoDiffConfig<T>,
    events: Signal<ChangeBatch>,
}

impl<T: Send + Sync + 'static> AutoDiffSource<T> {
    /// Creates a source holding `sections`.
    pub fn new(sections: Vec<Section<T>>, config: AutoDiffConfig<T>) -> Self {
        Self {
            sections: Property::new(sections),
            config,
            events: Signal::new(),
        }
    }

    /// Replaces the sections and publishes the resulting batch.
    ///
    /// Returns the batch. An empty batch is not published.
    pub fn set_sections(&self, sections: Vec<Section<T>>) -> ChangeBatch {
        let _perf = PerfSpan::new("AutoDiffSource::set_sections");

        let batch = self
            .sections
            .with(|old| diff_sections(old, &sections, &self.config));
        self.sections.set(sections);

        if batch.is_empty() {
            tracing::trace!(target: targets::SOURCE, "sections replaced without changes");
        } else {
            tracing::debug!(
                target: targets::SOURCE,
                events = batch.len(),
                inserts = batch.insert_count(),
                deletes = batch.delete_count(),
                moves = batch.move_count(),
                reloads = batch.reload_count(),
                "publishing batch"
            );
            self.events.emit(batch.clone());
        }
        batch
    }

    /// The property holding the current sections.
    ///
    /// It notifies on every replacement, including ones that produce no
    /// events.
    pub fn sections_property(&self) -> ReadOnlyProperty<'_, Vec<Section<T>>> {
        ReadOnlyProperty::new(&self.sections)
    }

    /// The matching configuration.
    pub fn config(&self) -> &AutoDiffConfig<T> {
        &self.config
    }
}

impl<T: Clone + Send + Sync + 'static> AutoDiffSource<T> {
    /// A snapshot of the current sections.
    pub fn sections(&self) -> Vec<Section<T>> {
        self.sections.get()
    }

    /// Edits a copy of the current sections and sets the result.
    pub fn update<F>(&self, edit: F) -> ChangeBatch
    where
        F: FnOnce(&mut Vec<Section<T>>),
    {
        let mut sections = self.sections();
        edit(&mut sections);
        self.set_sections(sections)
    }
}

impl<T: fmt::Debug> fmt::Debug for AutoDiffSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoDiffSource")
            .field("sections", &self.sections)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> DataSource for AutoDiffSource<T> {
    type Item = T;

    fn section_count(&self) -> usize {
        self.sections.with(Vec::len)
    }

    fn item_count(&self, section: usize) -> SourceResult<usize> {
        self.sections.with(|sections| {
            sections
                .get(section)
                .map(Section::len)
                .ok_or_else(|| SourceError::section(section, sections.len()))
        })
    }

    fn item(&self, position: Position) -> SourceResult<T> {
        self.sections.with(|sections| {
            let section = sections
                .get(position.section)
                .ok_or_else(|| SourceError::section(position.section, sections.len()))?;
            section
                .items()
                .get(position.item)
                .cloned()
                .ok_or_else(|| SourceError::item(position.section, position.item, section.len()))
        })
    }

    fn supplementary(&self, kind: &str, section: usize) -> Option<Supplementary> {
        self.sections
            .with(|sections| sections.get(section)?.supplementary(kind))
    }

    fn events(&self) -> &Signal<ChangeBatch> {
        &self.events
    }
}

static_assertions::assert_impl_all!(AutoDiffSource<String>: Send, Sync);
static_assertions::assert_impl_all!(AutoDiffConfig<String>: Send, Sync, Clone);
