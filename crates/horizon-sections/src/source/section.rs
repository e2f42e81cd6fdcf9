//! Sections: the outer level of the two-level hierarchy.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque supplementary payload attached to a section (header, footer, ...).
///
/// Payloads are shared, never inspected by the diff engine, and can be
/// recovered with [`Section::supplementary_as`].
pub type Supplementary = Arc<dyn Any + Send + Sync>;

/// An ordered group of items plus keyed supplementary metadata.
///
/// # Example
///
/// ```
/// use horizon_sections::source::Section;
///
/// let section = Section::new(vec![1, 2, 3]).with_supplementary("header", "Numbers".to_string());
///
/// assert_eq!(section.len(), 3);
/// assert_eq!(
///     section.supplementary_as::<String>("header").map(String::as_str),
///     Some("Numbers")
/// );
/// ```
pub struct Section<T> {
    items: Vec<T>,
    supplementary: HashMap<String, Supplementary>,
}

impl<T> Section<T> {
    /// Creates a section with the given items and no metadata.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            supplementary: HashMap::new(),
        }
    }

    /// Creates an empty section.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Attaches a supplementary value under `kind` (builder form).
    pub fn with_supplementary<V>(mut self, kind: impl Into<String>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.set_supplementary(kind, value);
        self
    }

    /// The items, in order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Mutable access to the items.
    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    /// Consumes the section, returning its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the section has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the supplementary payload stored under `kind`.
    pub fn supplementary(&self, kind: &str) -> Option<Supplementary> {
        self.supplementary.get(kind).cloned()
    }

    /// Returns the supplementary payload under `kind` if it is a `V`.
    pub fn supplementary_as<V: Any>(&self, kind: &str) -> Option<&V> {
        self.supplementary.get(kind)?.downcast_ref::<V>()
    }

    /// Stores a supplementary value under `kind`, replacing any previous one.
    pub fn set_supplementary<V>(&mut self, kind: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.supplementary.insert(kind.into(), Arc::new(value));
    }

    /// Stores an already shared payload under `kind`.
    pub fn set_supplementary_shared(&mut self, kind: impl Into<String>, value: Supplementary) {
        self.supplementary.insert(kind.into(), value);
    }

    /// Removes and returns the payload stored under `kind`.
    pub fn remove_supplementary(&mut self, kind: &str) -> Option<Supplementary> {
        self.supplementary.remove(kind)
    }

    /// The kinds that currently carry a payload, sorted.
    pub fn supplementary_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.supplementary.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl<T: Clone> Clone for Section<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            supplementary: self.supplementary.clone(),
        }
    }
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Vec<T>> for Section<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for Section<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("items", &self.items)
            .field("supplementary", &self.supplementary_kinds())
            .finish()
    }
}
