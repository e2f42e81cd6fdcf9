//! Error types for data sources.

/// Result type alias for data source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Errors returned by data source reads and mutations.
///
/// Every variant is an out-of-range condition. They are detected before any
/// state changes, so a failed call leaves the source untouched and emits
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// A section index is past the end of the source.
    #[error("section {section} is out of range (section count {count})")]
    SectionOutOfRange { section: usize, count: usize },

    /// An item index is past the end of its section.
    #[error("item {item} in section {section} is out of range (item count {count})")]
    ItemOutOfRange {
        section: usize,
        item: usize,
        count: usize,
    },

    /// A range of items is reversed or extends past the end of its section.
    #[error("item range {start}..{end} is out of range (item count {count})")]
    RangeOutOfRange {
        start: usize,
        end: usize,
        count: usize,
    },
}

impl SourceError {
    /// Create a section error.
    pub fn section(section: usize, count: usize) -> Self {
        Self::SectionOutOfRange { section, count }
    }

    /// Create an item error.
    pub fn item(section: usize, item: usize, count: usize) -> Self {
        Self::ItemOutOfRange {
            section,
            item,
            count,
        }
    }

    /// Create a range error.
    pub fn range(range: &std::ops::Range<usize>, count: usize) -> Self {
        Self::RangeOutOfRange {
            start: range.start,
            end: range.end,
            count,
        }
    }

    /// Returns `true` for the out-of-range kind (currently every variant).
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::SectionOutOfRange { .. } | Self::ItemOutOfRange { .. } | Self::RangeOutOfRange { .. }
        )
    }
}
