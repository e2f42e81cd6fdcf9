//! Human-readable listings of change batches for logs and test failures.

use std::fmt::{self, Write};

use super::event::{ChangeBatch, ChangeEvent, ChangeKind};

/// Options for batch formatting.
#[derive(Debug, Clone)]
pub struct BatchFormatOptions {
    /// Whether to list every index or position, or only counts.
    pub show_positions: bool,
    /// Maximum number of events to list (None for unlimited).
    pub max_events: Option<usize>,
    /// Indent size for each event line.
    pub indent_size: usize,
}

impl Default for BatchFormatOptions {
    fn default() -> Self {
        Self {
            show_positions: true,
            max_events: None,
            indent_size: 2,
        }
    }
}

impl BatchFormatOptions {
    /// Create options for compact output: counts only, at most 16 events.
    pub fn compact() -> Self {
        Self {
            show_positions: false,
            max_events: Some(16),
            ..Default::default()
        }
    }
}

/// Formats a [`ChangeBatch`] as an indented listing.
///
/// # Example
///
/// ```
/// use horizon_sections::source::{BatchDebug, ChangeBatch, ChangeEvent, Position};
///
/// let mut batch = ChangeBatch::new();
/// batch.push(ChangeEvent::DeleteSections(vec![2]));
/// batch.push(ChangeEvent::InsertItems(vec![Position::new(0, 1)]));
///
/// let text = BatchDebug::new().format(&batch);
/// assert_eq!(
///     text,
///     "ChangeBatch (2 events):\n  delete sections 2\n  insert items [0, 1]\n"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchDebug {
    options: BatchFormatOptions,
}

impl BatchDebug {
    /// Create a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: BatchFormatOptions) -> Self {
        Self { options }
    }

    /// Format a batch into a new string.
    pub fn format(&self, batch: &ChangeBatch) -> String {
        let mut output = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_batch(batch, &mut output);
        output
    }

    /// Format a batch into any writer.
    pub fn write_batch<W: Write>(&self, batch: &ChangeBatch, out: &mut W) -> fmt::Result {
        let noun = if batch.len() == 1 { "event" } else { "events" };
        writeln!(out, "ChangeBatch ({} {noun}):", batch.len())?;

        if batch.is_empty() {
            return writeln!(out, "{:indent$}(empty)", "", indent = self.options.indent_size);
        }

        let limit = self.options.max_events.unwrap_or(usize::MAX);
        for event in batch.iter().take(limit) {
            write!(out, "{:indent$}", "", indent = self.options.indent_size)?;
            if self.options.show_positions {
                writeln!(out, "{event}")?;
            } else {
                writeln!(out, "{}", summary(event))?;
            }
        }

        let hidden = batch.len().saturating_sub(limit);
        if hidden > 0 {
            writeln!(
                out,
                "{:indent$}... {hidden} more",
                "",
                indent = self.options.indent_size
            )?;
        }
        Ok(())
    }
}

fn summary(event: &ChangeEvent) -> String {
    match event {
        ChangeEvent::MoveSection { .. } | ChangeEvent::MoveItem { .. } | ChangeEvent::ReloadAll => {
            event.to_string()
        }
        other => {
            let label = match other.kind() {
                ChangeKind::InsertSections => "insert sections",
                ChangeKind::DeleteSections => "delete sections",
                ChangeKind::ReloadSections => "reload sections",
                ChangeKind::InsertItems => "insert items",
                ChangeKind::DeleteItems => "delete items",
                _ => "reload items",
            };
            format!("{label} x{}", other.index_count())
        }
    }
}
