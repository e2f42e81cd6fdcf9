//! Observable sectioned data sources.
//!
//! A data source holds an ordered list of sections, each an ordered list of
//! items plus opaque supplementary payloads, and publishes a
//! [`ChangeBatch`] on its [`events`](DataSource::events) signal whenever that
//! content changes. Consumers apply batches incrementally instead of
//! re-reading everything.
//!
//! # Core Types
//!
//! - [`DataSource`]: The trait every source implements
//! - [`Section`]: Items plus supplementary payloads
//! - [`Position`]: Section index plus item index
//! - [`ChangeEvent`] / [`ChangeBatch`]: What changed, in which index space
//!
//! # Source Implementations
//!
//! - [`MutableSource`]: One section edited through explicit calls
//! - [`AutoDiffSource`]: Replaceable sections, diffed against the previous state
//!
//! # Consumers
//!
//! - [`SectionMirror`]: Reference application of batches to a local copy
//! - [`BatchDebug`]: Readable batch listings
//!
//! # Architecture Overview
//!
//! ```text
//! ┌───────────────┐  set_sections  ┌─────────────┐
//! │ AutoDiffSource│───────────────>│ diff engine │
//! └───────────────┘                └─────────────┘
//!         │                               │
//!         │         ┌──────────────┐      │ ChangeBatch
//!         └────────>│    events    │<─────┘
//!  MutableSource───>│ Signal<Batch>│
//!                   └──────────────┘
//!                          │
//!                          v
//!                   ┌──────────────┐
//!                   │ SectionMirror│  (or a view binding)
//!                   └──────────────┘
//! ```

mod auto_diff;
mod debug;
pub mod diff;
mod error;
mod event;
mod mirror;
mod mutable_source;
mod section;
mod traits;

pub use auto_diff::{
    AutoDiffConfig, AutoDiffSource, ItemCompareFn, SectionCompareFn, diff_sections,
};
pub use debug::{BatchDebug, BatchFormatOptions};
pub use diff::{EditScript, Move};
pub use error::{SourceError, SourceResult};
pub use event::{ChangeBatch, ChangeEvent, ChangeKind, Position};
pub use mirror::SectionMirror;
pub use mutable_source::MutableSource;
pub use section::{Section, Supplementary};
pub use traits::DataSource;
