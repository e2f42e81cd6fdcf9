//! Horizon Sections - observable sectioned data sources with automatic diffing.
//!
//! This is the main crate. It re-exports the transport primitives of
//! `horizon-sections-core` and provides the [`source`] module.
//!
//! # Example
//!
//! ```
//! use horizon_sections::source::{
//!     AutoDiffConfig, AutoDiffSource, ChangeEvent, DataSource, Section,
//! };
//!
//! fn same_title(a: &Section<&'static str>, b: &Section<&'static str>) -> bool {
//!     a.supplementary_as::<&str>("title") == b.supplementary_as::<&str>("title")
//! }
//!
//! let source = AutoDiffSource::new(
//!     vec![
//!         Section::new(vec!["milk", "eggs"]).with_supplementary("title", "Groceries"),
//!         Section::new(vec!["lamp"]).with_supplementary("title", "Hardware"),
//!     ],
//!     AutoDiffConfig::with_item_equality(same_title).with_item_moves(true),
//! );
//!
//! let subscription = source.events().subscribe(|batch| {
//!     for event in batch {
//!         println!("{event}");
//!     }
//! });
//!
//! let batch = source.set_sections(vec![
//!     Section::new(vec!["lamp"]).with_supplementary("title", "Hardware"),
//!     Section::new(vec!["eggs", "milk"]).with_supplementary("title", "Groceries"),
//! ]);
//! assert_eq!(batch.move_count(), 2);
//! assert!(batch.iter().all(|event| !matches!(event, ChangeEvent::ReloadAll)));
//!
//! subscription.dispose();
//! ```

pub use horizon_sections_core::*;

pub mod source;
