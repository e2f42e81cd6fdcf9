//! Core systems for Horizon Sections.
//!
//! This crate provides the transport primitives that data sources build on:
//!
//! - **Signal/Slot System**: An ordered, synchronous event channel
//! - **Property System**: A value container that notifies on every write
//! - **Logging**: Tracing targets and span helpers
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_sections_core::Signal;
//!
//! let reloaded = Signal::<usize>::new();
//! let guard = reloaded.connect_scoped(|section| println!("section {section} reloaded"));
//!
//! reloaded.emit(3);
//! drop(guard);
//! assert_eq!(reloaded.connection_count(), 0);
//! ```
//!
//! # Property Example
//!
//! ```
//! use horizon_sections_core::Property;
//!
//! let title = Property::new(String::from("Inbox"));
//! let subscription = title.changed().subscribe(|_| println!("title replaced"));
//!
//! title.set(String::from("Archive"));
//! assert_eq!(title.get(), "Archive");
//!
//! subscription.dispose();
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::PerfSpan;
pub use property::{Property, ReadOnlyProperty};
pub use signal::{ConnectionGuard, ConnectionId, Signal, Subscription};
