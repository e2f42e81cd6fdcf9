//! Logging facilities for Horizon Sections.
//!
//! Horizon Sections uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_sections=debug")
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! The [`targets`] module lists the targets each subsystem logs under, so
//! filters can be written without guessing module paths.

/// Span names used throughout Horizon Sections for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Signal emission span.
    pub const SIGNAL: &str = "horizon_sections::signal";
    /// Diff computation span.
    pub const DIFF: &str = "horizon_sections::diff";
    /// Batch publication span.
    pub const PUBLISH: &str = "horizon_sections::publish";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_sections_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_sections_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "horizon_sections_core::property";
    /// Data source mutations and batch publication.
    pub const SOURCE: &str = "horizon_sections::source";
    /// Diff engine target.
    pub const DIFF: &str = "horizon_sections::diff";
    /// Timed operations recorded by [`PerfSpan`](super::PerfSpan).
    pub const PERF: &str = "horizon_sections::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
