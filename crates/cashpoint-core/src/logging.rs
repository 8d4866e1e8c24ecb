//! Tracing targets used across the cashpoint crates.
//!
//! The crates emit through the `tracing` crate and never install a
//! subscriber themselves. Applications choose one, for example:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("cashpoint_model::filter=warn,cashpoint_core=info")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Deferred task queue.
    pub const EVENT_LOOP: &str = "cashpoint_core::event_loop";
    /// Signal/slot system.
    pub const SIGNAL: &str = "cashpoint_core::signal";
    /// Filter escaping and options parsing.
    pub const FILTER: &str = "cashpoint_model::filter";
    /// List model lifecycle and dispatch.
    pub const LIST_MODEL: &str = "cashpoint_model::list_sql_model";
    /// Row store mutations.
    pub const ROW_STORE: &str = "cashpoint_model::row_store";
    /// Settings store.
    pub const SETTINGS: &str = "cashpoint_model::settings";
}

/// A scoped span for timing an operation at `debug` level.
///
/// The span stays entered until the guard is dropped.
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new span named after `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: "cashpoint_core::perf", "perf", operation);
        Self {
            _span: span.entered(),
        }
    }
}
