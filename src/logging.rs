//! Per-call log events for extent queries.
//!
//! A query carries an optional sink in its [`crate::query::QueryOptions`];
//! there is no process-wide subscriber. Messages are closures, so a call
//! without a sink never formats a single string. Contexts where no sink can
//! reach (asynchronous readback completions run on the backend's thread) fall
//! back to the `log` crate facade instead.

use bitflags::bitflags;

bitflags! {
    /// Severity and category bits attached to every query log event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LogFlags: u32 {
        /// Routine traversal progress: node entry, pruning, sample counts.
        const TRACE = 1 << 0;
        /// Recoverable problems, e.g. a renderable whose geometry resource
        /// is gone.
        const WARNING = 1 << 1;
        /// Category bit: the event originates from extent collection.
        const EXTENTS = 1 << 8;
    }
}

/// Callback receiving the log events of one query call.
///
/// The message closure is only invoked by the sink itself, which keeps
/// formatting lazy.
pub type LogSink<'a> = dyn Fn(LogFlags, &dyn Fn() -> String) + 'a;

/// Forward an event to `sink` if one is installed.
pub(crate) fn emit(sink: Option<&LogSink<'_>>, flags: LogFlags, message: &dyn Fn() -> String) {
    if let Some(sink) = sink {
        sink(flags, message);
    }
}
