//! Metric names recorded by the driver.
//!
//! The driver records through the [`metrics`] facade only. Install whichever
//! recorder the host application uses; without one, recording is a no-op.
//!
//! # Example
//!
//! ```rust
//! use composable_reactor_runtime::metrics;
//!
//! // Once at startup, after installing a recorder
//! metrics::register_metrics();
//! ```

use metrics::describe_counter;

/// Drives started, by [`Driver::drive`](crate::Driver::drive),
/// [`Driver::collect`](crate::Driver::collect) or
/// [`Driver::subscribe`](crate::Driver::subscribe).
pub const DRIVE_STARTED: &str = "reactor.drive.started";

/// Items delivered to drive callbacks.
pub const DRIVE_ITEMS: &str = "reactor.drive.items";

/// Terminal events observed, labelled by `signal`.
pub const DRIVE_TERMINAL: &str = "reactor.drive.terminal";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(DRIVE_STARTED, "Total number of sequence drives started");
    describe_counter!(DRIVE_ITEMS, "Total number of items delivered by drives");
    describe_counter!(
        DRIVE_TERMINAL,
        "Total number of terminal events, labelled by signal (complete, empty, failed)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_without_recorder_is_noop() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn names_are_namespaced() {
        for name in [DRIVE_STARTED, DRIVE_ITEMS, DRIVE_TERMINAL] {
            assert!(name.starts_with("reactor.drive."));
        }
    }
}
