//! # Composable Reactor Testing
//!
//! Testing utilities for Composable Reactor sequences.
//!
//! This crate provides:
//! - [`VirtualScheduler`]: a deterministic clock that only moves when told to
//! - [`run_virtual`]: drive a source to its end on virtual time
//! - [`SeqVerifier`]: fluent assertions over items, terminal and elapsed time
//!
//! ## Example
//!
//! ```
//! use composable_reactor_core::{merge, seq};
//! use composable_reactor_testing::SeqVerifier;
//! use std::time::Duration;
//!
//! let abc = seq!["A", "B", "C"].delay_elements(Duration::from_millis(100));
//! let def = seq!["D", "E", "F"].delay_elements(Duration::from_millis(125));
//!
//! SeqVerifier::create(merge([abc, def]))
//!     .expect_next(["A", "D", "B", "E", "C", "F"])
//!     .expect_elapsed(Duration::from_millis(375))
//!     .verify_complete();
//! ```

pub mod verifier;
pub mod virtual_scheduler;

pub use verifier::{Recording, SeqVerifier, VerifyError, run_virtual};
pub use virtual_scheduler::VirtualScheduler;

/// Create a fresh virtual scheduler at time zero
#[must_use]
pub fn test_scheduler() -> VirtualScheduler {
    VirtualScheduler::new()
}

/// Install a `tracing` subscriber that writes through the test harness
///
/// Honours `RUST_LOG`, defaulting to `composable_reactor_core=debug`. Safe to
/// call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "composable_reactor_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_reactor_core::Scheduler;
    use std::time::Duration;

    #[test]
    fn test_scheduler_starts_idle() {
        let scheduler = test_scheduler();
        assert_eq!(scheduler.now(), Duration::ZERO);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn tracing_can_be_initialised_twice() {
        init_test_tracing();
        init_test_tracing();
    }
}
