//! # Composable Reactor Runtime
//!
//! Production driving for Composable Reactor sequences.
//!
//! This crate provides:
//! - [`TokioScheduler`]: the [`Scheduler`](composable_reactor_core::Scheduler)
//!   backed by Tokio timers
//! - [`Driver`]: subscribes to a [`Seq`](composable_reactor_core::Seq) or
//!   [`Opt`](composable_reactor_core::Opt) and pumps it to its terminal event
//! - [`Subscription`]: a drive running on its own Tokio task, cancellable
//! - [`metrics`]: counter names recorded by the driver
//!
//! ## Example
//!
//! ```no_run
//! use composable_reactor_core::seq;
//! use composable_reactor_runtime::{Driver, DriverConfig};
//!
//! # async fn example() -> Result<(), composable_reactor_runtime::DriveError> {
//! let driver = Driver::tokio(DriverConfig::default())?;
//! let outcome = driver.collect(&seq!["alex", "ben"].map(str::to_uppercase)).await?;
//!
//! assert_eq!(outcome.items, vec!["ALEX", "BEN"]);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod metrics;
pub mod scheduler;

pub use driver::{Driver, DriverConfig, Outcome, Subscription};
pub use error::DriveError;
pub use scheduler::TokioScheduler;

/// Error types for the runtime
pub mod error {
    use std::time::Duration;
    use thiserror::Error;

    /// Errors raised by the driver itself
    ///
    /// These are distinct from sequence failures, which arrive as
    /// [`Terminal::Failed`](composable_reactor_core::Terminal::Failed).
    #[derive(Error, Debug)]
    pub enum DriveError {
        /// The drive did not reach its terminal event in time
        ///
        /// The subscription is dropped when this is returned, cancelling all
        /// in-flight work.
        #[error("Drive timed out after {0:?}")]
        Timeout(Duration),

        /// The task running a [`Subscription`](crate::Subscription) panicked
        #[error("Subscription task failed: {0}")]
        TaskJoin(#[from] tokio::task::JoinError),

        /// No Tokio runtime was available to schedule on
        #[error("No Tokio runtime available: {0}")]
        NoRuntime(String),
    }
}
