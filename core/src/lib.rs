//! # Composable Reactor Core
//!
//! Lazy, composable asynchronous sequences.
//!
//! This crate provides the two sequence types, the operator library over
//! them, and the scheduler abstraction every delay goes through. Nothing in
//! here spawns tasks or owns a runtime: a sequence is a description until a
//! driver (see `composable-reactor-runtime`) or a test harness (see
//! `composable-reactor-testing`) subscribes to it.
//!
//! ## Core Concepts
//!
//! - **Seq**: a cold sequence of zero or more items ending in completion or failure
//! - **Opt**: a cold computation yielding at most one item
//! - **Context**: what a drive hands every sequence it subscribes to
//! - **Scheduler**: the clock and timer source for delays
//! - **Terminal**: how a driven sequence ended (complete, empty or failed)
//!
//! ## Architecture Principles
//!
//! - Definitions are values: building a pipeline performs no work
//! - Every subscription re-runs its source from scratch
//! - Exactly one terminal event per subscription, nothing after it
//! - Dropping a subscription cancels everything upstream of it
//!
//! ## Example
//!
//! ```
//! use composable_reactor_core::{seq, Seq};
//!
//! let letters: Seq<String> = seq!["alex", "ben", "chloe"]
//!     .map(str::to_uppercase)
//!     .filter(|name| name.len() > 3)
//!     .flat_map(|name| Seq::from_iterable(name.chars().map(String::from).collect::<Vec<_>>()));
//!
//! // A, L, E, X, C, H, L, O, E once driven
//! # let _ = letters;
//! ```

pub mod context;
pub mod error;
pub mod operators;
pub mod opt;
pub mod scheduler;
pub mod seq;
pub mod signal;

#[cfg(test)]
mod test_support;

pub use context::Context;
pub use error::{ErrorKind, Result, SeqError};
pub use operators::combine::{concat, merge, merge_sequential, zip, zip_all};
pub use opt::{BoxOptFuture, Opt};
pub use scheduler::{CancelToken, ScheduledTask, Scheduler, SchedulerHandle, Sleep, Task};
pub use seq::{BoxSeqStream, Seq};
pub use signal::{Publisher, Terminal};
