//! Step-by-step verification of a source on virtual time.
//!
//! This module provides a fluent API for asserting exactly what a source
//! emits, in order, and how it ends.

#![allow(clippy::module_name_repetitions)] // SeqVerifier is the natural name

use crate::virtual_scheduler::VirtualScheduler;
use composable_reactor_core::{Context, ErrorKind, Publisher, Scheduler, Terminal};
use futures::StreamExt;
use futures::task::noop_waker_ref;
use std::fmt;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use thiserror::Error;

/// Errors from driving a source on virtual time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The source is waiting on something other than the virtual scheduler
    #[error("Source stalled after {items} item(s) at {at:?} with no scheduled work")]
    Stalled {
        /// Items delivered before stalling
        items: usize,
        /// Virtual time of the stall
        at: Duration,
    },
}

/// Everything a virtual drive produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording<T> {
    /// Items in delivery order
    pub items: Vec<T>,

    /// Virtual time each item was delivered at, relative to subscription
    pub emitted_at: Vec<Duration>,

    /// How the drive ended
    pub terminal: Terminal,

    /// Virtual time between subscription and terminal
    pub elapsed: Duration,
}

/// Drive `source` to its terminal on `scheduler`'s virtual clock.
///
/// The source is polled until it is idle, then the clock jumps to the next
/// pending deadline. A drive therefore takes no wall-clock time, however
/// long its delays.
///
/// # Errors
///
/// Returns [`VerifyError::Stalled`] if the source is pending while nothing
/// is scheduled.
pub fn run_virtual<P>(source: &P, scheduler: &VirtualScheduler) -> Result<Recording<P::Item>, VerifyError>
where
    P: Publisher + ?Sized,
{
    let cx = Context::with_scheduler(scheduler.clone());
    let started = scheduler.now();
    let mut stream = source.open(&cx);
    let mut task_cx = TaskContext::from_waker(noop_waker_ref());

    let mut items = Vec::new();
    let mut emitted_at = Vec::new();
    let terminal = loop {
        match stream.poll_next_unpin(&mut task_cx) {
            Poll::Ready(Some(Ok(item))) => {
                items.push(item);
                emitted_at.push(scheduler.now() - started);
            },
            Poll::Ready(Some(Err(error))) => break Terminal::Failed(error),
            Poll::Ready(None) if items.is_empty() => break source.terminal_when_empty(),
            Poll::Ready(None) => break Terminal::Complete,
            Poll::Pending => {
                if !scheduler.advance_to_next() {
                    return Err(VerifyError::Stalled {
                        items: items.len(),
                        at: scheduler.now(),
                    });
                }
            },
        }
    };

    Ok(Recording {
        items,
        emitted_at,
        terminal,
        elapsed: scheduler.now() - started,
    })
}

/// One expectation about the next item.
type ItemCheck<T> = Box<dyn FnOnce(usize, &T)>;

enum Step<T> {
    Item(ItemCheck<T>),
    Skip(usize),
}

/// Fluent verifier for a [`Seq`](composable_reactor_core::Seq) or
/// [`Opt`](composable_reactor_core::Opt), run on virtual time
///
/// # Example
///
/// ```
/// use composable_reactor_core::seq;
/// use composable_reactor_testing::SeqVerifier;
/// use std::time::Duration;
///
/// SeqVerifier::create(seq!["alex", "ben", "chloe"].map(str::to_uppercase))
///     .expect_next(["ALEX", "BEN"])
///     .expect_next_count(1)
///     .verify_complete();
///
/// SeqVerifier::create(seq!["A", "B"].delay_elements(Duration::from_millis(100)))
///     .expect_next(["A", "B"])
///     .expect_elapsed(Duration::from_millis(200))
///     .verify_complete();
/// ```
pub struct SeqVerifier<P: Publisher> {
    source: P,
    scheduler: VirtualScheduler,
    steps: Vec<Step<P::Item>>,
    elapsed: Option<Duration>,
    elapsed_at_most: Option<Duration>,
}

impl<P> SeqVerifier<P>
where
    P: Publisher,
    P::Item: fmt::Debug,
{
    /// Start verifying `source` on a fresh virtual scheduler
    #[must_use]
    pub fn create(source: P) -> Self {
        Self {
            source,
            scheduler: VirtualScheduler::new(),
            steps: Vec::new(),
            elapsed: None,
            elapsed_at_most: None,
        }
    }

    /// Run on `scheduler` instead of a fresh one
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: VirtualScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Expect the next items to equal `expected`, in order
    #[must_use]
    pub fn expect_next<I>(mut self, expected: I) -> Self
    where
        I: IntoIterator,
        P::Item: PartialEq<I::Item>,
        I::Item: fmt::Debug + 'static,
    {
        for want in expected {
            self.steps.push(Step::Item(Box::new(move |index: usize, got: &P::Item| {
                assert!(
                    *got == want,
                    "item #{index}: expected {want:?}, got {got:?}"
                );
            })));
        }
        self
    }

    /// Expect `count` more items without inspecting them
    #[must_use]
    pub fn expect_next_count(mut self, count: usize) -> Self {
        self.steps.push(Step::Skip(count));
        self
    }

    /// Run `assertion` against the next item
    #[must_use]
    pub fn assert_next<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&P::Item) + 'static,
    {
        self.steps
            .push(Step::Item(Box::new(move |_: usize, got: &P::Item| assertion(got))));
        self
    }

    /// Expect the drive to take exactly `elapsed` of virtual time
    #[must_use]
    pub fn expect_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Expect the drive to take at most `bound` of virtual time
    #[must_use]
    pub fn expect_elapsed_at_most(mut self, bound: Duration) -> Self {
        self.elapsed_at_most = Some(bound);
        self
    }

    /// Verify the expectations, then a normal completion
    ///
    /// # Panics
    ///
    /// Panics if any expectation fails or the source does not complete.
    pub fn verify_complete(self) -> Recording<P::Item> {
        self.verify(|terminal| {
            assert_eq!(*terminal, Terminal::Complete, "expected completion");
        })
    }

    /// Verify the expectations, then an empty completion
    ///
    /// # Panics
    ///
    /// Panics if any expectation fails or the source does not end empty.
    pub fn verify_empty(self) -> Recording<P::Item> {
        self.verify(|terminal| {
            assert_eq!(*terminal, Terminal::Empty, "expected empty completion");
        })
    }

    /// Verify the expectations, then a failure of `kind`
    ///
    /// # Panics
    ///
    /// Panics if any expectation fails or the source does not fail with `kind`.
    pub fn verify_error(self, kind: ErrorKind) -> Recording<P::Item> {
        self.verify(move |terminal| {
            assert_eq!(
                terminal.error_kind(),
                Some(kind),
                "expected failure of kind {kind}, got {terminal}"
            );
        })
    }

    #[allow(clippy::panic)] // Test code can panic
    fn verify<F>(self, check_terminal: F) -> Recording<P::Item>
    where
        F: FnOnce(&Terminal),
    {
        let recording = match run_virtual(&self.source, &self.scheduler) {
            Ok(recording) => recording,
            Err(error) => panic!("{error}"),
        };

        let mut remaining = recording.items.iter().enumerate();
        for step in self.steps {
            match step {
                Step::Item(check) => match remaining.next() {
                    Some((index, item)) => check(index, item),
                    None => panic!(
                        "expected another item, source ended with {} after {} item(s)",
                        recording.terminal,
                        recording.items.len()
                    ),
                },
                Step::Skip(count) => {
                    for _ in 0..count {
                        if remaining.next().is_none() {
                            panic!(
                                "expected {count} more item(s), source ended with {} after {} item(s)",
                                recording.terminal,
                                recording.items.len()
                            );
                        }
                    }
                },
            }
        }

        let unexpected: Vec<&P::Item> = remaining.map(|(_, item)| item).collect();
        assert!(unexpected.is_empty(), "unexpected extra item(s): {unexpected:?}");

        check_terminal(&recording.terminal);

        if let Some(elapsed) = self.elapsed {
            assert_eq!(recording.elapsed, elapsed, "virtual time elapsed");
        }
        if let Some(bound) = self.elapsed_at_most {
            assert!(
                recording.elapsed <= bound,
                "took {:?}, expected at most {bound:?}",
                recording.elapsed
            );
        }

        recording
    }
}

impl<P: Publisher> fmt::Debug for SeqVerifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqVerifier")
            .field("scheduler", &self.scheduler)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}
