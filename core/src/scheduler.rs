//! The scheduling abstraction every delaying operator suspends on.
//!
//! A [`Scheduler`] runs a [`Task`] once a delay has elapsed on its clock.
//! Operators never talk to a concrete timer: they receive the scheduler
//! through the [`Context`](crate::Context) of the drive, so the same pipeline
//! runs on Tokio time in production and on a virtual clock in tests.
//!
//! # Implementations
//!
//! - `TokioScheduler` in `composable-reactor-runtime` (production)
//! - `VirtualScheduler` in `composable-reactor-testing` (deterministic tests)

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// A unit of delayed work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to a scheduler, as carried by a [`Context`](crate::Context).
pub type SchedulerHandle = Arc<dyn Scheduler>;

/// Executes delayed work items without blocking the caller.
///
/// # Contract
///
/// - `task` runs after at least `delay` has elapsed on this scheduler's clock
/// - items with a shorter delay are expected to fire first; ties are unordered
/// - a cancelled item never fires
/// - scheduling never fails
///
/// # Examples
///
/// ```ignore
/// let task = scheduler.schedule(Duration::from_millis(100), Box::new(|| {
///     tracing::info!("fired");
/// }));
///
/// // Changed our mind
/// task.cancel();
/// ```
pub trait Scheduler: Send + Sync {
    /// Time elapsed on this scheduler's clock since it was created.
    fn now(&self) -> Duration;

    /// Arrange for `task` to run once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask;
}

/// Cooperative cancellation flag shared between a [`ScheduledTask`] and the
/// scheduler that will fire it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Run `task` unless this token has been cancelled.
    ///
    /// Scheduler implementations call this at firing time.
    pub fn run_unless_cancelled(&self, task: Task) {
        if self.is_cancelled() {
            tracing::trace!("Scheduled task cancelled before firing");
        } else {
            task();
        }
    }
}

/// Handle to one scheduled item.
///
/// Dropping the handle does not cancel the item; call [`cancel`](Self::cancel).
pub struct ScheduledTask {
    token: CancelToken,
    release: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ScheduledTask {
    /// Wrap a token with no extra release step.
    #[must_use]
    pub const fn new(token: CancelToken) -> Self {
        Self {
            token,
            release: None,
        }
    }

    /// Wrap a token together with a hook that frees the scheduler's resources
    /// for this item (abort a timer task, drop a queue entry).
    #[must_use]
    pub fn with_release(token: CancelToken, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            token,
            release: Some(Box::new(release)),
        }
    }

    /// Withdraw the item. It will not fire after this returns.
    pub fn cancel(mut self) {
        self.token.cancel();
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether this item was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Future that resolves once a delay has elapsed on a scheduler.
///
/// The delay is scheduled when the `Sleep` is created. Dropping an
/// unresolved `Sleep` cancels the scheduled item.
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    fired: oneshot::Receiver<()>,
    task: Option<ScheduledTask>,
}

impl Sleep {
    /// Schedule a wake-up `delay` from now on `scheduler`.
    pub fn new(scheduler: &dyn Scheduler, delay: Duration) -> Self {
        let (tx, rx) = oneshot::channel();
        let task = scheduler.schedule(
            delay,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        Self {
            fired: rx,
            task: Some(task),
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        match Pin::new(&mut self.fired).poll(cx) {
            Poll::Ready(result) => {
                if result.is_err() {
                    // The scheduler dropped the item without firing it
                    tracing::warn!("Scheduler released a sleep without firing it");
                }
                self.task = None;
                Poll::Ready(())
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }
}

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sleep")
            .field("pending", &self.task.is_some())
            .finish()
    }
}
