//! Per-drive context handed to every sequence factory.

use crate::scheduler::{Scheduler, SchedulerHandle, Sleep};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What a drive supplies to the sequences it subscribes to.
///
/// A context is created by the driver (or test harness) and passed down
/// through every operator when a sequence is subscribed. It is cheap to
/// clone.
///
/// # Examples
///
/// ```ignore
/// let cx = Context::new(Arc::new(TokioScheduler::try_current()?));
/// let stream = names.subscribe(&cx);
/// ```
#[derive(Clone)]
pub struct Context {
    scheduler: SchedulerHandle,
}

impl Context {
    /// Create a context driving on `scheduler`.
    #[must_use]
    pub const fn new(scheduler: SchedulerHandle) -> Self {
        Self { scheduler }
    }

    /// Create a context from a concrete scheduler.
    #[must_use]
    pub fn with_scheduler<S: Scheduler + 'static>(scheduler: S) -> Self {
        Self::new(Arc::new(scheduler))
    }

    /// The scheduler delays are taken from.
    #[must_use]
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Current time on the scheduler's clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Sleep for `delay` on the scheduler's clock.
    pub fn sleep(&self, delay: Duration) -> Sleep {
        Sleep::new(self.scheduler.as_ref(), delay)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("now", &self.scheduler.now())
            .finish_non_exhaustive()
    }
}
