//! Tokio-backed scheduler.

use crate::error::DriveError;
use composable_reactor_core::{CancelToken, ScheduledTask, Scheduler, Task};
use std::fmt;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

/// Runs scheduled tasks on Tokio timers.
///
/// Each item is a spawned task sleeping on `tokio::time` until a deadline
/// taken when the item is scheduled, so the scheduler follows a paused clock
/// in `#[tokio::test(start_paused = true)]` tests.
/// Cancelling an item sets its token and aborts the spawned task.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
    epoch: Instant,
}

impl TokioScheduler {
    /// Bind to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::NoRuntime`] when called outside a Tokio runtime.
    pub fn try_current() -> Result<Self, DriveError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|error| DriveError::NoRuntime(error.to_string()))
    }

    /// Bind to an explicit runtime handle.
    #[must_use]
    pub fn from_handle(handle: Handle) -> Self {
        let epoch = {
            let _entered = handle.enter();
            Instant::now()
        };
        Self { handle, epoch }
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        let _entered = self.handle.enter();
        self.epoch.elapsed()
    }

    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let token = CancelToken::new();
        let firing = token.clone();
        let deadline = {
            let _entered = self.handle.enter();
            Instant::now() + delay
        };
        let timer = self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            firing.run_unless_cancelled(task);
        });
        ScheduledTask::with_release(token, move || timer.abort())
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn flag() -> (Arc<AtomicBool>, Task) {
        let fired = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&fired);
        (fired, Box::new(move || setter.store(true, Ordering::SeqCst)))
    }

    #[test]
    fn try_current_outside_runtime_fails() {
        assert!(matches!(
            TokioScheduler::try_current(),
            Err(DriveError::NoRuntime(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let (fired, task) = flag();
        let _scheduled = scheduler.schedule(Duration::from_millis(50), task);

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_taken_when_scheduling() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let (fired, task) = flag();
        let _scheduled = scheduler.schedule(Duration::from_millis(50), task);

        // The timer task has not been polled yet when the clock moves
        tokio::time::advance(Duration::from_millis(30)).await;
        tokio::time::sleep(Duration::from_millis(21)).await;

        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let (fired, task) = flag();
        let scheduled = scheduler.schedule(Duration::from_millis(50), task);

        scheduled.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn clock_follows_paused_time() {
        let scheduler = TokioScheduler::try_current().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        let now = scheduler.now();
        assert!(now >= Duration::from_millis(250));
        assert!(now < Duration::from_millis(260));
    }
}
