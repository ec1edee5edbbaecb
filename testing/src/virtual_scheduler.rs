//! Deterministic scheduler on a virtual clock.

use composable_reactor_core::{CancelToken, ScheduledTask, Scheduler, Task};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Queue position: deadline first, then scheduling order.
type Key = (Duration, u64);

#[derive(Default)]
struct State {
    now: Duration,
    scheduled: u64,
    queue: BTreeMap<Key, (CancelToken, Task)>,
}

/// Scheduler whose clock only moves when a test moves it.
///
/// Pending items fire in deadline order; items sharing a deadline fire in
/// the order they were scheduled. Tasks run on the calling thread with the
/// internal lock released, so a firing task may schedule more work.
///
/// # Example
///
/// ```
/// use composable_reactor_core::Scheduler;
/// use composable_reactor_testing::VirtualScheduler;
/// use std::time::Duration;
///
/// let scheduler = VirtualScheduler::new();
/// let _task = scheduler.schedule(Duration::from_millis(100), Box::new(|| {}));
///
/// assert_eq!(scheduler.pending(), 1);
/// scheduler.advance_by(Duration::from_millis(100));
/// assert_eq!(scheduler.pending(), 0);
/// assert_eq!(scheduler.now(), Duration::from_millis(100));
/// ```
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    state: Arc<Mutex<State>>,
}

impl VirtualScheduler {
    /// Create a scheduler at virtual time zero with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of items scheduled and not yet fired or cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Deadline of the earliest pending item.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lock().queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock to the earliest pending deadline and fire that item.
    ///
    /// Returns `false` (leaving the clock alone) when nothing is pending.
    pub fn advance_to_next(&self) -> bool {
        let popped = {
            let mut state = self.lock();
            let next = state.queue.pop_first();
            if let Some(((deadline, _), _)) = &next {
                state.now = state.now.max(*deadline);
            }
            next
        };

        match popped {
            Some(((deadline, _), (token, task))) => {
                tracing::trace!(?deadline, "Firing virtual task");
                token.run_unless_cancelled(task);
                true
            },
            None => false,
        }
    }

    /// Move the clock forward by `delta`, firing everything that falls due,
    /// including items scheduled by tasks fired along the way.
    ///
    /// Returns the number of items fired.
    pub fn advance_by(&self, delta: Duration) -> usize {
        let target = self.lock().now + delta;
        let mut fired = 0;
        while self.next_deadline().is_some_and(|deadline| deadline <= target) {
            if self.advance_to_next() {
                fired += 1;
            }
        }
        let mut state = self.lock();
        state.now = state.now.max(target);
        fired
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let token = CancelToken::new();
        let key = {
            let mut state = self.lock();
            let key = (state.now + delay, state.scheduled);
            state.scheduled += 1;
            state.queue.insert(key, (token.clone(), task));
            key
        };

        let owner: Weak<Mutex<State>> = Arc::downgrade(&self.state);
        ScheduledTask::with_release(token, move || {
            if let Some(state) = owner.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .queue
                    .remove(&key);
            }
        })
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("VirtualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &'static str| -> Task {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().unwrap_or_else(PoisonError::into_inner).push(label))
        };
        (log, make)
    }

    #[test]
    fn fires_in_deadline_then_scheduling_order() {
        let scheduler = VirtualScheduler::new();
        let (log, task) = recorder();

        let _late = scheduler.schedule(Duration::from_millis(30), task("late"));
        let _first = scheduler.schedule(Duration::from_millis(10), task("first"));
        let _second = scheduler.schedule(Duration::from_millis(10), task("second"));

        while scheduler.advance_to_next() {}

        let log = log.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(log, vec!["first", "second", "late"]);
        assert_eq!(scheduler.now(), Duration::from_millis(30));
    }

    #[test]
    fn cancelled_item_never_fires() {
        let scheduler = VirtualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let scheduled = scheduler.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        scheduled.cancel();

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance_by(Duration::from_secs(1)), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn advance_by_fires_work_scheduled_while_advancing() {
        let scheduler = VirtualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let inner_scheduler = scheduler.clone();
        let counter = Arc::clone(&fired);
        let _outer = scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let counter = Arc::clone(&counter);
                let _inner = inner_scheduler.schedule(
                    Duration::from_millis(10),
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        assert_eq!(scheduler.advance_by(Duration::from_millis(15)), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.advance_by(Duration::from_millis(5)), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.now(), Duration::from_millis(20));
    }

    #[test]
    fn advance_to_next_on_empty_queue_keeps_clock() {
        let scheduler = VirtualScheduler::new();
        assert!(!scheduler.advance_to_next());
        assert_eq!(scheduler.now(), Duration::ZERO);
    }
}
