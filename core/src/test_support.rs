//! Helpers for driving synchronous pipelines in unit tests.

#![allow(clippy::unwrap_used)]

use crate::context::Context;
use crate::error::SeqError;
use crate::opt::Opt;
use crate::scheduler::{CancelToken, ScheduledTask, Scheduler, Task};
use crate::seq::Seq;
use futures::StreamExt;
use std::time::Duration;

/// Fires every task as soon as it is scheduled, ignoring the delay.
///
/// Only suitable for pipelines whose ordering does not depend on time.
pub(crate) struct InstantScheduler;

impl Scheduler for InstantScheduler {
    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn schedule(&self, _delay: Duration, task: Task) -> ScheduledTask {
        let token = CancelToken::new();
        token.run_unless_cancelled(task);
        ScheduledTask::new(token)
    }
}

pub(crate) fn context() -> Context {
    Context::with_scheduler(InstantScheduler)
}

/// Drive `seq` to its end: the items, and the failure if it failed.
pub(crate) fn collect<T: Send + 'static>(seq: &Seq<T>, cx: &Context) -> (Vec<T>, Option<SeqError>) {
    let mut stream = seq.subscribe(cx);
    futures::executor::block_on(async move {
        let mut items = Vec::new();
        while let Some(event) = stream.next().await {
            match event {
                Ok(item) => items.push(item),
                Err(error) => return (items, Some(error)),
            }
        }
        (items, None)
    })
}

/// Resolve `opt`.
pub(crate) fn resolve<T: Send + 'static>(opt: &Opt<T>, cx: &Context) -> Result<Option<T>, SeqError> {
    futures::executor::block_on(opt.resolve(cx))
}
