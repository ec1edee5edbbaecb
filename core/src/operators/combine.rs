//! Multi-source combination: `concat`, `merge`, `merge_sequential`, `zip`.
//!
//! All combinators here are fail-fast: the first failure observed from any
//! source becomes the failure of the combination, and every other source is
//! dropped (which cancels its pending timers).
//!
//! | combinator | subscription | output order |
//! |------------|--------------|--------------|
//! | [`concat`] | one source at a time | source by source |
//! | [`merge`] | all at start | emission time |
//! | [`merge_sequential`] | all at start | source by source |
//! | [`zip`] / [`zip_all`] | all at start | positional tuples |

use super::interleave::Interleave;
use crate::error::{Result, SeqError};
use crate::seq::{BoxSeqStream, Seq};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

/// Subscribe to `sources` strictly in order.
///
/// A source is only subscribed once the previous one has completed, so a
/// failure means later sources never start.
///
/// # Examples
///
/// ```
/// use composable_reactor_core::{operators::combine::concat, seq};
///
/// let letters = concat([seq!["A", "B", "C"], seq!["D", "E", "F"]]);
/// # let _ = letters;
/// ```
pub fn concat<T, I>(sources: I) -> Seq<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Seq<T>>,
{
    let sources: Arc<[Seq<T>]> = sources.into_iter().collect();
    Seq::from_factory(move |cx| {
        let sources = Arc::clone(&sources);
        let cx = cx.clone();
        Box::pin(stream! {
            for (index, source) in sources.iter().enumerate() {
                tracing::trace!(source = index, "concat: subscribing to next source");
                let mut running = source.subscribe(&cx);
                while let Some(event) = running.next().await {
                    let failed = event.is_err();
                    yield event;
                    if failed {
                        return;
                    }
                }
            }
        })
    })
}

/// Subscribe to all `sources` at once and emit items as they arrive.
///
/// Completes once every source has completed. With well-separated per-item
/// delays the output is reproducible; with equal delays it is a race.
pub fn merge<T, I>(sources: I) -> Seq<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Seq<T>>,
{
    let sources: Arc<[Seq<T>]> = sources.into_iter().collect();
    Seq::from_factory(move |cx| {
        let lanes = sources.iter().map(|source| source.subscribe(cx)).collect();
        Box::pin(Interleave::from_lanes(lanes))
    })
}

/// Subscribe to all `sources` at once but emit in [`concat`] order.
///
/// Later sources run ahead and their items are buffered until every earlier
/// source has completed. Total time is bounded by the slowest source instead
/// of the sum of all sources.
pub fn merge_sequential<T, I>(sources: I) -> Seq<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Seq<T>>,
{
    let sources: Arc<[Seq<T>]> = sources.into_iter().collect();
    Seq::from_factory(move |cx| {
        let lanes = sources
            .iter()
            .map(|source| BufferedLane {
                running: Some(source.subscribe(cx)),
                buffered: VecDeque::new(),
            })
            .collect();
        Box::pin(MergeSequential { lanes })
    })
}

/// Pair the i-th items of `left` and `right` through `combiner`.
///
/// Completes as soon as either source completes with nothing buffered.
///
/// # Examples
///
/// ```
/// use composable_reactor_core::{operators::combine::zip, seq};
///
/// let pairs = zip(seq!["A", "B", "C"], seq!["D", "E", "F"], |a, b| format!("{a}{b}"));
/// // AD, BE, CF
/// # let _ = pairs;
/// ```
pub fn zip<A, B, R, F>(left: Seq<A>, right: Seq<B>, combiner: F) -> Seq<R>
where
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
    F: Fn(A, B) -> R + Send + Sync + 'static,
{
    let combiner = Arc::new(combiner);
    Seq::from_factory(move |cx| {
        Box::pin(Zip2 {
            left: Slot::new(left.subscribe(cx)),
            right: Slot::new(right.subscribe(cx)),
            combiner: Arc::clone(&combiner),
        })
    })
}

/// Pair the i-th items of every source, passing them to `combiner` in
/// source order.
///
/// An empty source list completes immediately.
pub fn zip_all<T, R, I, F>(sources: I, combiner: F) -> Seq<R>
where
    T: Send + 'static,
    R: Send + 'static,
    I: IntoIterator<Item = Seq<T>>,
    F: Fn(Vec<T>) -> R + Send + Sync + 'static,
{
    let sources: Arc<[Seq<T>]> = sources.into_iter().collect();
    let combiner = Arc::new(combiner);
    Seq::from_factory(move |cx| {
        let slots = sources
            .iter()
            .map(|source| Slot::new(source.subscribe(cx)))
            .collect();
        Box::pin(ZipAll {
            slots,
            combiner: Arc::clone(&combiner),
        })
    })
}

impl<T: Send + 'static> Seq<T> {
    /// This sequence's items followed by `other`'s.
    #[must_use]
    pub fn concat_with(self, other: Self) -> Self {
        concat([self, other])
    }

    /// This sequence's and `other`'s items in arrival order.
    #[must_use]
    pub fn merge_with(self, other: Self) -> Self {
        merge([self, other])
    }

    /// Pair items positionally with `other`.
    #[must_use]
    pub fn zip_with<U, R, F>(self, other: Seq<U>, combiner: F) -> Seq<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        zip(self, other, combiner)
    }
}

struct BufferedLane<T> {
    running: Option<BoxSeqStream<T>>,
    buffered: VecDeque<T>,
}

impl<T> BufferedLane<T> {
    /// Pull everything the lane has ready into its buffer.
    fn fill(&mut self, cx: &mut TaskContext<'_>) -> Result<()> {
        loop {
            let Some(running) = self.running.as_mut() else {
                return Ok(());
            };
            let polled = running.poll_next_unpin(cx);
            match polled {
                Poll::Ready(Some(Ok(item))) => self.buffered.push_back(item),
                Poll::Ready(Some(Err(error))) => return Err(error),
                Poll::Ready(None) => self.running = None,
                Poll::Pending => return Ok(()),
            }
        }
    }
}

struct MergeSequential<T> {
    lanes: VecDeque<BufferedLane<T>>,
}

// Buffered items are never pinned; only the boxed lanes are polled in place.
impl<T> Unpin for MergeSequential<T> {}

impl<T> Stream for MergeSequential<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            // Keep every follower's clock running
            let filled: Result<()> = this
                .lanes
                .iter_mut()
                .skip(1)
                .try_for_each(|lane| lane.fill(cx));
            if let Err(error) = filled {
                this.lanes.clear();
                return Poll::Ready(Some(Err(error)));
            }

            let Some(head) = this.lanes.front_mut() else {
                return Poll::Ready(None);
            };

            if let Some(item) = head.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            let Some(running) = head.running.as_mut() else {
                this.lanes.pop_front();
                continue;
            };

            let polled = running.poll_next_unpin(cx);
            match polled {
                Poll::Ready(Some(Ok(item))) => return Poll::Ready(Some(Ok(item))),
                Poll::Ready(Some(Err(error))) => {
                    this.lanes.clear();
                    return Poll::Ready(Some(Err(error)));
                },
                Poll::Ready(None) => {
                    this.lanes.pop_front();
                },
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// One source of a zip and the item it contributes to the current tuple.
struct Slot<T> {
    running: BoxSeqStream<T>,
    value: Option<T>,
}

enum Fill {
    Filled,
    Waiting,
    Exhausted,
    Failed(SeqError),
}

impl<T> Slot<T> {
    const fn new(running: BoxSeqStream<T>) -> Self {
        Self {
            running,
            value: None,
        }
    }

    fn poll_fill(&mut self, cx: &mut TaskContext<'_>) -> Fill {
        if self.value.is_some() {
            return Fill::Filled;
        }
        match self.running.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(item))) => {
                self.value = Some(item);
                Fill::Filled
            },
            Poll::Ready(Some(Err(error))) => Fill::Failed(error),
            Poll::Ready(None) => Fill::Exhausted,
            Poll::Pending => Fill::Waiting,
        }
    }
}

/// Where a zip stands after filling one more slot.
enum Step {
    Continue(bool),
    Finish(Option<SeqError>),
}

impl Fill {
    /// An exhausted or failed slot ends the zip before later slots are pulled.
    fn step(self) -> Step {
        match self {
            Self::Filled => Step::Continue(true),
            Self::Waiting => Step::Continue(false),
            Self::Exhausted => Step::Finish(None),
            Self::Failed(error) => Step::Finish(Some(error)),
        }
    }
}

fn finish<R>(failure: Option<SeqError>) -> Poll<Option<Result<R>>> {
    match failure {
        Some(error) => Poll::Ready(Some(Err(error))),
        None => Poll::Ready(None),
    }
}

struct Zip2<A, B, F> {
    left: Slot<A>,
    right: Slot<B>,
    combiner: Arc<F>,
}

impl<A, B, F> Unpin for Zip2<A, B, F> {}

impl<A, B, R, F> Stream for Zip2<A, B, F>
where
    F: Fn(A, B) -> R,
{
    type Item = Result<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let left_ready = match this.left.poll_fill(cx).step() {
            Step::Continue(ready) => ready,
            Step::Finish(failure) => return finish(failure),
        };
        let right_ready = match this.right.poll_fill(cx).step() {
            Step::Continue(ready) => ready,
            Step::Finish(failure) => return finish(failure),
        };
        if !(left_ready && right_ready) {
            return Poll::Pending;
        }

        match (this.left.value.take(), this.right.value.take()) {
            (Some(a), Some(b)) => Poll::Ready(Some(Ok((this.combiner)(a, b)))),
            _ => Poll::Ready(None),
        }
    }
}

struct ZipAll<T, F> {
    slots: SmallVec<[Slot<T>; 4]>,
    combiner: Arc<F>,
}

impl<T, F> Unpin for ZipAll<T, F> {}

impl<T, R, F> Stream for ZipAll<T, F>
where
    F: Fn(Vec<T>) -> R,
{
    type Item = Result<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.slots.is_empty() {
            return Poll::Ready(None);
        }

        let mut all_filled = true;
        for slot in &mut this.slots {
            match slot.poll_fill(cx).step() {
                Step::Continue(ready) => all_filled &= ready,
                Step::Finish(failure) => return finish(failure),
            }
        }

        if !all_filled {
            return Poll::Pending;
        }

        let values: Option<Vec<T>> = this.slots.iter_mut().map(|slot| slot.value.take()).collect();
        match values {
            Some(values) => Poll::Ready(Some(Ok((this.combiner)(values)))),
            None => Poll::Ready(None),
        }
    }
}
