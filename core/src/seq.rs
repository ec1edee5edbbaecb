//! The zero-or-many sequence type and its construction primitives.
//!
//! A [`Seq`] is a *definition*: an `Arc`'d factory that builds a fresh
//! stream of `Result<T, SeqError>` each time it is subscribed. Nothing runs
//! until a driver polls that stream, and two subscriptions never share
//! execution state.

use crate::context::Context;
use crate::error::{Result, SeqError};
use crate::signal::Publisher;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

/// A running subscription: items as `Ok`, a failure as the final `Err`.
pub type BoxSeqStream<T> = BoxStream<'static, Result<T>>;

type Factory<T> = dyn Fn(&Context) -> BoxSeqStream<T> + Send + Sync;

/// A cold, lazily produced sequence of zero or more values.
///
/// Every subscription re-runs the source from scratch. A subscription
/// delivers zero or more items and then exactly one terminal event:
/// completion (the stream ends) or failure (a final `Err`).
///
/// # Examples
///
/// ```
/// use composable_reactor_core::Seq;
///
/// let names = Seq::from_iterable(["alex", "ben", "chloe"])
///     .map(str::to_uppercase)
///     .filter(|name| name.len() > 3);
///
/// // `names` is only a description; drive it with a driver or test harness.
/// # let _ = names;
/// ```
pub struct Seq<T> {
    factory: Arc<Factory<T>>,
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seq").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Seq<T> {
    /// Build a sequence from a factory invoked once per subscription.
    ///
    /// The factory must not perform side effects itself; the work belongs in
    /// the stream it returns, which only runs when polled.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(&Context) -> BoxSeqStream<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Build a sequence from a factory of result streams.
    ///
    /// This is the seam producer collaborators use to expose their data.
    pub fn from_stream<F, S>(make: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::from_factory(move |_| make().boxed())
    }

    /// Pick the sequence to run at subscription time.
    pub fn defer<F>(make: F) -> Self
    where
        F: Fn() -> Self + Send + Sync + 'static,
    {
        let make = Arc::new(make);
        Self::from_factory(move |cx| {
            let cx = cx.clone();
            let make = Arc::clone(&make);
            stream::once(async move { (*make)().subscribe(&cx) })
                .flatten()
                .boxed()
        })
    }

    /// A sequence that completes without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_factory(|_| stream::empty().boxed())
    }

    /// A sequence that fails immediately with `error`.
    #[must_use]
    pub fn fail(error: SeqError) -> Self {
        Self::from_factory(move |_| stream::once(futures::future::ready(Err(error.clone()))).boxed())
    }

    /// Subscribe, producing a fresh execution of this sequence.
    ///
    /// The returned stream enforces the terminal invariants: nothing is
    /// delivered after a failure, and the upstream is released as soon as
    /// the terminal event is observed.
    pub fn subscribe(&self, cx: &Context) -> BoxSeqStream<T> {
        Box::pin(Terminated {
            inner: Some((self.factory)(cx)),
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Seq<T> {
    /// A sequence emitting each item in iteration order, then completing.
    ///
    /// Items are cloned on every subscription.
    pub fn from_iterable<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Arc<[T]> = items.into_iter().collect();
        Self::from_factory(move |_| {
            let items = Arc::clone(&items);
            stream::iter((0..items.len()).map(move |index| Ok(items[index].clone()))).boxed()
        })
    }

    /// A sequence of exactly one item.
    #[must_use]
    pub fn just(item: T) -> Self {
        Self::from_iterable([item])
    }
}

impl<T: Send + 'static> Publisher for Seq<T> {
    type Item = T;

    fn open(&self, cx: &Context) -> BoxSeqStream<T> {
        self.subscribe(cx)
    }
}

/// Fuses a subscription at its terminal event.
struct Terminated<T> {
    inner: Option<BoxSeqStream<T>>,
}

impl<T> Stream for Terminated<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        let polled = inner.poll_next_unpin(cx);
        match polled {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(error))) => {
                self.inner = None;
                Poll::Ready(Some(Err(error)))
            },
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Build a [`Seq`] from a list of values, in the order given.
///
/// # Examples
///
/// ```
/// use composable_reactor_core::{seq, Seq};
///
/// let letters: Seq<&str> = seq!["A", "B", "C"];
/// # let _ = letters;
/// ```
#[macro_export]
macro_rules! seq {
    () => {
        $crate::Seq::empty()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Seq::from_iterable([$($item),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{collect, context};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn from_iterable_emits_in_order() {
        let seq = Seq::from_iterable(vec![1, 2, 3]);
        let (items, terminal) = collect(&seq, &context());

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(terminal, None);
    }

    #[test]
    fn fail_emits_no_items() {
        let seq: Seq<i32> = Seq::fail(SeqError::upstream("offline"));
        let (items, terminal) = collect(&seq, &context());

        assert!(items.is_empty());
        assert_eq!(terminal, Some(SeqError::upstream("offline")));
    }

    #[test]
    fn nothing_after_failure() {
        let seq = Seq::from_stream(|| {
            stream::iter(vec![Ok(1), Err(SeqError::upstream("broken")), Ok(2)])
        });
        let (items, terminal) = collect(&seq, &context());

        assert_eq!(items, vec![1]);
        assert_eq!(terminal, Some(SeqError::upstream("broken")));
    }

    #[test]
    fn defer_runs_only_when_driven() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seq = Seq::defer(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            seq![10, 20]
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let stream = seq.subscribe(&context());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(stream);

        let (first, _) = collect(&seq, &context());
        let (second, _) = collect(&seq, &context());
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn seq_macro() {
        let empty: Seq<u8> = seq![];
        assert!(collect(&empty, &context()).0.is_empty());
        assert_eq!(collect(&seq!["A", "B"], &context()).0, vec!["A", "B"]);
    }
}
