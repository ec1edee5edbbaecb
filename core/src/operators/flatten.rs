//! Flattening operators: one upstream item becomes a whole inner sequence.
//!
//! The two operators differ only in how inner sequences are scheduled:
//!
//! - [`Seq::flat_map`] subscribes to every inner sequence as soon as its
//!   upstream item arrives. Output follows emission time, so inner
//!   sequences with different latencies interleave.
//! - [`Seq::concat_map`] runs inner sequences one after another. Output is
//!   always in upstream order, whatever the latencies.
//!
//! With purely synchronous inner sequences both produce the same output.

use super::interleave::Interleave;
use crate::context::Context;
use crate::error::Result;
use crate::seq::{BoxSeqStream, Seq};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

impl<T: Send + 'static> Seq<T> {
    /// Map every item to an inner sequence and subscribe to all of them
    /// concurrently.
    ///
    /// Items are emitted as inner sequences produce them. When several inner
    /// sequences have an item ready at once, the one subscribed first wins.
    /// An upstream or inner failure fails the result and drops every
    /// in-flight inner sequence.
    #[must_use]
    pub fn flat_map<R, F>(self, f: F) -> Seq<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Seq<R> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Seq::from_factory(move |cx| {
            Box::pin(FlatMap {
                upstream: Some(self.subscribe(cx)),
                inners: Interleave::new(),
                project: Arc::clone(&f),
                context: cx.clone(),
            })
        })
    }

    /// Map every item to an inner sequence and run them strictly in
    /// upstream order.
    ///
    /// The next inner sequence is not subscribed until the previous one has
    /// completed. An inner failure fails the result; later upstream items are
    /// not processed.
    #[must_use]
    pub fn concat_map<R, F>(self, f: F) -> Seq<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Seq<R> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Seq::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            let f = Arc::clone(&f);
            let cx = cx.clone();
            Box::pin(stream! {
                while let Some(event) = upstream.next().await {
                    match event {
                        Ok(item) => {
                            let mut inner = f(item).subscribe(&cx);
                            while let Some(inner_event) = inner.next().await {
                                let failed = inner_event.is_err();
                                yield inner_event;
                                if failed {
                                    return;
                                }
                            }
                        },
                        Err(error) => {
                            yield Err(error);
                            return;
                        },
                    }
                }
            })
        })
    }
}

struct FlatMap<T, R, F> {
    upstream: Option<BoxSeqStream<T>>,
    inners: Interleave<R>,
    project: Arc<F>,
    context: Context,
}

impl<T, R, F> Stream for FlatMap<T, R, F>
where
    R: Send + 'static,
    F: Fn(T) -> Seq<R>,
{
    type Item = Result<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Subscribe to every upstream item that is already available
        loop {
            let Some(upstream) = this.upstream.as_mut() else {
                break;
            };
            let polled = upstream.poll_next_unpin(cx);
            match polled {
                Poll::Ready(Some(Ok(item))) => {
                    let inner = (this.project)(item).subscribe(&this.context);
                    this.inners.push(inner);
                },
                Poll::Ready(Some(Err(error))) => {
                    this.upstream = None;
                    this.inners = Interleave::new();
                    return Poll::Ready(Some(Err(error)));
                },
                Poll::Ready(None) => this.upstream = None,
                Poll::Pending => break,
            }
        }

        match this.inners.poll_lanes(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(event)),
            Poll::Ready(None) if this.upstream.is_none() => Poll::Ready(None),
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SeqError;
    use crate::seq::Seq;
    use crate::test_support::{collect, context};

    fn split(name: String) -> Seq<String> {
        Seq::from_iterable(name.chars().map(String::from).collect::<Vec<_>>())
    }

    #[test]
    fn synchronous_flat_map_collapses_to_upstream_order() {
        let letters = Seq::from_iterable(["alex", "ben", "chloe"])
            .map(str::to_uppercase)
            .filter(|name| name.len() > 3)
            .flat_map(split);

        assert_eq!(
            collect(&letters, &context()).0,
            vec!["A", "L", "E", "X", "C", "H", "L", "O", "E"]
        );
    }

    #[test]
    fn concat_map_preserves_order() {
        let letters = Seq::from_iterable(["ab".to_string(), "cd".to_string()]).concat_map(split);
        assert_eq!(collect(&letters, &context()).0, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn inner_failure_fails_outer() {
        let cx = context();
        let project = |n: i32| {
            if n == 2 {
                Seq::fail(SeqError::upstream("inner"))
            } else {
                Seq::just(n * 10)
            }
        };

        let (flat_items, flat_error) = collect(&Seq::from_iterable([1, 2, 3]).flat_map(project), &cx);
        let (concat_items, concat_error) =
            collect(&Seq::from_iterable([1, 2, 3]).concat_map(project), &cx);

        assert_eq!(flat_items, vec![10]);
        assert_eq!(flat_error, Some(SeqError::upstream("inner")));
        assert_eq!(concat_items, vec![10]);
        assert_eq!(concat_error, Some(SeqError::upstream("inner")));
    }

    #[test]
    fn empty_upstream_completes() {
        let letters = Seq::<String>::empty().flat_map(split);
        let (items, error) = collect(&letters, &context());

        assert!(items.is_empty());
        assert!(error.is_none());
    }
}
