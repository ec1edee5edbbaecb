//! Per-item transformations, taps and empty-source fallbacks.

use crate::error::SeqError;
use crate::seq::Seq;
use async_stream::stream;
use futures::future;
use futures::stream::{StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;

impl<T: Send + 'static> Seq<T> {
    /// Apply `f` to every item, preserving order and count.
    #[must_use]
    pub fn map<R, F>(self, f: F) -> Seq<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Seq::from_factory(move |cx| {
            let f = Arc::clone(&f);
            self.subscribe(cx).map_ok(move |item| f(item)).boxed()
        })
    }

    /// Apply a fallible `f` to every item.
    ///
    /// The first `Err` becomes the sequence's [`SeqError::Transform`] failure
    /// and no further upstream items are consumed.
    #[must_use]
    pub fn try_map<R, E, F>(self, f: F) -> Seq<R>
    where
        R: Send + 'static,
        E: fmt::Display,
        F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Seq::from_factory(move |cx| {
            let f = Arc::clone(&f);
            self.subscribe(cx)
                .and_then(move |item| future::ready(f(item).map_err(SeqError::transform)))
                .boxed()
        })
    }

    /// Keep only the items satisfying `predicate`.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Self::from_factory(move |cx| {
            let predicate = Arc::clone(&predicate);
            self.subscribe(cx)
                .try_filter(move |item| future::ready(predicate(item)))
                .boxed()
        })
    }

    /// Observe every item without changing it (doOnNext).
    #[must_use]
    pub fn inspect<F>(self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::from_factory(move |cx| {
            let f = Arc::clone(&f);
            self.subscribe(cx).inspect_ok(move |item| f(item)).boxed()
        })
    }

    /// Trace every signal of each subscription under `label`.
    ///
    /// Values and ordering are untouched.
    #[must_use]
    pub fn log(self, label: &'static str) -> Self
    where
        T: fmt::Debug,
    {
        Self::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            Box::pin(stream! {
                tracing::debug!(seq = label, "on_subscribe");
                let mut watch = CancelWatch { label, finished: false };
                while let Some(event) = upstream.next().await {
                    let failed = event.is_err();
                    match &event {
                        Ok(item) => tracing::debug!(seq = label, "on_next({item:?})"),
                        Err(error) => tracing::debug!(seq = label, %error, "on_error"),
                    }
                    if failed {
                        watch.finished = true;
                    }
                    yield event;
                    if failed {
                        return;
                    }
                }
                watch.finished = true;
                tracing::debug!(seq = label, "on_complete");
            })
        })
    }

    /// Apply a reusable sub-pipeline to this whole sequence.
    ///
    /// `f` runs once, at construction time.
    ///
    /// # Examples
    ///
    /// ```
    /// use composable_reactor_core::Seq;
    ///
    /// let long_upper = |names: Seq<&'static str>| {
    ///     names.map(str::to_uppercase).filter(|s| s.len() > 3)
    /// };
    /// let names = Seq::from_iterable(["alex", "ben"]).transform(long_upper);
    /// # let _ = names;
    /// ```
    #[must_use]
    pub fn transform<R, F>(self, f: F) -> Seq<R>
    where
        F: FnOnce(Self) -> Seq<R>,
    {
        f(self)
    }

    /// Forward `fallback` in its entirety if this completes without items.
    ///
    /// The fallback is only subscribed after the empty completion has been
    /// observed; failures pass through unchanged.
    #[must_use]
    pub fn switch_if_empty(self, fallback: Self) -> Self {
        Self::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            let fallback = fallback.clone();
            let cx = cx.clone();
            Box::pin(stream! {
                let mut seen = false;
                while let Some(event) = upstream.next().await {
                    seen = true;
                    yield event;
                }
                if !seen {
                    tracing::trace!("Upstream completed empty, switching to fallback");
                    let mut alternate = fallback.subscribe(&cx);
                    while let Some(event) = alternate.next().await {
                        yield event;
                    }
                }
            })
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Seq<T> {
    /// Emit `fallback` if this completes without items.
    #[must_use]
    pub fn default_if_empty(self, fallback: T) -> Self {
        Self::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            let fallback = fallback.clone();
            Box::pin(stream! {
                let mut seen = false;
                while let Some(event) = upstream.next().await {
                    seen = true;
                    yield event;
                }
                if !seen {
                    yield Ok(fallback);
                }
            })
        })
    }
}

/// Logs a cancellation if the subscription is dropped before its terminal event.
struct CancelWatch {
    label: &'static str,
    finished: bool,
}

impl Drop for CancelWatch {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(seq = self.label, "on_cancel");
        }
    }
}
