//! The zero-or-one sequence type and its operators.
//!
//! An [`Opt`] is the single-value counterpart of [`Seq`]: a cold definition
//! that, each time it is resolved, yields a value, completes empty, or fails.

use crate::context::Context;
use crate::error::{Result, SeqError};
use crate::operators::combine;
use crate::seq::{BoxSeqStream, Seq};
use crate::signal::{Publisher, Terminal};
use async_stream::stream;
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self as futures_stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A running resolution of an [`Opt`].
pub type BoxOptFuture<T> = BoxFuture<'static, Result<Option<T>>>;

type Factory<T> = dyn Fn(&Context) -> BoxOptFuture<T> + Send + Sync;

/// A cold, deferred computation producing at most one value.
///
/// Resolving yields `Ok(Some(value))`, `Ok(None)` (empty), or `Err` (failed),
/// exactly once. Resolving again re-runs the computation.
///
/// # Examples
///
/// ```
/// use composable_reactor_core::Opt;
///
/// let name = Opt::just("alex")
///     .map(str::to_uppercase)
///     .filter(|name| name.len() > 3);
/// # let _ = name;
/// ```
pub struct Opt<T> {
    factory: Arc<Factory<T>>,
}

impl<T> Clone for Opt<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Opt<T> {
    /// An `Opt` that yields `value`.
    #[must_use]
    pub fn just(value: T) -> Self {
        Self::from_factory(move |_| future::ready(Ok(Some(value.clone()))).boxed())
    }

    /// Emit `fallback` if this completes empty.
    #[must_use]
    pub fn default_if_empty(self, fallback: T) -> Self {
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let fallback = fallback.clone();
            async move { Ok(Some(resolving.await?.unwrap_or(fallback))) }.boxed()
        })
    }
}

impl<T: Send + 'static> Opt<T> {
    /// Build an `Opt` from a factory invoked once per resolution.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(&Context) -> BoxOptFuture<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Build an `Opt` from a factory of futures.
    ///
    /// `make` is only called when the `Opt` is driven.
    pub fn from_future<F, Fut>(make: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>>> + Send + 'static,
    {
        Self::from_factory(move |_| make().boxed())
    }

    /// Pick the `Opt` to run at resolution time.
    pub fn defer<F>(make: F) -> Self
    where
        F: Fn() -> Self + Send + Sync + 'static,
    {
        let make = Arc::new(make);
        Self::from_factory(move |cx| {
            let cx = cx.clone();
            let make = Arc::clone(&make);
            async move { (*make)().resolve(&cx).await }.boxed()
        })
    }

    /// An `Opt` that completes empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_factory(|_| future::ready(Ok(None)).boxed())
    }

    /// An `Opt` that fails with `error`.
    #[must_use]
    pub fn fail(error: SeqError) -> Self {
        Self::from_factory(move |_| future::ready(Err(error.clone())).boxed())
    }

    /// Start a fresh resolution.
    pub fn resolve(&self, cx: &Context) -> BoxOptFuture<T> {
        (self.factory)(cx)
    }

    /// View this `Opt` as a sequence of zero or one item.
    #[must_use]
    pub fn into_seq(self) -> Seq<T> {
        Seq::from_factory(move |cx| self.open(cx))
    }

    /// Apply `f` to the value.
    #[must_use]
    pub fn map<R, F>(self, f: F) -> Opt<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Opt::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let f = Arc::clone(&f);
            async move { Ok(resolving.await?.map(|value| f(value))) }.boxed()
        })
    }

    /// Apply a fallible `f` to the value; an `Err` fails the `Opt` with
    /// [`SeqError::Transform`].
    #[must_use]
    pub fn try_map<R, E, F>(self, f: F) -> Opt<R>
    where
        R: Send + 'static,
        E: fmt::Display,
        F: Fn(T) -> std::result::Result<R, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Opt::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let f = Arc::clone(&f);
            async move {
                resolving
                    .await?
                    .map(|value| f(value).map_err(SeqError::transform))
                    .transpose()
            }
            .boxed()
        })
    }

    /// Complete empty unless the value satisfies `predicate`.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let predicate = Arc::clone(&predicate);
            async move { Ok(resolving.await?.filter(|value| predicate(value))) }.boxed()
        })
    }

    /// Observe the value without changing it.
    #[must_use]
    pub fn inspect<F>(self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let f = Arc::clone(&f);
            async move {
                let value = resolving.await?;
                if let Some(value) = &value {
                    f(value);
                }
                Ok(value)
            }
            .boxed()
        })
    }

    /// Trace the signals of each resolution under `label`.
    #[must_use]
    pub fn log(self, label: &'static str) -> Self
    where
        T: fmt::Debug,
    {
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            async move {
                tracing::debug!(seq = label, "on_subscribe");
                let outcome = resolving.await;
                match &outcome {
                    Ok(Some(value)) => tracing::debug!(seq = label, "on_next({value:?})"),
                    Ok(None) => tracing::debug!(seq = label, "on_complete (empty)"),
                    Err(error) => tracing::debug!(seq = label, %error, "on_error"),
                }
                outcome
            }
            .boxed()
        })
    }

    /// Resolve the `Opt` returned by `f` for the value.
    #[must_use]
    pub fn flat_map<R, F>(self, f: F) -> Opt<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Opt<R> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Opt::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let f = Arc::clone(&f);
            let cx = cx.clone();
            async move {
                match resolving.await? {
                    Some(value) => f(value).resolve(&cx).await,
                    None => Ok(None),
                }
            }
            .boxed()
        })
    }

    /// Continue with the sequence returned by `f` for the value.
    #[must_use]
    pub fn flat_map_many<R, F>(self, f: F) -> Seq<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Seq<R> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Seq::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let f = Arc::clone(&f);
            let cx = cx.clone();
            Box::pin(stream! {
                match resolving.await {
                    Ok(Some(value)) => {
                        let mut inner = f(value).subscribe(&cx);
                        while let Some(event) = inner.next().await {
                            yield event;
                        }
                    },
                    Ok(None) => {},
                    Err(error) => {
                        yield Err(error);
                    },
                }
            })
        })
    }

    /// Resolve `fallback` instead if this completes empty.
    #[must_use]
    pub fn switch_if_empty(self, fallback: Self) -> Self {
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let fallback = fallback.clone();
            let cx = cx.clone();
            async move {
                match resolving.await? {
                    Some(value) => Ok(Some(value)),
                    None => fallback.resolve(&cx).await,
                }
            }
            .boxed()
        })
    }

    /// Combine with `other` once both hold a value.
    ///
    /// Both sides are resolved concurrently. The result is empty if either
    /// side is empty and fails as soon as either side fails.
    #[must_use]
    pub fn zip_with<U, R, F>(self, other: Opt<U>, combiner: F) -> Opt<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let combiner = Arc::new(combiner);
        Opt::from_factory(move |cx| {
            let left = self.resolve(cx);
            let right = other.resolve(cx);
            let combiner = Arc::clone(&combiner);
            async move {
                let (left, right) = future::try_join(left, right).await?;
                Ok(left.zip(right).map(|(left, right)| combiner(left, right)))
            }
            .boxed()
        })
    }

    /// This value followed by `other`'s.
    #[must_use]
    pub fn concat_with(self, other: Self) -> Seq<T> {
        combine::concat([self.into_seq(), other.into_seq()])
    }

    /// This value and `other`'s, in the order they become available.
    #[must_use]
    pub fn merge_with(self, other: Self) -> Seq<T> {
        combine::merge([self.into_seq(), other.into_seq()])
    }

    /// Delay the value by `delay` on the context's scheduler.
    ///
    /// Empty completion and failure are not delayed.
    #[must_use]
    pub fn delay_element(self, delay: Duration) -> Self {
        Self::from_factory(move |cx| {
            let resolving = self.resolve(cx);
            let cx = cx.clone();
            async move {
                let value = resolving.await?;
                if value.is_some() {
                    cx.sleep(delay).await;
                }
                Ok(value)
            }
            .boxed()
        })
    }
}

impl<T: Send + 'static> Publisher for Opt<T> {
    type Item = T;

    fn open(&self, cx: &Context) -> BoxSeqStream<T> {
        futures_stream::once(self.resolve(cx))
            .filter_map(|outcome| future::ready(outcome.transpose()))
            .boxed()
    }

    fn terminal_when_empty(&self) -> Terminal {
        Terminal::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{collect, context, resolve};

    #[test]
    fn just_and_empty() {
        let cx = context();
        assert_eq!(resolve(&Opt::just(7), &cx), Ok(Some(7)));
        assert_eq!(resolve(&Opt::<i32>::empty(), &cx), Ok(None));
    }

    #[test]
    fn map_then_filter() {
        let cx = context();
        let kept = Opt::just("alex").map(str::to_uppercase).filter(|s| s.len() > 3);
        let dropped = Opt::just("ben").map(str::to_uppercase).filter(|s| s.len() > 3);

        assert_eq!(resolve(&kept, &cx), Ok(Some("ALEX".to_string())));
        assert_eq!(resolve(&dropped, &cx), Ok(None));
    }

    #[test]
    fn try_map_failure_becomes_transform_error() {
        let parsed = Opt::just("x12").try_map(|s| s.parse::<i32>());
        let result = resolve(&parsed, &context());

        assert!(matches!(result, Err(SeqError::Transform(_))));
    }

    #[test]
    fn fallbacks_apply_only_when_empty() {
        let cx = context();
        assert_eq!(resolve(&Opt::empty().default_if_empty(1), &cx), Ok(Some(1)));
        assert_eq!(resolve(&Opt::just(2).default_if_empty(1), &cx), Ok(Some(2)));
        assert_eq!(
            resolve(&Opt::empty().switch_if_empty(Opt::just(3)), &cx),
            Ok(Some(3))
        );
    }

    #[test]
    fn flat_map_and_flat_map_many() {
        let cx = context();
        let list = Opt::just("alex").flat_map(|s| {
            Opt::just(s.chars().map(String::from).collect::<Vec<_>>())
        });
        let letters = Opt::just("alex").flat_map_many(|s| {
            Seq::from_iterable(s.chars().map(String::from).collect::<Vec<_>>())
        });

        assert_eq!(
            resolve(&list, &cx),
            Ok(Some(vec!["a".into(), "l".into(), "e".into(), "x".into()]))
        );
        assert_eq!(collect(&letters, &cx).0, vec!["a", "l", "e", "x"]);
    }

    #[test]
    fn zip_with_combines_or_empties() {
        let cx = context();
        let both = Opt::just("A").zip_with(Opt::just("B"), |a, b| format!("{a}{b}"));
        let one_empty = Opt::just("A").zip_with(Opt::<&str>::empty(), |a, b| format!("{a}{b}"));

        assert_eq!(resolve(&both, &cx), Ok(Some("AB".to_string())));
        assert_eq!(resolve(&one_empty, &cx), Ok(None));
    }

    #[test]
    fn concat_with_yields_both() {
        let seq = Opt::just("A").concat_with(Opt::just("B"));
        assert_eq!(collect(&seq, &context()).0, vec!["A", "B"]);
    }

    #[test]
    fn publisher_reports_empty() {
        assert_eq!(Opt::<u8>::empty().terminal_when_empty(), Terminal::Empty);
    }

    #[test]
    fn switch_if_empty_never_starts_fallback_for_a_value() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let fallback = Opt::defer(move || {
            flag.store(true, Ordering::SeqCst);
            Opt::just("fallback")
        });

        let resolved = resolve(&Opt::just("alex").switch_if_empty(fallback), &context());

        assert_eq!(resolved, Ok(Some("alex")));
        assert!(!started.load(Ordering::SeqCst));
    }
}
