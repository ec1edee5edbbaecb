//! Reductions of a whole sequence into an [`Opt`].

use crate::opt::Opt;
use crate::seq::Seq;
use futures::future::{self, FutureExt};
use futures::stream::{StreamExt, TryStreamExt};

impl<T: Send + 'static> Seq<T> {
    /// Gather every item into a `Vec`.
    ///
    /// An empty sequence yields an empty `Vec`, never an empty `Opt`.
    #[must_use]
    pub fn collect_list(self) -> Opt<Vec<T>> {
        Opt::from_factory(move |cx| {
            self.subscribe(cx)
                .try_collect::<Vec<T>>()
                .map(|collected| collected.map(Some))
                .boxed()
        })
    }

    /// Count the items.
    #[must_use]
    pub fn count(self) -> Opt<usize> {
        Opt::from_factory(move |cx| {
            self.subscribe(cx)
                .try_fold(0_usize, |count, _| future::ready(Ok(count + 1)))
                .map(|counted| counted.map(Some))
                .boxed()
        })
    }

    /// The first item; the subscription is dropped as soon as it arrives.
    #[must_use]
    pub fn first(self) -> Opt<T> {
        Opt::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            async move { upstream.next().await.transpose() }.boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SeqError;
    use crate::seq;
    use crate::seq::Seq;
    use crate::test_support::{context, resolve};

    #[test]
    fn collect_list_gathers_in_order() {
        let names = seq!["alex", "ben"].map(str::to_uppercase).collect_list();
        assert_eq!(
            resolve(&names, &context()),
            Ok(Some(vec!["ALEX".to_string(), "BEN".to_string()]))
        );
    }

    #[test]
    fn collect_list_of_empty_is_empty_vec() {
        assert_eq!(resolve(&Seq::<u8>::empty().collect_list(), &context()), Ok(Some(vec![])));
    }

    #[test]
    fn count_and_first() {
        let cx = context();
        assert_eq!(resolve(&seq![4, 5, 6].count(), &cx), Ok(Some(3)));
        assert_eq!(resolve(&seq![4, 5, 6].first(), &cx), Ok(Some(4)));
        assert_eq!(resolve(&Seq::<i32>::empty().first(), &cx), Ok(None));
    }

    #[test]
    fn failure_propagates() {
        let failing = seq![1].concat_with(Seq::fail(SeqError::upstream("boom")));
        assert_eq!(
            resolve(&failing.collect_list(), &context()),
            Err(SeqError::upstream("boom"))
        );
    }
}
