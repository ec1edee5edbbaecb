//! Emission-time multiplexing shared by `merge` and `flat_map`.

use crate::error::Result;
use crate::seq::BoxSeqStream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

/// Polls a set of running sequences and yields whichever item is ready first.
///
/// Lanes are polled in subscription order on every wake, so when several are
/// ready at once the earliest-subscribed one wins. A lane that completes is
/// dropped; a lane that fails ends the whole interleave.
pub(crate) struct Interleave<T> {
    lanes: Vec<BoxSeqStream<T>>,
}

impl<T> Interleave<T> {
    pub(crate) const fn new() -> Self {
        Self { lanes: Vec::new() }
    }

    pub(crate) fn from_lanes(lanes: Vec<BoxSeqStream<T>>) -> Self {
        Self { lanes }
    }

    pub(crate) fn push(&mut self, lane: BoxSeqStream<T>) {
        self.lanes.push(lane);
    }

    /// `Ready(None)` once every lane has completed.
    pub(crate) fn poll_lanes(&mut self, cx: &mut TaskContext<'_>) -> Poll<Option<Result<T>>> {
        let mut index = 0;
        while index < self.lanes.len() {
            match self.lanes[index].poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => return Poll::Ready(Some(Ok(item))),
                Poll::Ready(Some(Err(error))) => {
                    self.lanes.clear();
                    return Poll::Ready(Some(Err(error)));
                },
                Poll::Ready(None) => {
                    self.lanes.remove(index);
                },
                Poll::Pending => index += 1,
            }
        }

        if self.lanes.is_empty() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

impl<T> Stream for Interleave<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_lanes(cx)
    }
}
