//! Time-shifting operators.

use crate::seq::Seq;
use async_stream::stream;
use futures::stream::StreamExt;
use std::time::Duration;

impl<T: Send + 'static> Seq<T> {
    /// Delay every item by `delay` on the context's scheduler.
    ///
    /// The delay for an item starts once that item has been received, so a
    /// synchronous source of `n` items takes `n * delay` to drain. Completion
    /// follows the last delayed item immediately; a failure is forwarded
    /// without delay.
    #[must_use]
    pub fn delay_elements(self, delay: Duration) -> Self {
        Self::from_factory(move |cx| {
            let mut upstream = self.subscribe(cx);
            let cx = cx.clone();
            Box::pin(stream! {
                while let Some(event) = upstream.next().await {
                    match event {
                        Ok(item) => {
                            cx.sleep(delay).await;
                            yield Ok(item);
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
