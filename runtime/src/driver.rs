//! Subscription driver: subscribes to a source and pumps it to its terminal.
//!
//! A [`Driver`] owns the scheduler that drives get their delays from. Every
//! drive opens a fresh execution of the source (sources are cold), delivers
//! items in order, and reports exactly one [`Terminal`] if it runs to the
//! end. Dropping a drive, through a timeout or [`Subscription::cancel`],
//! drops the whole operator tree and with it every pending scheduler item.

use crate::error::DriveError;
use crate::metrics::{DRIVE_ITEMS, DRIVE_STARTED, DRIVE_TERMINAL};
use crate::scheduler::TokioScheduler;
use composable_reactor_core::{BoxSeqStream, Context, Publisher, SchedulerHandle, Terminal};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Configuration for a [`Driver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Upper bound on a single drive, measured on Tokio time
    timeout: Option<Duration>,

    /// Trace the index of every delivered item
    trace_items: bool,
}

impl DriverConfig {
    /// Create a configuration with default settings
    ///
    /// Defaults:
    /// - `timeout`: none
    /// - `trace_items`: false
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: None,
            trace_items: false,
        }
    }

    /// Fail drives that do not terminate within `timeout`
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Let drives run for as long as they need
    #[must_use]
    pub const fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Emit a `trace!` event for every delivered item
    #[must_use]
    pub const fn with_trace_items(mut self, trace_items: bool) -> Self {
        self.trace_items = trace_items;
        self
    }

    /// Configured drive timeout
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether per-item tracing is enabled
    #[must_use]
    pub const fn trace_items(&self) -> bool {
        self.trace_items
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a completed drive produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Items in delivery order
    pub items: Vec<T>,

    /// How the drive ended
    pub terminal: Terminal,

    /// Scheduler time between subscription and terminal
    pub elapsed: Duration,
}

impl<T> Outcome<T> {
    /// Check if the source ended without failing
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.terminal.is_success()
    }
}

/// Drives sources to completion.
///
/// # Example
///
/// ```ignore
/// let driver = Driver::tokio(DriverConfig::default().with_timeout(Duration::from_secs(5)))?;
///
/// driver
///     .drive(
///         &service.names(),
///         |name| println!("Name is : {name}"),
///         |terminal| tracing::info!(%terminal, "names finished"),
///     )
///     .await?;
/// ```
#[derive(Clone)]
pub struct Driver {
    scheduler: SchedulerHandle,
    config: DriverConfig,
}

impl Driver {
    /// Create a driver taking delays from `scheduler`.
    #[must_use]
    pub fn new(scheduler: SchedulerHandle, config: DriverConfig) -> Self {
        Self { scheduler, config }
    }

    /// Create a driver on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::NoRuntime`] when called outside a Tokio runtime.
    pub fn tokio(config: DriverConfig) -> Result<Self, DriveError> {
        Ok(Self::new(Arc::new(TokioScheduler::try_current()?), config))
    }

    /// The context handed to sources on subscription.
    #[must_use]
    pub fn context(&self) -> Context {
        Context::new(Arc::clone(&self.scheduler))
    }

    /// This driver's configuration.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Drive `source` to its end, calling `on_item` for every item and
    /// `on_terminal` once with the terminal event.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Timeout`] if the drive exceeds the configured
    /// timeout; `on_terminal` is not called in that case.
    #[tracing::instrument(skip_all, name = "drive")]
    pub async fn drive<P, N, D>(
        &self,
        source: &P,
        mut on_item: N,
        on_terminal: D,
    ) -> Result<(), DriveError>
    where
        P: Publisher + ?Sized,
        N: FnMut(P::Item),
        D: FnOnce(&Terminal),
    {
        let stream = self.open(source);
        let when_empty = source.terminal_when_empty();
        let trace_items = self.config.trace_items;

        let terminal = within(
            self.config.timeout,
            pump(stream, when_empty, trace_items, &mut on_item),
        )
        .await?;
        on_terminal(&terminal);
        Ok(())
    }

    /// Drive `source` to its end and gather what it produced.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::Timeout`] if the drive exceeds the configured
    /// timeout.
    pub async fn collect<P>(&self, source: &P) -> Result<Outcome<P::Item>, DriveError>
    where
        P: Publisher + ?Sized,
    {
        let started = self.scheduler.now();
        let mut items = Vec::new();
        let mut terminal = None;
        self.drive(source, |item| items.push(item), |end| terminal = Some(end.clone()))
            .await?;

        Ok(Outcome {
            items,
            terminal: terminal.unwrap_or(Terminal::Complete),
            elapsed: self.scheduler.now().saturating_sub(started),
        })
    }

    /// Drive `source` on its own Tokio task.
    ///
    /// The source is subscribed before this returns. Items and the terminal
    /// event are delivered from the spawned task.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::NoRuntime`] when called outside a Tokio runtime.
    pub fn subscribe<P, N, D>(
        &self,
        source: &P,
        mut on_item: N,
        on_terminal: D,
    ) -> Result<Subscription, DriveError>
    where
        P: Publisher + ?Sized,
        N: FnMut(P::Item) + Send + 'static,
        D: FnOnce(&Terminal) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|error| DriveError::NoRuntime(error.to_string()))?;
        let stream = self.open(source);
        let when_empty = source.terminal_when_empty();
        let config = self.config;

        let task = runtime.spawn(async move {
            let pumped = within(
                config.timeout,
                pump(stream, when_empty, config.trace_items, &mut on_item),
            )
            .await;
            match pumped {
                Ok(terminal) => on_terminal(&terminal),
                Err(error) => tracing::warn!(%error, "Subscription ended without a terminal event"),
            }
        });

        Ok(Subscription { task })
    }

    fn open<P>(&self, source: &P) -> BoxSeqStream<P::Item>
    where
        P: Publisher + ?Sized,
    {
        ::metrics::counter!(DRIVE_STARTED).increment(1);
        tracing::debug!("Subscribing to source");
        source.open(&self.context())
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A drive running on a spawned task.
///
/// Dropping the handle detaches the drive; it keeps running.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop the drive.
    ///
    /// The stream is dropped on the task's next scheduling point, cancelling
    /// in-flight inner sequences and their timers. No terminal callback runs
    /// after cancellation; items already delivered stay delivered.
    pub fn cancel(&self) {
        tracing::debug!("Cancelling subscription");
        self.task.abort();
    }

    /// Whether the drive has ended (terminated or cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the drive to end.
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::TaskJoin`] if a callback panicked. A cancelled
    /// drive joins successfully.
    pub async fn join(self) -> Result<(), DriveError> {
        match self.task.await {
            Ok(()) => Ok(()),
            Err(error) if error.is_cancelled() => Ok(()),
            Err(error) => Err(DriveError::TaskJoin(error)),
        }
    }
}

async fn within<F>(limit: Option<Duration>, drive: F) -> Result<F::Output, DriveError>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, drive)
            .await
            .map_err(|_| DriveError::Timeout(limit)),
        None => Ok(drive.await),
    }
}

async fn pump<T, N>(
    mut stream: BoxSeqStream<T>,
    when_empty: Terminal,
    trace_items: bool,
    on_item: &mut N,
) -> Terminal
where
    N: FnMut(T),
{
    let mut delivered: u64 = 0;
    let terminal = loop {
        match stream.next().await {
            Some(Ok(item)) => {
                if trace_items {
                    tracing::trace!(index = delivered, "on_next");
                }
                delivered += 1;
                on_item(item);
            },
            Some(Err(error)) => break Terminal::Failed(error),
            None if delivered == 0 => break when_empty,
            None => break Terminal::Complete,
        }
    };

    ::metrics::counter!(DRIVE_ITEMS).increment(delivered);
    ::metrics::counter!(DRIVE_TERMINAL, "signal" => terminal.label()).increment(1);
    tracing::debug!(%terminal, items = delivered, "Drive terminated");
    terminal
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use composable_reactor_core::{Opt, Seq, SeqError, seq};

    #[tokio::test]
    async fn collect_synchronous_pipeline() {
        let driver = Driver::tokio(DriverConfig::default()).unwrap();
        let names = seq!["alex", "ben", "chloe"]
            .map(str::to_uppercase)
            .filter(|name| name.len() > 3);

        let outcome = driver.collect(&names).await.unwrap();

        assert_eq!(outcome.items, vec!["ALEX", "CHLOE"]);
        assert_eq!(outcome.terminal, Terminal::Complete);
    }

    #[tokio::test]
    async fn empty_opt_reports_empty() {
        let driver = Driver::tokio(DriverConfig::default()).unwrap();

        let empty = driver.collect(&Opt::<u8>::empty()).await.unwrap();
        let full = driver.collect(&Opt::just(1_u8)).await.unwrap();
        let none = driver.collect(&Seq::<u8>::empty()).await.unwrap();

        assert_eq!(empty.terminal, Terminal::Empty);
        assert_eq!(full.terminal, Terminal::Complete);
        assert_eq!(none.terminal, Terminal::Complete);
    }

    #[tokio::test]
    async fn terminal_callback_runs_once() {
        let driver = Driver::tokio(DriverConfig::default().with_trace_items(true)).unwrap();
        let mut terminals = Vec::new();
        let mut items = Vec::new();

        driver
            .drive(
                &seq![1].concat_with(Seq::fail(SeqError::upstream("gone"))),
                |item| items.push(item),
                |terminal| terminals.push(terminal.clone()),
            )
            .await
            .unwrap();

        assert_eq!(items, vec![1]);
        assert_eq!(terminals, vec![Terminal::Failed(SeqError::upstream("gone"))]);
    }

    #[test]
    fn config_builder() {
        let config = DriverConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_trace_items(true);

        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert!(config.trace_items());
        assert_eq!(config.without_timeout().timeout(), None);
        assert_eq!(DriverConfig::default(), DriverConfig::new());
    }
}
