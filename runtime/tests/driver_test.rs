//! Integration tests for driving sequences on Tokio time.
//!
//! Every test runs with a paused clock, so delays resolve instantly while
//! elapsed times stay exact.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use composable_reactor_core::{Opt, Seq, SeqError, Terminal, concat, merge, merge_sequential, seq};
use composable_reactor_runtime::{DriveError, Driver, DriverConfig};
use composable_reactor_testing::{VirtualScheduler, init_test_tracing, run_virtual};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FIRST: Duration = Duration::from_millis(100);
const SECOND: Duration = Duration::from_millis(125);

fn abc() -> Seq<&'static str> {
    seq!["A", "B", "C"].delay_elements(FIRST)
}

fn def() -> Seq<&'static str> {
    seq!["D", "E", "F"].delay_elements(SECOND)
}

fn driver() -> Driver {
    Driver::tokio(DriverConfig::default()).expect("inside a Tokio runtime")
}

fn assert_elapsed(elapsed: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(elapsed >= expected, "elapsed {elapsed:?} < {expected:?}");
    assert!(
        elapsed < expected + Duration::from_millis(10),
        "elapsed {elapsed:?} well past {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn merge_interleaves_by_emission_time() {
    let outcome = driver().collect(&merge([abc(), def()])).await.unwrap();

    assert_eq!(outcome.items, vec!["A", "D", "B", "E", "C", "F"]);
    assert_eq!(outcome.terminal, Terminal::Complete);
    assert_elapsed(outcome.elapsed, 375);
}

#[tokio::test(start_paused = true)]
async fn concat_runs_sources_back_to_back() {
    let outcome = driver().collect(&concat([abc(), def()])).await.unwrap();

    assert_eq!(outcome.items, vec!["A", "B", "C", "D", "E", "F"]);
    assert_elapsed(outcome.elapsed, 675);
}

#[tokio::test(start_paused = true)]
async fn merge_sequential_is_ordered_but_concurrent() {
    let outcome = driver().collect(&merge_sequential([abc(), def()])).await.unwrap();

    assert_eq!(outcome.items, vec!["A", "B", "C", "D", "E", "F"]);
    assert_elapsed(outcome.elapsed, 375);
}

#[tokio::test(start_paused = true)]
async fn delayed_opt_resolves_after_delay() {
    let outcome = driver()
        .collect(&Opt::just("alex").delay_element(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(outcome.items, vec!["alex"]);
    assert_eq!(outcome.terminal, Terminal::Complete);
    assert_elapsed(outcome.elapsed, 300);
}

#[tokio::test(start_paused = true)]
async fn timeout_drops_the_drive() {
    let driver = Driver::tokio(DriverConfig::default().with_timeout(Duration::from_millis(150))).unwrap();

    let result = driver.collect(&seq![1, 2, 3].delay_elements(Duration::from_secs(1))).await;

    assert!(matches!(result, Err(DriveError::Timeout(limit)) if limit == Duration::from_millis(150)));
}

#[tokio::test(start_paused = true)]
async fn failure_arrives_as_terminal() {
    let failing = abc().concat_with(Seq::fail(SeqError::upstream("connection reset")));
    let outcome = driver().collect(&failing).await.unwrap();

    assert_eq!(outcome.items, vec!["A", "B", "C"]);
    assert_eq!(
        outcome.terminal,
        Terminal::Failed(SeqError::upstream("connection reset"))
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_subscription_stops_delivering() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let terminated = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&delivered);
    let end = Arc::clone(&terminated);
    let subscription = driver()
        .subscribe(
            &abc(),
            move |item| sink.lock().unwrap().push(item),
            move |terminal| *end.lock().unwrap() = Some(terminal.clone()),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    subscription.cancel();
    subscription.join().await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*delivered.lock().unwrap(), vec!["A"]);
    assert!(terminated.lock().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn subscription_reports_terminal() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let terminated = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&delivered);
    let end = Arc::clone(&terminated);
    let subscription = driver()
        .subscribe(
            &merge([abc(), def()]),
            move |item| sink.lock().unwrap().push(item),
            move |terminal| *end.lock().unwrap() = Some(terminal.clone()),
        )
        .unwrap();

    subscription.join().await.unwrap();

    assert_eq!(delivered.lock().unwrap().len(), 6);
    assert_eq!(*terminated.lock().unwrap(), Some(Terminal::Complete));
}

#[tokio::test(start_paused = true)]
async fn resubscribing_replays_from_scratch() {
    let driver = driver();
    let names = seq!["alex", "ben", "chloe"].delay_elements(Duration::from_millis(10));

    let first = driver.collect(&names).await.unwrap();
    let second = driver.collect(&names).await.unwrap();

    assert_eq!(first.items, second.items);
    assert_eq!(first.elapsed, second.elapsed);
}

#[test]
fn driver_needs_a_runtime() {
    assert!(matches!(
        Driver::tokio(DriverConfig::default()),
        Err(DriveError::NoRuntime(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn tokio_time_agrees_with_virtual_time() {
    init_test_tracing();
    let pipeline =
        merge([abc(), def()]).flat_map(|letter| seq![letter, letter].delay_elements(Duration::from_millis(10)));

    let on_tokio = driver().collect(&pipeline).await.unwrap();
    let on_virtual = run_virtual(&pipeline, &VirtualScheduler::new()).unwrap();

    assert_eq!(on_tokio.items, on_virtual.items);
    assert_eq!(on_tokio.terminal, on_virtual.terminal);
    assert_elapsed(on_tokio.elapsed, u64::try_from(on_virtual.elapsed.as_millis()).unwrap());
}
