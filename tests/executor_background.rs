// tests/executor_background.rs
#![cfg(unix)]

use std::time::{Duration, Instant};

use runcmd::errors::RunError;
use runcmd::exec::{Background, Executor, Sink};
use runcmd_test_utils::{eventually, init_tracing, with_timeout};

#[tokio::test]
async fn background_run_returns_before_the_child_exits() {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let tracker = Background::new();
    let executor = Executor::new("sh")
        .foreground(false)
        .stdout(sink)
        .capture_stdout(true)
        .track_background(tracker.clone());

    let started = Instant::now();
    let out = executor.run(&["-c", "sleep 0.5; echo done"]).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(400), "background run blocked for {elapsed:?}");
    assert!(out.is_success());
    assert_eq!(out.stdout, "", "background runs never return captures");
    assert_eq!(out.stderr, "");
    assert!(streamed.is_empty(), "child should still be sleeping");

    with_timeout(tracker.drain()).await;
    assert_eq!(streamed.text(), "done\n");
    assert_eq!(tracker.pending(), 0);
}

#[tokio::test]
async fn background_output_reaches_the_sink_without_a_tracker() {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let out = Executor::new("echo")
        .foreground(false)
        .stdout(sink)
        .run(&["later"])
        .await;

    assert!(out.is_success());
    let arrived = eventually(Duration::from_secs(5), || streamed.text() == "later\n").await;
    assert!(arrived, "sink contents: {:?}", streamed.text());
}

#[tokio::test]
async fn background_exit_failure_is_not_returned() {
    init_tracing();

    let tracker = Background::new();
    let out = Executor::new("false")
        .foreground(false)
        .stdout(Sink::null())
        .track_background(tracker.clone())
        .run(&[] as &[&str])
        .await;

    assert!(out.result.is_ok(), "exit errors are only logged in background mode");
    with_timeout(tracker.drain()).await;
}

#[tokio::test]
async fn background_start_failure_is_returned_immediately() {
    init_tracing();

    let tracker = Background::new();
    let out = Executor::new("runcmd-definitely-not-a-real-binary")
        .foreground(false)
        .stdout(Sink::null())
        .track_background(tracker.clone())
        .run(&[] as &[&str])
        .await;

    assert!(
        matches!(out.result, Err(RunError::Start { .. })),
        "expected Start error, got {:?}",
        out.result
    );
    assert_eq!(tracker.pending(), 0, "nothing to wait on after a failed start");
}

#[tokio::test]
async fn background_timeout_still_kills_the_child() {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let tracker = Background::new();
    let out = Executor::new("sh")
        .foreground(false)
        .timeout(Duration::from_millis(300))
        .stdout(sink)
        .track_background(tracker.clone())
        .run(&["-c", "exec sleep 5; echo unreachable"])
        .await;

    assert!(out.is_success());

    let started = Instant::now();
    with_timeout(tracker.drain()).await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(streamed.is_empty());
}
