// tests/executor_logging.rs
#![cfg(unix)]

//! Exactly one completion record per invocation, emitted after the child
//! has terminated. These tests install a thread-local capturing subscriber
//! and rely on the current-thread runtime of `#[tokio::test]`.

use runcmd::exec::{Background, EXIT_LOG_TARGET, Executor, Sink};
use runcmd_test_utils::{LogCapture, with_timeout};
use tracing::Level;

const NO_ARGS: &[&str] = &[];

#[tokio::test]
async fn success_is_logged_once_at_info() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let out = with_timeout(Executor::new("echo").stdout(Sink::null()).run(&["hi"])).await;
    assert!(out.is_success());

    let exits = logs.with_target(EXIT_LOG_TARGET);
    assert_eq!(exits.len(), 1, "events: {exits:?}");
    let event = &exits[0];
    assert_eq!(event.level, Level::INFO);
    assert_eq!(event.field("command"), Some(r#"["echo", "hi"]"#));
    assert!(event.field("duration").is_some());
    assert!(event.field("error").is_none());
}

#[tokio::test]
async fn failure_is_logged_once_at_error_with_the_error() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let out = with_timeout(Executor::new("false").stdout(Sink::null()).run(NO_ARGS)).await;
    assert!(!out.is_success());

    let exits = logs.with_target(EXIT_LOG_TARGET);
    assert_eq!(exits.len(), 1, "events: {exits:?}");
    let event = &exits[0];
    assert_eq!(event.level, Level::ERROR);
    assert_eq!(event.field("command"), Some(r#"["false"]"#));
    assert!(event.field("error").is_some_and(|e| e.contains("false")));
}

#[tokio::test]
async fn start_failure_is_logged_once() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let out = with_timeout(
        Executor::new("runcmd-definitely-not-a-real-binary")
            .stdout(Sink::null())
            .run(NO_ARGS),
    )
    .await;
    assert!(out.result.is_err());

    let exits = logs.with_target(EXIT_LOG_TARGET);
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].level, Level::ERROR);
}

#[tokio::test]
async fn background_failure_is_only_visible_in_the_log() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let tracker = Background::new();
    let out = Executor::new("sh")
        .foreground(false)
        .stdout(Sink::null())
        .track_background(tracker.clone())
        .run(&["-c", "sleep 0.2; exit 4"])
        .await;
    assert!(out.result.is_ok());

    // Not logged before the child has terminated.
    assert!(logs.with_target(EXIT_LOG_TARGET).is_empty());

    with_timeout(tracker.drain()).await;

    let exits = logs.with_target(EXIT_LOG_TARGET);
    assert_eq!(exits.len(), 1, "events: {exits:?}");
    assert_eq!(exits[0].level, Level::ERROR);
    assert!(exits[0].field("error").is_some_and(|e| e.contains('4')));
}

#[tokio::test]
async fn each_invocation_logs_independently() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let executor = Executor::new("true").stdout(Sink::null());
    for _ in 0..3 {
        with_timeout(executor.run(NO_ARGS)).await;
    }

    let exits = logs.with_target(EXIT_LOG_TARGET);
    assert_eq!(exits.len(), 3);
    assert!(exits.iter().all(|e| e.level == Level::INFO));
}
