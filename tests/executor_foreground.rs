// tests/executor_foreground.rs
#![cfg(unix)]

use std::error::Error;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use runcmd::errors::RunError;
use runcmd::exec::{Executor, Sink};
use runcmd_test_utils::{init_tracing, with_timeout};
use tokio::io::AsyncWrite;

type TestResult = Result<(), Box<dyn Error>>;

const NO_ARGS: &[&str] = &[];

#[tokio::test]
async fn true_exits_cleanly_with_empty_captures() {
    init_tracing();

    let (sink, _buf) = Sink::buffer();
    let out = with_timeout(Executor::new("true").stdout(sink).run(NO_ARGS)).await;

    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "");
    assert!(out.result.is_ok(), "unexpected error: {:?}", out.result);
}

#[tokio::test]
async fn false_reports_exit_error() {
    init_tracing();

    let (sink, _buf) = Sink::buffer();
    let out = with_timeout(Executor::new("false").stdout(sink).run(NO_ARGS)).await;

    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "");
    match out.result {
        Err(RunError::Exit { ref command, status }) => {
            assert_eq!(command, "false");
            assert_eq!(status.code(), Some(1));
        }
        other => panic!("expected Exit error, got {other:?}"),
    }
}

#[tokio::test]
async fn captured_stdout_matches_child_output_and_is_still_streamed() -> TestResult {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let executor = Executor::new("echo").stdout(sink).out_placeholder("{out}");
    let out = with_timeout(executor.run(&["hello"])).await;

    assert_eq!(out.stdout, "hello\n");
    assert_eq!(out.stderr, "");
    assert_eq!(streamed.text(), "hello\n");
    out.result?;
    Ok(())
}

#[tokio::test]
async fn capture_disabled_returns_empty_strings() {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(sink)
            .run(&["-c", "echo visible; echo also >&2"]),
    )
    .await;

    assert!(out.is_success());
    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "");
    let text = streamed.text();
    assert!(text.contains("visible\n"));
    assert!(text.contains("also\n"));
}

#[tokio::test]
async fn stderr_capture_is_independent_of_stdout_capture() -> TestResult {
    init_tracing();

    let (sink, _buf) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(sink)
            .capture_stderr(true)
            .run(&["-c", "echo out; echo oops >&2"]),
    )
    .await;

    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "oops\n");
    out.result?;
    Ok(())
}

#[tokio::test]
async fn stderr_falls_back_to_primary_sink() {
    init_tracing();

    let (primary, primary_buf) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(primary)
            .run(&["-c", "echo to-out; echo to-err >&2"]),
    )
    .await;

    assert!(out.is_success());
    let text = primary_buf.text();
    assert!(text.contains("to-out\n"), "primary sink missing stdout: {text:?}");
    assert!(text.contains("to-err\n"), "primary sink missing stderr: {text:?}");
}

#[tokio::test]
async fn separate_error_sink_receives_only_stderr() {
    init_tracing();

    let (primary, primary_buf) = Sink::buffer();
    let (errors, error_buf) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(primary)
            .stderr(errors)
            .capture_stdout(true)
            .capture_stderr(true)
            .run(&["-c", "echo to-out; echo to-err >&2"]),
    )
    .await;

    assert!(out.is_success());
    assert_eq!(primary_buf.text(), "to-out\n");
    assert_eq!(error_buf.text(), "to-err\n");
    assert_eq!(out.stdout, "to-out\n");
    assert_eq!(out.stderr, "to-err\n");
}

#[tokio::test]
async fn partial_output_survives_failure() {
    init_tracing();

    let (sink, _buf) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(sink)
            .capture_stdout(true)
            .run(&["-c", "echo partial; exit 3"]),
    )
    .await;

    assert_eq!(out.stdout, "partial\n");
    let err = out.error().expect("exit 3 must be an error");
    assert_eq!(err.exit_status().and_then(|s| s.code()), Some(3));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn large_output_is_captured_without_truncation() -> TestResult {
    init_tracing();

    let (sink, streamed) = Sink::buffer();
    let out = with_timeout(
        Executor::new("sh")
            .stdout(sink)
            .capture_stdout(true)
            .run(&["-c", "head -c 200000 /dev/zero | tr '\\0' 'a'"]),
    )
    .await;

    assert_eq!(out.stdout.len(), 200_000);
    assert!(out.stdout.bytes().all(|b| b == b'a'));
    assert_eq!(streamed.contents().len(), 200_000);
    out.result?;
    Ok(())
}

#[tokio::test]
async fn runs_in_configured_directory() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (sink, _buf) = Sink::buffer();
    let out = with_timeout(
        Executor::new("pwd")
            .directory(dir.path())
            .stdout(sink)
            .capture_stdout(true)
            .run(NO_ARGS),
    )
    .await;

    let reported = PathBuf::from(out.stdout.trim_end()).canonicalize()?;
    assert_eq!(reported, dir.path().canonicalize()?);
    out.result?;
    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_start_error() {
    init_tracing();

    let out = with_timeout(
        Executor::new("runcmd-definitely-not-a-real-binary")
            .stdout(Sink::null())
            .run(NO_ARGS),
    )
    .await;

    match out.result {
        Err(RunError::Start { ref source, .. }) => {
            assert_eq!(source.kind(), ErrorKind::NotFound);
        }
        other => panic!("expected Start error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_directory_is_a_start_error() {
    init_tracing();

    let out = with_timeout(
        Executor::new("true")
            .directory("/this/directory/does/not/exist")
            .stdout(Sink::null())
            .run(NO_ARGS),
    )
    .await;

    assert!(
        matches!(out.result, Err(RunError::Start { .. })),
        "expected Start error, got {:?}",
        out.result
    );
}

#[test]
fn empty_directory_means_inherit() {
    let executor = Executor::new("true").directory("");
    assert!(executor.working_directory().is_none());
}

/// Rejects every write.
struct ClosedWriter;

impl AsyncWrite for ClosedWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::Error::new(ErrorKind::BrokenPipe, "closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn sink_failure_surfaces_after_a_clean_exit() {
    init_tracing();

    let out = with_timeout(
        Executor::new("echo")
            .stdout(Sink::new("closed", ClosedWriter))
            .capture_stdout(true)
            .run(&["hi"]),
    )
    .await;

    match out.result {
        Err(RunError::Output { stream, ref source }) => {
            assert_eq!(stream, runcmd::exec::Stream::Stdout);
            assert_eq!(source.kind(), ErrorKind::BrokenPipe);
            assert!(source.to_string().contains("sink 'closed'"), "{source}");
        }
        other => panic!("expected Output error, got {other:?}"),
    }
    // Capture sits after the failing sink in the fan-out, so it saw nothing.
    assert_eq!(out.stdout, "");
}

#[tokio::test]
async fn shared_sink_keeps_each_stream_in_order() -> TestResult {
    init_tracing();

    let (sink, buffer) = Sink::buffer();
    let script = "for i in 1 2 3 4 5; do echo out$i; echo err$i >&2; done";
    let out = with_timeout(Executor::new("sh").stdout(sink).run(&["-c", script])).await;
    out.result?;

    let text = buffer.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10, "{text:?}");

    // Cross-stream interleaving is not fixed; per-stream order is.
    let outs: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with("out")).collect();
    let errs: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with("err")).collect();
    assert_eq!(outs, ["out1", "out2", "out3", "out4", "out5"]);
    assert_eq!(errs, ["err1", "err2", "err3", "err4", "err5"]);
    Ok(())
}

#[tokio::test]
async fn into_result_keeps_captures_only_on_success() -> TestResult {
    init_tracing();

    let (stdout, stderr) = with_timeout(
        Executor::new("sh")
            .stdout(Sink::null())
            .capture_stdout(true)
            .capture_stderr(true)
            .run(&["-c", "echo up; echo down >&2"]),
    )
    .await
    .into_result()?;
    assert_eq!(stdout, "up\n");
    assert_eq!(stderr, "down\n");

    let failed = with_timeout(
        Executor::new("sh")
            .stdout(Sink::null())
            .capture_stdout(true)
            .run(&["-c", "echo partial; exit 3"]),
    )
    .await
    .into_result();
    assert!(matches!(failed, Err(RunError::Exit { .. })));
    Ok(())
}
