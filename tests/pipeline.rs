mod fixture;

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use copilot_stream::{
    handoff, run_pipeline, CancelReason, CancelSignal, Chunk, MarkdownRenderer, MarkdownTheme,
    RenderError, RenderState, StreamDecoder, StreamError, TerminalRenderer,
};
use fixture::{
    body_in_reads, body_of_frames, content_frame, done_frame, event_stream, read_fixture,
    split_chars,
};
use futures_util::stream::{self, StreamExt};
use pretty_assertions::assert_eq;

type Segments = Arc<Mutex<Vec<String>>>;

/// Styled renderer that records every segment it is asked to format.
fn recording_renderer() -> (TerminalRenderer<Vec<u8>>, Segments) {
    let seen: Segments = Arc::default();
    let sink = Arc::clone(&seen);
    let renderer = TerminalRenderer::styled(
        Vec::new(),
        move |segment: &str| -> Result<String, RenderError> {
            sink.lock().unwrap().push(segment.to_string());
            Ok(format!("<{segment}>"))
        },
    );
    (renderer, seen)
}

fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
    String::from_utf8(renderer.into_inner()).unwrap()
}

#[tokio::test]
async fn heading_then_body_flushes_two_segments() {
    let (mut renderer, seen) = recording_renderer();
    let body = body_in_reads(&read_fixture("heading_and_body.sse"), 4096);

    run_pipeline(body, &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(renderer.state(), RenderState::Done);
    assert_eq!(*seen.lock().unwrap(), vec!["# Title", "Body text."]);
    assert_eq!(output(renderer), "\n<# Title>\n<Body text.>\n\n");
}

#[tokio::test]
async fn heading_then_body_in_plain_mode_is_verbatim() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let body = body_in_reads(&read_fixture("heading_and_body.sse"), 4096);

    run_pipeline(body, &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(output(renderer), "# Title\n\nBody text.\n\n\n");
}

#[tokio::test]
async fn malformed_frames_and_content_after_done_are_ignored() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let body = body_in_reads(&read_fixture("malformed_between.sse"), 4096);

    run_pipeline(body, &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(output(renderer), "first second\n");
}

#[tokio::test]
async fn plain_output_is_the_concatenation_for_any_read_size() {
    let answer = "Intro line.\n\n- one\n- two\n\n| a | b |\n| - | - |\n\n```sh\necho hi\n```\nTail ünïcödé ✓";
    let parts = split_chars(answer, 3);
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
    let raw = event_stream(&parts);

    for read_size in [1, 2, 7, 64, raw.len()] {
        let mut renderer = TerminalRenderer::plain(Vec::new());
        run_pipeline(
            body_in_reads(&raw, read_size),
            &mut renderer,
            &CancelSignal::new(),
        )
        .await
        .unwrap();
        assert_eq!(output(renderer), format!("{answer}\n"), "read size {read_size}");
    }
}

#[tokio::test]
async fn streamed_table_is_one_segment() {
    let (mut renderer, seen) = recording_renderer();
    let text = "| a | b |\n| - | - |\n| 1 | 2 |\n\nNext paragraph";
    let frames = split_chars(text, 1)
        .iter()
        .map(|piece| content_frame(piece))
        .collect();

    run_pipeline(body_of_frames(frames), &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["| a | b |\n| - | - |\n| 1 | 2 |", "Next paragraph"]
    );
}

#[tokio::test]
async fn code_fence_with_blank_line_is_never_split() {
    let (mut renderer, seen) = recording_renderer();
    let text = "Intro.\n\n```\na\n\nb\n```\n\nAfter.";
    let frames = split_chars(text, 3)
        .iter()
        .map(|piece| content_frame(piece))
        .collect();

    run_pipeline(body_of_frames(frames), &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["Intro.", "```\na\n\nb\n```", "After."]
    );
}

#[tokio::test]
async fn unterminated_fence_is_flushed_once_at_end() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let text = "```rust\nfn main() {}\n\nlet x = 1;\n";
    let frames = split_chars(text, 5)
        .iter()
        .map(|piece| content_frame(piece))
        .collect();

    run_pipeline(body_of_frames(frames), &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(renderer.segments_written(), 1);
    assert_eq!(output(renderer), format!("{text}\n"));
}

#[tokio::test]
async fn markdown_renderer_styles_a_streamed_answer() {
    let markdown = MarkdownRenderer::new(MarkdownTheme::notty());
    let mut renderer = TerminalRenderer::styled(Vec::new(), markdown);
    let raw = event_stream(&["# Title\n\n", "Some **bold** text.\n\n"]);

    run_pipeline(body_in_reads(&raw, 16), &mut renderer, &CancelSignal::new())
        .await
        .unwrap();

    let rendered = output(renderer);
    assert!(rendered.starts_with('\n'));
    assert!(rendered.contains("Title"));
    assert!(rendered.contains("bold"));
    assert!(!rendered.contains("**"));
}

#[tokio::test]
async fn cancellation_mid_stream_stops_output() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let body = body_of_frames(vec![content_frame("first\n\n"), content_frame("held")])
        .chain(stream::pending::<Result<Bytes, io::Error>>());
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = run_pipeline(body, &mut renderer, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StreamError::Cancelled(CancelReason::Interrupted)
    ));
    assert_eq!(renderer.state(), RenderState::Cancelled);
    assert_eq!(renderer.buffered(), "\nheld");
    assert_eq!(output(renderer), "first\n");
}

#[tokio::test]
async fn deadline_reports_deadline_exceeded() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let body = stream::pending::<Result<Bytes, io::Error>>();
    let cancel = CancelSignal::new();
    let _deadline = cancel.arm_deadline(Duration::from_millis(10));

    let err = run_pipeline(body, &mut renderer, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StreamError::Cancelled(CancelReason::DeadlineExceeded)
    ));
    assert_eq!(err.to_string(), "deadline exceeded");
}

#[tokio::test]
async fn read_failure_surfaces_the_cause() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let reads: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from(content_frame("partial answer"))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
    ];

    let err = run_pipeline(stream::iter(reads), &mut renderer, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Read(_)));
    assert_eq!(err.to_string(), "stream error: connection reset");
    assert_eq!(renderer.state(), RenderState::Failed);
    assert_eq!(renderer.buffered(), "partial answer");
}

#[tokio::test]
async fn overlong_line_fails_the_stream() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let cancel = CancelSignal::new();
    let (tx, rx) = handoff();
    let raw = format!("{}{}", content_frame("ok"), content_frame(&"x".repeat(64)));
    let decoder =
        StreamDecoder::new(body_in_reads(&raw, 8), tx, cancel.clone()).with_max_line_bytes(48);
    tokio::spawn(decoder.run());

    let err = renderer.consume(rx, &cancel).await.unwrap_err();

    assert!(matches!(err, StreamError::LineTooLong { limit: 48 }));
    assert_eq!(renderer.buffered(), "ok");
}

#[tokio::test]
async fn overlong_final_line_without_terminator_fails_the_stream() {
    let mut renderer = TerminalRenderer::plain(Vec::new());
    let cancel = CancelSignal::new();
    let (tx, rx) = handoff();
    let raw = format!("{}{}", content_frame("ok"), "x".repeat(49));
    let decoder =
        StreamDecoder::new(body_in_reads(&raw, 8), tx, cancel.clone()).with_max_line_bytes(48);
    tokio::spawn(decoder.run());

    let err = renderer.consume(rx, &cancel).await.unwrap_err();

    assert!(matches!(err, StreamError::LineTooLong { limit: 48 }));
    assert_eq!(renderer.state(), RenderState::Failed);
    assert_eq!(renderer.buffered(), "ok");
}

#[tokio::test]
async fn decoder_observes_cancellation_before_reading() {
    let cancel = CancelSignal::new();
    cancel.cancel();
    let (tx, mut rx) = handoff();
    let body = body_of_frames(vec![content_frame("never"), done_frame()]);
    let decoder = tokio::spawn(StreamDecoder::new(body, tx, cancel.clone()).run());

    match rx.recv().await {
        Some(Chunk::Error(StreamError::Cancelled(CancelReason::Interrupted))) => {}
        other => panic!("expected a cancellation chunk, got {other:?}"),
    }
    assert!(rx.recv().await.is_none());
    decoder.await.expect("decoder task");
}
