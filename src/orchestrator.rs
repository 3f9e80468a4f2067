//! Wires one response body to one renderer.

use std::io::Write;

use futures_util::Stream;

use crate::render::TerminalRenderer;
use crate::stream::{handoff, BoxError, CancelSignal, StreamDecoder, StreamError};

/// Decodes `body` on a background task and renders it on the current one.
///
/// Returns the renderer's result unchanged: success, or the first terminating error from either
/// side. The decoder task is not joined; once the renderer stops reading, the decoder's next
/// send fails and it exits, and its only shared state is the handoff queue.
pub async fn run_pipeline<S, B, E, W>(
    body: S,
    renderer: &mut TerminalRenderer<W>,
    cancel: &CancelSignal,
) -> Result<(), StreamError>
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
    W: Write,
{
    let (tx, rx) = handoff();
    let decoder = StreamDecoder::new(body, tx, cancel.clone());
    let _detached = tokio::spawn(decoder.run());
    renderer.consume(rx, cancel).await
}
