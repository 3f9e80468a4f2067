//! Consumer task of the pipeline: owns the accumulation buffer and writes segments out.

use std::fmt;
use std::io::Write;

use super::segmenter::{BlockAwareSegmenter, BlockState};
use super::StyledRender;
use crate::stream::{CancelSignal, Chunk, HandoffReceiver, StreamError};

pub enum RenderMode {
    /// Segments are written byte for byte.
    Plain,
    /// Segments are trimmed and formatted by the wrapped renderer.
    Styled(Box<dyn StyledRender + Send>),
}

impl fmt::Debug for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Plain => f.write_str("Plain"),
            RenderMode::Styled(_) => f.write_str("Styled(..)"),
        }
    }
}

/// Where the consumption loop is. `Done`, `Cancelled` and `Failed` are terminal and exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Waiting,
    Processing,
    Draining,
    Cancelled,
    Failed,
    Done,
}

pub struct TerminalRenderer<W: Write> {
    out: W,
    mode: RenderMode,
    segmenter: BlockAwareSegmenter,
    buffer: String,
    /// Block the buffered text ends inside, as of the last push.
    open_block: BlockState,
    state: RenderState,
    segments: usize,
}

impl<W: Write> fmt::Debug for TerminalRenderer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalRenderer")
            .field("mode", &self.mode)
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out,
            mode,
            segmenter: BlockAwareSegmenter::new(),
            buffer: String::new(),
            open_block: BlockState::None,
            state: RenderState::Waiting,
            segments: 0,
        }
    }

    pub fn plain(out: W) -> Self {
        Self::new(out, RenderMode::Plain)
    }

    pub fn styled(out: W, renderer: impl StyledRender + Send + 'static) -> Self {
        Self::new(out, RenderMode::Styled(Box::new(renderer)))
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Text received but not yet flushed.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of segments written so far, including the final flush.
    pub fn segments_written(&self) -> usize {
        self.segments
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Runs the consumption loop until the queue closes, an error chunk arrives, or `cancel`
    /// fires. Cancellation is checked first on every iteration so nothing is written after it
    /// is observed.
    pub async fn consume(
        &mut self,
        mut rx: HandoffReceiver,
        cancel: &CancelSignal,
    ) -> Result<(), StreamError> {
        loop {
            self.state = RenderState::Waiting;
            let next = tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    self.state = RenderState::Cancelled;
                    return Err(StreamError::Cancelled(reason));
                }
                next = rx.recv() => next,
            };

            match next {
                Some(Chunk::Content(text)) => {
                    self.state = RenderState::Processing;
                    if let Err(err) = self.push(&text) {
                        self.state = RenderState::Failed;
                        return Err(err);
                    }
                }
                Some(Chunk::Error(err)) => {
                    self.state = if err.is_cancellation() {
                        RenderState::Cancelled
                    } else {
                        RenderState::Failed
                    };
                    return Err(err);
                }
                None => {
                    self.state = RenderState::Draining;
                    let result = self.finish();
                    self.state = if result.is_ok() {
                        RenderState::Done
                    } else {
                        RenderState::Failed
                    };
                    return result;
                }
            }
        }
    }

    /// Appends `text` and flushes the longest block-safe prefix, if any.
    pub fn push(&mut self, text: &str) -> Result<(), StreamError> {
        self.buffer.push_str(text);
        let scan = self.segmenter.scan(&self.buffer);
        self.open_block = scan.state;
        let Some(boundary) = scan.boundary else {
            return Ok(());
        };
        let segment: String = self.buffer.drain(..boundary).collect();
        self.render_segment(&segment)
    }

    /// Flushes whatever is buffered regardless of open blocks, then ends the output with a
    /// line break.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        if !self.buffer.is_empty() {
            if self.open_block != BlockState::None {
                tracing::debug!(
                    state = ?self.open_block,
                    "flushing remainder inside an open block"
                );
            }
            let remainder = std::mem::take(&mut self.buffer);
            self.render_segment(&remainder)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn render_segment(&mut self, segment: &str) -> Result<(), StreamError> {
        match &self.mode {
            RenderMode::Plain => {
                self.out.write_all(segment.as_bytes())?;
            }
            RenderMode::Styled(renderer) => {
                let trimmed = segment.trim();
                if trimmed.is_empty() {
                    return Ok(());
                }
                if trimmed.starts_with('#') {
                    writeln!(self.out)?;
                }
                let rendered = renderer.render(trimmed)?;
                writeln!(self.out, "{}", rendered.trim())?;
            }
        }
        self.out.flush()?;
        self.segments += 1;
        tracing::trace!(bytes = segment.len(), segments = self.segments, "segment flushed");
        Ok(())
    }
}
