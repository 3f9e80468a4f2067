//! Event-stream decoding: raw body bytes in, content chunks out.

use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use super::cancel::CancelSignal;
use super::chunk::{BoxError, Chunk, DecodeError, StreamError};
use super::handoff::{HandoffClosed, HandoffSender};

/// Longest accepted line, excluding its terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Blank line, or a frame carrying no content.
    Skip,
    /// The `[DONE]` sentinel.
    Done,
    Content(String),
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Message>,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

fn message_content(message: Option<Message>) -> String {
    message.and_then(|m| m.content).unwrap_or_default()
}

/// Decodes one line of the event stream.
///
/// The `data: ` prefix is optional so a non-streamed JSON body decodes the same way. Only the
/// first choice is read; its delta content wins over its message content unless empty.
pub fn decode_frame(line: &str) -> Result<Frame, DecodeError> {
    if line.is_empty() {
        return Ok(Frame::Skip);
    }
    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line);
    if payload == DONE_SENTINEL {
        return Ok(Frame::Done);
    }

    let response: ChatResponse = serde_json::from_str(payload)?;
    let Some(choice) = response.choices.into_iter().next() else {
        return Ok(Frame::Skip);
    };
    let mut content = message_content(choice.delta);
    if content.is_empty() {
        content = message_content(choice.message);
    }

    if content.is_empty() {
        Ok(Frame::Skip)
    } else {
        Ok(Frame::Content(content))
    }
}

/// Splits arbitrary byte fragments into lines, enforcing the line bound.
#[derive(Debug)]
struct LineFramer {
    pending: Vec<u8>,
    scanned: usize,
    max_line: usize,
}

impl LineFramer {
    fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line,
        }
    }

    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, StreamError> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.pending[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            lines.push(self.take_line(start, end)?);
            start = end + 1;
            self.scanned = start;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();
        // One extra byte for a `\r` whose `\n` has not arrived yet.
        if self.pending.len() > self.max_line + 1 {
            return Err(StreamError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(lines)
    }

    fn take_line(&self, start: usize, end: usize) -> Result<String, StreamError> {
        let mut line = &self.pending[start..end];
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        if line.len() > self.max_line {
            return Err(StreamError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(String::from_utf8_lossy(line).into_owned())
    }

    /// Unterminated trailing line, if any. It is held to the same bound as any other line.
    fn finish(&mut self) -> Result<Option<String>, StreamError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let end = self.pending.len();
        let line = self.take_line(0, end);
        self.pending.clear();
        self.scanned = 0;
        line.map(Some)
    }
}

enum Halt {
    Done,
    ReceiverGone,
    Fatal(StreamError),
}

impl From<HandoffClosed> for Halt {
    fn from(_: HandoffClosed) -> Self {
        Halt::ReceiverGone
    }
}

/// Producer task of the pipeline. Owns the sending half of the handoff queue; running it to
/// completion always drops that half, which closes the queue exactly once.
pub struct StreamDecoder<S> {
    body: S,
    tx: HandoffSender,
    cancel: CancelSignal,
    max_line: usize,
}

impl<S, B, E> StreamDecoder<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<BoxError>,
{
    pub fn new(body: S, tx: HandoffSender, cancel: CancelSignal) -> Self {
        Self {
            body,
            tx,
            cancel,
            max_line: MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    pub async fn run(mut self) {
        let mut framer = LineFramer::new(self.max_line);
        match self.pump(&mut framer).await {
            Ok(()) | Err(Halt::Done) => tracing::trace!("event stream finished"),
            Err(Halt::ReceiverGone) => tracing::debug!("renderer stopped; decoder exiting"),
            Err(Halt::Fatal(err)) => {
                tracing::debug!(error = %err, "event stream failed");
                // The renderer may already be gone; either way the queue closes on return.
                let _ = self.tx.send(Chunk::Error(err)).await;
            }
        }
    }

    async fn pump(&mut self, framer: &mut LineFramer) -> Result<(), Halt> {
        loop {
            if let Some(reason) = self.cancel.reason() {
                return Err(Halt::Fatal(StreamError::Cancelled(reason)));
            }

            match self.body.next().await {
                None => {
                    if let Some(line) = framer.finish().map_err(Halt::Fatal)? {
                        emit(&self.tx, &self.cancel, &line).await?;
                    }
                    return Ok(());
                }
                Some(Err(err)) => return Err(Halt::Fatal(StreamError::read(err))),
                Some(Ok(bytes)) => {
                    let lines = framer.push(bytes.as_ref()).map_err(Halt::Fatal)?;
                    for line in lines {
                        emit(&self.tx, &self.cancel, &line).await?;
                    }
                }
            }
        }
    }
}

// Takes fields, not `&StreamDecoder`: the body need not be `Sync`.
async fn emit(tx: &HandoffSender, cancel: &CancelSignal, line: &str) -> Result<(), Halt> {
    match decode_frame(line) {
        Ok(Frame::Content(content)) => {
            if let Some(reason) = cancel.reason() {
                return Err(Halt::Fatal(StreamError::Cancelled(reason)));
            }
            tx.send(Chunk::Content(content)).await?;
            Ok(())
        }
        Ok(Frame::Done) => Err(Halt::Done),
        Ok(Frame::Skip) => Ok(()),
        Err(err) => {
            tracing::debug!(error = %err, "skipping malformed frame");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, Frame, LineFramer};
    use crate::stream::StreamError;

    #[test]
    fn delta_content_is_extracted() {
        let frame = decode_frame(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(frame, Frame::Content("hi".to_string()));
    }

    #[test]
    fn message_content_used_when_delta_empty() {
        let line = r#"data: {"choices":[{"delta":{"content":""},"message":{"content":"full"}}]}"#;
        assert_eq!(
            decode_frame(line).unwrap(),
            Frame::Content("full".to_string())
        );
    }

    #[test]
    fn delta_wins_over_message() {
        let line = r#"data: {"choices":[{"delta":{"content":"d"},"message":{"content":"m"}}]}"#;
        assert_eq!(decode_frame(line).unwrap(), Frame::Content("d".to_string()));
    }

    #[test]
    fn only_first_choice_is_read() {
        let line = r#"data: {"choices":[{"delta":{}},{"delta":{"content":"second"}}]}"#;
        assert_eq!(decode_frame(line).unwrap(), Frame::Skip);
    }

    #[test]
    fn null_content_and_missing_choices_skip() {
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{"role":"assistant","content":null}}]}"#)
                .unwrap(),
            Frame::Skip
        );
        assert_eq!(decode_frame(r#"data: {"choices":[]}"#).unwrap(), Frame::Skip);
        assert_eq!(decode_frame(r#"data: {}"#).unwrap(), Frame::Skip);
    }

    #[test]
    fn blank_and_done_lines_are_not_parsed() {
        assert_eq!(decode_frame("").unwrap(), Frame::Skip);
        assert_eq!(decode_frame("data: [DONE]").unwrap(), Frame::Done);
    }

    #[test]
    fn bare_json_body_decodes() {
        let line = r#"{"choices":[{"message":{"content":"non-streamed"}}]}"#;
        assert_eq!(
            decode_frame(line).unwrap(),
            Frame::Content("non-streamed".to_string())
        );
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(decode_frame("data: {not json").is_err());
        assert!(decode_frame(": keep-alive").is_err());
    }

    #[test]
    fn framer_reassembles_split_lines() {
        let mut framer = LineFramer::new(64);
        assert!(framer.push(b"data: ab").unwrap().is_empty());
        assert_eq!(framer.push(b"c\r\nda").unwrap(), vec!["data: abc"]);
        assert_eq!(framer.push(b"ta: x\n\n").unwrap(), vec!["data: x", ""]);
        assert_eq!(framer.finish().unwrap(), None);
    }

    #[test]
    fn framer_keeps_multibyte_characters_split_across_reads() {
        let mut framer = LineFramer::new(64);
        let bytes = "é\n".as_bytes();
        assert!(framer.push(&bytes[..1]).unwrap().is_empty());
        assert_eq!(framer.push(&bytes[1..]).unwrap(), vec!["é"]);
    }

    #[test]
    fn framer_returns_unterminated_tail() {
        let mut framer = LineFramer::new(64);
        assert!(framer.push(b"data: tail").unwrap().is_empty());
        assert_eq!(framer.finish().unwrap(), Some("data: tail".to_string()));
    }

    #[test]
    fn framer_rejects_overlong_lines() {
        let mut framer = LineFramer::new(4);
        assert!(matches!(
            framer.push(b"12345\n"),
            Err(StreamError::LineTooLong { limit: 4 })
        ));

        let mut framer = LineFramer::new(4);
        assert!(matches!(
            framer.push(b"123456"),
            Err(StreamError::LineTooLong { limit: 4 })
        ));

        let mut framer = LineFramer::new(4);
        assert_eq!(framer.push(b"1234\r\n").unwrap(), vec!["1234"]);
    }

    #[test]
    fn framer_rejects_overlong_unterminated_tail() {
        let mut framer = LineFramer::new(4);
        assert!(framer.push(b"12345").unwrap().is_empty());
        assert!(matches!(
            framer.finish(),
            Err(StreamError::LineTooLong { limit: 4 })
        ));

        let mut framer = LineFramer::new(4);
        assert!(framer.push(b"1234\r").unwrap().is_empty());
        assert_eq!(framer.finish().unwrap(), Some("1234".to_string()));
    }
}
