#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures_util::stream::{self, Iter};

pub type Body = Iter<std::vec::IntoIter<Result<Bytes, io::Error>>>;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read fixture {name}: {err}"))
}

/// One `data:` frame carrying `content` as a streamed delta, newline terminated.
pub fn content_frame(content: &str) -> String {
    let payload = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
    format!("data: {payload}\n")
}

pub fn done_frame() -> String {
    "data: [DONE]\n".to_string()
}

/// Event-stream text for `parts`, closed with `[DONE]`.
pub fn event_stream(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        out.push_str(&content_frame(part));
        out.push('\n');
    }
    out.push_str(&done_frame());
    out
}

/// Body that yields `raw` in network reads of at most `read_size` bytes.
pub fn body_in_reads(raw: &str, read_size: usize) -> Body {
    let reads = raw
        .as_bytes()
        .chunks(read_size.max(1))
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect::<Vec<_>>();
    stream::iter(reads)
}

/// Body that yields each frame as one read.
pub fn body_of_frames(frames: Vec<String>) -> Body {
    stream::iter(frames.into_iter().map(|frame| Ok(Bytes::from(frame))).collect::<Vec<_>>())
}

/// Splits `text` into pieces of at most `size` characters.
pub fn split_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}
