//! Pipeline units and the errors that end a stream.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

use super::cancel::CancelReason;
use crate::render::RenderError;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// What the decoder hands to the renderer: a content fragment or the error that ended the stream.
#[derive(Debug)]
pub enum Chunk {
    Content(String),
    Error(StreamError),
}

impl Chunk {
    pub fn is_error(&self) -> bool {
        matches!(self, Chunk::Error(_))
    }
}

/// Terminating errors of the decode-and-render pipeline.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream error: {0}")]
    Read(#[source] BoxError),
    #[error("stream error: line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("{0}")]
    Cancelled(CancelReason),
    #[error("failed to render markdown: {0}")]
    Render(#[from] RenderError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl StreamError {
    pub fn read(err: impl Into<BoxError>) -> Self {
        Self::Read(err.into())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, StreamError::Cancelled(_))
    }
}

/// A single frame that could not be decoded. Never terminates the stream.
#[derive(Debug, Error)]
#[error("malformed frame: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}
