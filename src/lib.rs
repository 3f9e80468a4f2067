//! Streaming decode-and-render pipeline for chat-completion event streams.
//!
//! A response body flows through [`StreamDecoder`] (background task) into a zero-capacity
//! handoff queue, and from there into [`TerminalRenderer`], which accumulates text and asks
//! [`BlockAwareSegmenter`] where it is safe to flush without splitting a code fence, table,
//! list, blockquote or heading. [`run_pipeline`] wires the two together under a
//! [`CancelSignal`].
//!
//! # Public API Overview
//! - Run a body to completion with [`run_pipeline`].
//! - Pick plain or styled output via [`RenderMode`]; styled output uses any [`StyledRender`],
//!   normally [`MarkdownRenderer`] with a [`MarkdownTheme`].
//! - Decode single frames with [`decode_frame`].
//! - Use the text helpers for ANSI-safe width and wrapping.

pub mod config;
pub mod logging;

pub mod core;
pub mod orchestrator;
pub mod platform;
pub mod render;
pub mod stream;

pub use crate::orchestrator::run_pipeline;

/// Rendering types.
pub use crate::render::{
    BlockAwareSegmenter, BlockState, CodeHighlighter, MarkdownRenderer, MarkdownTheme, RenderError,
    RenderMode, RenderState, StyledRender, TerminalRenderer, ThemeName,
};

/// Stream and cancellation types.
pub use crate::stream::{
    decode_frame, handoff, BoxError, CancelReason, CancelSignal, Chunk, DecodeError, Frame,
    HandoffClosed, HandoffReceiver, HandoffSender, StreamDecoder, StreamError, MAX_LINE_BYTES,
};

/// Environment configuration.
pub use crate::config::EnvConfig;

/// ANSI-aware wrapping helper.
pub use crate::core::text::wrap::wrap_ansi;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
