//! Producer side of the pipeline: chunks, the handoff queue, cancellation and the decoder.

pub mod cancel;
pub mod chunk;
pub mod decoder;
pub mod handoff;

pub use cancel::{CancelReason, CancelSignal};
pub use chunk::{BoxError, Chunk, DecodeError, StreamError};
pub use decoder::{decode_frame, Frame, StreamDecoder, MAX_LINE_BYTES};
pub use handoff::{handoff, HandoffClosed, HandoffReceiver, HandoffSender};
