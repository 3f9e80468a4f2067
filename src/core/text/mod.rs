//! Text helpers (ANSI scanning, width calculation, wrapping).
//!
//! These helpers are pure (string in/string out) so the markdown renderer and the table layout
//! can share them without touching the terminal.

pub mod ansi;
pub mod width;
pub mod wrap;
