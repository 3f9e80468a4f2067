//! Platform-specific terminal integrations.

pub mod terminal;

pub use terminal::{stdin_is_tty, stdout_is_tty, terminal_columns};
