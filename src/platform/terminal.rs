//! Terminal probing for the standard streams.

#[cfg(unix)]
use libc::c_int;

pub const DEFAULT_COLUMNS: u16 = 80;

#[cfg(unix)]
fn is_tty(fd: c_int) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

#[cfg(unix)]
fn read_columns(fd: c_int) -> Option<u16> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 {
        Some(size.ws_col)
    } else {
        None
    }
}

#[cfg(unix)]
pub fn stdout_is_tty() -> bool {
    is_tty(libc::STDOUT_FILENO)
}

#[cfg(unix)]
pub fn stdin_is_tty() -> bool {
    is_tty(libc::STDIN_FILENO)
}

/// Width of the terminal attached to stdout, or [`DEFAULT_COLUMNS`] when there is none.
#[cfg(unix)]
pub fn terminal_columns() -> u16 {
    read_columns(libc::STDOUT_FILENO).unwrap_or(DEFAULT_COLUMNS)
}

#[cfg(not(unix))]
pub fn stdout_is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

#[cfg(not(unix))]
pub fn stdin_is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}

#[cfg(not(unix))]
pub fn terminal_columns() -> u16 {
    DEFAULT_COLUMNS
}

#[cfg(test)]
mod tests {
    use super::terminal_columns;

    #[test]
    fn columns_are_never_zero() {
        assert!(terminal_columns() > 0);
    }
}
