//! ANSI escape scanning and SGR carry-over for wrapped output.

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

/// Byte length of the escape sequence starting at `pos`, if there is one.
///
/// Recognizes CSI (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`) sequences, which is all the
/// styled renderer and syntax highlighter ever emit.
pub fn escape_len(input: &str, pos: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&ESC) {
        return None;
    }
    match bytes.get(pos + 1)? {
        b'[' => bytes[pos + 2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map(|offset| offset + 3),
        b']' => {
            let body = &bytes[pos + 2..];
            let mut idx = 0;
            while idx < body.len() {
                if body[idx] == BEL {
                    return Some(idx + 3);
                }
                if body[idx] == ESC && body.get(idx + 1) == Some(&b'\\') {
                    return Some(idx + 4);
                }
                idx += 1;
            }
            None
        }
        _ => None,
    }
}

/// Removes every recognized escape sequence.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = escape_len(input, idx) {
            idx += len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

fn is_sgr(code: &str) -> bool {
    code.starts_with("\x1b[") && code.ends_with('m')
}

fn is_reset(code: &str) -> bool {
    code == "\x1b[0m" || code == "\x1b[m"
}

/// Tracks SGR sequences that are still in effect so a wrapped continuation line can reopen them.
#[derive(Debug, Default, Clone)]
pub struct SgrState {
    active: Vec<String>,
}

impl SgrState {
    pub fn observe(&mut self, code: &str) {
        if !is_sgr(code) {
            return;
        }
        if is_reset(code) {
            self.active.clear();
        } else {
            self.active.push(code.to_string());
        }
    }

    /// Feeds every SGR sequence found in `text`.
    pub fn observe_text(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(len) = escape_len(text, idx) {
                self.observe(&text[idx..idx + len]);
                idx += len;
                continue;
            }
            idx += text[idx..].chars().next().map_or(1, char::len_utf8);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Sequence that re-establishes the current style at the start of a line.
    pub fn reopen(&self) -> String {
        self.active.concat()
    }

    /// Sequence that closes the current style at the end of a line.
    pub fn close(&self) -> &'static str {
        if self.active.is_empty() {
            ""
        } else {
            "\x1b[0m"
        }
    }
}
