//! ANSI-aware word wrapping.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_len, SgrState};
use super::width::{grapheme_width, visible_width};

enum Token<'a> {
    Space(&'a str),
    Word(&'a str),
}

/// Splits into alternating runs of spaces and non-spaces; escape sequences belong to whichever
/// run they sit in so styled words are never split at a style change.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    let mut idx = 0;
    while idx < line.len() {
        if let Some(len) = escape_len(line, idx) {
            idx += len;
            continue;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        match in_space {
            Some(previous) if previous != is_space => {
                let run = &line[start..idx];
                tokens.push(if previous { Token::Space(run) } else { Token::Word(run) });
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
        idx += ch.len_utf8();
    }
    if start < line.len() {
        let run = &line[start..];
        tokens.push(if in_space == Some(true) {
            Token::Space(run)
        } else {
            Token::Word(run)
        });
    }
    tokens
}

struct LineBuilder<'a> {
    width: usize,
    state: &'a mut SgrState,
    out: &'a mut Vec<String>,
    current: String,
    current_width: usize,
    continuation: bool,
}

impl LineBuilder<'_> {
    fn break_line(&mut self) {
        let mut line = self.current.trim_end().to_string();
        line.push_str(self.state.close());
        self.out.push(line);
        self.current = self.state.reopen();
        self.current_width = 0;
        self.continuation = true;
    }

    fn push_space(&mut self, space: &str) {
        let width = visible_width(space);
        if self.continuation && self.current_width == 0 {
            self.state.observe_text(space);
            return;
        }
        if self.current_width + width > self.width {
            self.state.observe_text(space);
            self.break_line();
            return;
        }
        self.current.push_str(space);
        self.current_width += width;
    }

    fn push_word(&mut self, word: &str) {
        let width = visible_width(word);
        if self.current_width > 0 && self.current_width + width > self.width {
            self.break_line();
        }
        if width <= self.width {
            self.current.push_str(word);
            self.state.observe_text(word);
            self.current_width += width;
            return;
        }
        self.push_long_word(word);
    }

    fn push_long_word(&mut self, word: &str) {
        let mut idx = 0;
        while idx < word.len() {
            if let Some(len) = escape_len(word, idx) {
                let code = &word[idx..idx + len];
                self.current.push_str(code);
                self.state.observe(code);
                idx += len;
                continue;
            }
            let run_end = match word[idx + 1..].find('\x1b') {
                Some(offset) => idx + 1 + offset,
                None => word.len(),
            };
            for grapheme in word[idx..run_end].graphemes(true) {
                let width = grapheme_width(grapheme);
                if self.current_width > 0 && self.current_width + width > self.width {
                    self.break_line();
                }
                self.current.push_str(grapheme);
                self.current_width += width;
            }
            idx = run_end;
        }
    }

    fn finish(self) {
        let line = self.current.trim_end().to_string();
        self.out.push(line);
    }
}

/// Wraps `text` to `width` columns. Input newlines are preserved; styles that are open at a
/// break are closed and reopened on the following line.
pub fn wrap_ansi(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut state = SgrState::default();
    let mut out = Vec::new();

    for line in text.split('\n') {
        let mut builder = LineBuilder {
            width,
            current: state.reopen(),
            state: &mut state,
            out: &mut out,
            current_width: 0,
            continuation: false,
        };
        for token in tokenize(line) {
            match token {
                Token::Space(space) => builder.push_space(space),
                Token::Word(word) => builder.push_word(word),
            }
        }
        builder.finish();
    }

    out
}
