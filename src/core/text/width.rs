//! Terminal column widths.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::escape_len;

const TAB_WIDTH: usize = 3;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if emojis::get(grapheme).is_some() {
        return 2;
    }
    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Columns `input` occupies once escape sequences are interpreted by the terminal.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut run_start = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = escape_len(input, idx) {
            width += run_width(&input[run_start..idx]);
            idx += len;
            run_start = idx;
            continue;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    width + run_width(&input[run_start..])
}

fn run_width(run: &str) -> usize {
    run.graphemes(true).map(grapheme_width).sum()
}
