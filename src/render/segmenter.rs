//! Block-aware flush boundaries for a growing markdown buffer.
//!
//! Line-prefix heuristic, not a grammar: block state is flat and is re-derived from the whole
//! buffer on every call, so partial input never leaves stale state behind.

/// Block construct the scan is currently inside. Only one is tracked at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    None,
    CodeBlock,
    Table,
    List,
    Blockquote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Fence,
    TableRow,
    Quote,
    ListItem,
    Blank,
    Heading,
    Text,
}

const FENCE: &str = "```";

fn is_list_marker(trimmed: &str) -> bool {
    if ["- ", "* ", "+ "]
        .iter()
        .any(|marker| trimmed.starts_with(marker))
    {
        return true;
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && trimmed[digits..].starts_with(". ")
}

/// Classification order decides ties between constructs: table, then quote, then list.
fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.starts_with(FENCE) {
        LineKind::Fence
    } else if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with('|') {
        LineKind::TableRow
    } else if trimmed.starts_with('>') {
        LineKind::Quote
    } else if is_list_marker(trimmed) {
        LineKind::ListItem
    } else if trimmed.starts_with('#') {
        LineKind::Heading
    } else {
        LineKind::Text
    }
}

/// Splits on `\n`. A blank tail after the last newline is a line still being received, so it
/// is dropped rather than treated as a blank line.
fn complete_lines(buffer: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = buffer.split('\n').collect();
    if lines.len() > 1 && lines.last().is_some_and(|tail| tail.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Result of one pass over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Largest safe prefix length, if any.
    pub boundary: Option<usize>,
    /// Block the end of the buffer is inside.
    pub state: BlockState,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BlockAwareSegmenter;

impl BlockAwareSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Largest prefix length of `buffer` that can be rendered without cutting through a code
    /// fence, table, list or blockquote. `None` when there is no non-empty safe prefix yet.
    pub fn find_boundary(&self, buffer: &str) -> Option<usize> {
        self.scan(buffer).boundary
    }

    /// Scans `buffer` from the start, tracking block state line by line.
    ///
    /// Boundary candidates are: the start of a blank line that closes an open block; the start
    /// of a blank line outside any block that is followed by text or ends the buffer (never on
    /// the first line); the start of a heading outside any block (never at offset zero). The
    /// last candidate wins.
    pub fn scan(&self, buffer: &str) -> Scan {
        let lines = complete_lines(buffer);
        let mut state = BlockState::None;
        let mut boundary = None;
        let mut position = 0;

        for (idx, line) in lines.iter().enumerate() {
            let kind = classify(line);

            if kind == LineKind::Fence {
                state = if state == BlockState::CodeBlock {
                    BlockState::None
                } else {
                    BlockState::CodeBlock
                };
            } else if state != BlockState::CodeBlock {
                match kind {
                    LineKind::TableRow => state = BlockState::Table,
                    LineKind::Quote => state = BlockState::Blockquote,
                    LineKind::ListItem => state = BlockState::List,
                    LineKind::Blank if state != BlockState::None => {
                        state = BlockState::None;
                        boundary = Some(position);
                    }
                    LineKind::Blank => {
                        let ends_buffer = idx + 1 == lines.len();
                        let next_has_text = lines
                            .get(idx + 1)
                            .is_some_and(|next| !next.trim().is_empty());
                        if idx > 0 && (ends_buffer || next_has_text) {
                            boundary = Some(position);
                        }
                    }
                    LineKind::Heading if state == BlockState::None && position > 0 => {
                        boundary = Some(position);
                    }
                    _ => {}
                }
            }

            position += line.len() + 1;
        }

        Scan {
            boundary: boundary.filter(|offset| *offset > 0),
            state,
        }
    }
}
