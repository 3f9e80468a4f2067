//! Markdown to styled terminal text.

use markdown::mdast::{self, AlignKind};
use markdown::{to_mdast, ParseOptions};

use super::theme::MarkdownTheme;
use super::{RenderError, StyledRender};
use crate::core::text::width::visible_width;
use crate::core::text::wrap::wrap_ansi;

const MAX_RULE_WIDTH: usize = 80;

#[derive(Clone, Copy, PartialEq, Eq)]
enum InlineStyle {
    Default,
    Quote,
}

/// Renders a complete markdown document (one flushed segment) into terminal lines.
///
/// Stateless between calls; the same renderer serves every segment of a response.
#[derive(Debug)]
pub struct MarkdownRenderer {
    theme: MarkdownTheme,
    wrap_width: Option<usize>,
}

impl MarkdownRenderer {
    pub fn new(theme: MarkdownTheme) -> Self {
        Self {
            theme,
            wrap_width: None,
        }
    }

    /// Wrap rendered lines at `width` columns. `None` leaves lines unwrapped.
    pub fn with_wrap_width(mut self, width: Option<usize>) -> Self {
        self.wrap_width = width.filter(|width| *width > 0);
        self
    }

    pub fn wrap_width(&self) -> Option<usize> {
        self.wrap_width
    }

    pub fn render_markdown(&self, text: &str) -> Result<String, RenderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let normalized = text.replace('\t', "   ");
        let root = to_mdast(&normalized, &ParseOptions::gfm()).map_err(|err| {
            RenderError::Parse {
                message: err.to_string(),
            }
        })?;
        let nodes = match root {
            mdast::Node::Root(root) => root.children,
            other => vec![other],
        };

        let width = self.wrap_width.unwrap_or(usize::MAX);
        let mut lines: Vec<String> = Vec::new();
        let mut previous: Option<&mdast::Node> = None;
        for node in &nodes {
            let block = self.render_block(node, width, &normalized);
            if block.is_empty() {
                continue;
            }
            if let Some(previous) = previous {
                if !is_tight_pair(previous, node, &normalized) {
                    lines.push(String::new());
                }
            }
            lines.extend(block);
            previous = Some(node);
        }

        let lines = match self.wrap_width {
            Some(width) => lines
                .iter()
                .flat_map(|line| wrap_ansi(line, width))
                .collect(),
            None => lines,
        };
        Ok(lines.join("\n"))
    }

    fn style_text(&self, text: &str, style: InlineStyle) -> String {
        match style {
            InlineStyle::Default => text.to_string(),
            InlineStyle::Quote => text
                .split('\n')
                .map(|part| (self.theme.quote)(part))
                .collect::<Vec<String>>()
                .join("\n"),
        }
    }

    fn render_inline(&self, nodes: &[mdast::Node], style: InlineStyle) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                mdast::Node::Text(text) => out.push_str(&self.style_text(&text.value, style)),
                mdast::Node::Paragraph(paragraph) => {
                    out.push_str(&self.render_inline(&paragraph.children, style));
                }
                mdast::Node::Strong(strong) => {
                    let inner = self.render_inline(&strong.children, style);
                    out.push_str(&(self.theme.bold)(&inner));
                }
                mdast::Node::Emphasis(emphasis) => {
                    let inner = self.render_inline(&emphasis.children, style);
                    out.push_str(&(self.theme.italic)(&inner));
                }
                mdast::Node::Delete(delete) => {
                    let inner = self.render_inline(&delete.children, style);
                    out.push_str(&(self.theme.strikethrough)(&inner));
                }
                mdast::Node::InlineCode(code) => out.push_str(&(self.theme.code)(&code.value)),
                mdast::Node::Link(link) => {
                    let label = self.render_inline(&link.children, style);
                    out.push_str(&(self.theme.link)(&(self.theme.underline)(&label)));
                    let plain = plain_text(&link.children);
                    let url = link.url.as_str();
                    if plain != url && plain != url.trim_start_matches("mailto:") {
                        out.push_str(&(self.theme.link_url)(&format!(" ({url})")));
                    }
                }
                mdast::Node::Image(image) => {
                    let alt = if image.alt.is_empty() {
                        &image.url
                    } else {
                        &image.alt
                    };
                    out.push_str(&self.style_text(alt, style));
                }
                mdast::Node::Break(_) => out.push('\n'),
                mdast::Node::Html(html) => out.push_str(&self.style_text(&html.value, style)),
                mdast::Node::InlineMath(math) => out.push_str(&(self.theme.code)(&math.value)),
                _ => {}
            }
        }
        out
    }

    fn render_block(&self, node: &mdast::Node, width: usize, source: &str) -> Vec<String> {
        match node {
            mdast::Node::Heading(heading) => {
                let text = self.render_inline(&heading.children, InlineStyle::Default);
                let styled = match heading.depth {
                    1 => (self.theme.heading)(&(self.theme.bold)(&(self.theme.underline)(&text))),
                    2 => (self.theme.heading)(&(self.theme.bold)(&text)),
                    depth => {
                        let marker = "#".repeat(usize::from(depth));
                        (self.theme.heading)(&(self.theme.bold)(&format!("{marker} {text}")))
                    }
                };
                vec![styled]
            }
            mdast::Node::Paragraph(paragraph) => split_lines(
                &self.render_inline(&paragraph.children, InlineStyle::Default),
            ),
            mdast::Node::Code(code) => self.render_code(&code.value, code.lang.as_deref()),
            mdast::Node::Math(math) => self.render_code(&math.value, Some("latex")),
            mdast::Node::List(list) => self.render_list(list, 0, width, source),
            mdast::Node::Blockquote(quote) => self.render_blockquote(quote, width, source),
            mdast::Node::ThematicBreak(_) => {
                vec![(self.theme.hr)(&"─".repeat(width.min(MAX_RULE_WIDTH)))]
            }
            mdast::Node::Table(table) => self.render_table(table, width, source),
            mdast::Node::Html(html) => split_lines(html.value.trim()),
            mdast::Node::Text(text) => split_lines(&text.value),
            _ => Vec::new(),
        }
    }

    fn render_code(&self, code: &str, lang: Option<&str>) -> Vec<String> {
        let indent = self.theme.code_block_indent.as_str();
        let mut lines = vec![(self.theme.code_block_border)(&format!(
            "```{}",
            lang.unwrap_or_default()
        ))];
        match self.theme.highlight_code.as_ref() {
            Some(highlight) => {
                for line in highlight(code, lang) {
                    lines.push(format!("{indent}{line}"));
                }
            }
            None => {
                for line in code.split('\n') {
                    lines.push(format!("{indent}{}", (self.theme.code_block)(line)));
                }
            }
        }
        lines.push((self.theme.code_block_border)("```"));
        lines
    }

    fn render_list(
        &self,
        list: &mdast::List,
        depth: usize,
        width: usize,
        source: &str,
    ) -> Vec<String> {
        let indent = "  ".repeat(depth);
        let start = list.start.unwrap_or(1);
        let mut lines = Vec::new();

        for (idx, node) in list.children.iter().enumerate() {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };
            let mut bullet = if list.ordered {
                format!("{}. ", start.saturating_add(idx as u32))
            } else {
                "- ".to_string()
            };
            match item.checked {
                Some(true) => bullet.push_str("[x] "),
                Some(false) => bullet.push_str("[ ] "),
                None => {}
            }
            let hanging = " ".repeat(bullet.chars().count());

            let mut bullet_written = false;
            for child in &item.children {
                let child_lines = match child {
                    mdast::Node::List(nested) => {
                        lines.extend(self.render_list(nested, depth + 1, width, source));
                        continue;
                    }
                    mdast::Node::Paragraph(paragraph) => split_lines(
                        &self.render_inline(&paragraph.children, InlineStyle::Default),
                    ),
                    other => self.render_block(other, width, source),
                };
                for line in child_lines {
                    if bullet_written {
                        lines.push(format!("{indent}{hanging}{line}"));
                    } else {
                        lines.push(format!("{indent}{}{line}", (self.theme.list_bullet)(&bullet)));
                        bullet_written = true;
                    }
                }
            }
            if !bullet_written {
                lines.push(format!(
                    "{indent}{}",
                    (self.theme.list_bullet)(bullet.trim_end())
                ));
            }
        }

        lines
    }

    fn render_blockquote(
        &self,
        quote: &mdast::Blockquote,
        width: usize,
        source: &str,
    ) -> Vec<String> {
        let inner_width = width.saturating_sub(2).max(1);
        let mut body = Vec::new();
        for (idx, child) in quote.children.iter().enumerate() {
            if idx > 0 {
                body.push(String::new());
            }
            match child {
                mdast::Node::Paragraph(paragraph) => body.extend(split_lines(
                    &self.render_inline(&paragraph.children, InlineStyle::Quote),
                )),
                other => body.extend(self.render_block(other, inner_width, source)),
            }
        }

        let border = (self.theme.quote_border)("│ ");
        let mut lines = Vec::new();
        for line in body {
            let wrapped = match self.wrap_width {
                Some(_) => wrap_ansi(&line, inner_width),
                None => vec![line],
            };
            for wrapped_line in wrapped {
                lines.push(format!("{border}{wrapped_line}"));
            }
        }
        lines
    }

    fn render_table(&self, table: &mdast::Table, width: usize, source: &str) -> Vec<String> {
        let rows: Vec<Vec<String>> = table
            .children
            .iter()
            .filter_map(|node| match node {
                mdast::Node::TableRow(row) => Some(
                    row.children
                        .iter()
                        .map(|cell| match cell {
                            mdast::Node::TableCell(cell) => {
                                self.render_inline(&cell.children, InlineStyle::Default)
                            }
                            other => self.render_inline(
                                std::slice::from_ref(other),
                                InlineStyle::Default,
                            ),
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Vec::new();
        }

        let border_overhead = 3 * columns + 1;
        let available = width.saturating_sub(border_overhead);
        if available < columns {
            let raw = table
                .position
                .as_ref()
                .and_then(|pos| source.get(pos.start.offset..pos.end.offset))
                .unwrap_or_default();
            return split_lines(raw);
        }

        let mut natural = vec![1usize; columns];
        for row in &rows {
            for (idx, cell) in row.iter().enumerate() {
                natural[idx] = natural[idx].max(visible_width(cell));
            }
        }
        let widths = fit_columns(&natural, available);

        let border = |left: &str, fill: &str, join: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|width| fill.repeat(*width)).collect();
            (self.theme.table_border)(&format!(
                "{left}{fill}{}{fill}{right}",
                cells.join(&format!("{fill}{join}{fill}"))
            ))
        };
        let separator = (self.theme.table_border)("│");

        let mut lines = vec![border("┌", "─", "┬", "┐")];
        for (row_idx, row) in rows.iter().enumerate() {
            let wrapped: Vec<Vec<String>> = (0..columns)
                .map(|idx| {
                    let cell = row.get(idx).map(String::as_str).unwrap_or_default();
                    wrap_ansi(cell, widths[idx])
                })
                .collect();
            let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

            for line_idx in 0..height {
                let cells: Vec<String> = wrapped
                    .iter()
                    .enumerate()
                    .map(|(idx, cell_lines)| {
                        let text = cell_lines.get(line_idx).map(String::as_str).unwrap_or_default();
                        let align = table.align.get(idx).cloned().unwrap_or(AlignKind::None);
                        let padded = pad_cell(text, widths[idx], align);
                        if row_idx == 0 {
                            (self.theme.bold)(&padded)
                        } else {
                            padded
                        }
                    })
                    .collect();
                lines.push(format!(
                    "{separator} {} {separator}",
                    cells.join(&format!(" {separator} "))
                ));
            }

            if row_idx + 1 < rows.len() {
                lines.push(border("├", "─", "┼", "┤"));
            }
        }
        lines.push(border("└", "─", "┴", "┘"));
        lines
    }
}

impl StyledRender for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        self.render_markdown(markdown)
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

fn plain_text(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text(&strong.children)),
            mdast::Node::Emphasis(emphasis) => out.push_str(&plain_text(&emphasis.children)),
            mdast::Node::Delete(delete) => out.push_str(&plain_text(&delete.children)),
            _ => {}
        }
    }
    out
}

/// Shrinks the widest column one cell at a time until the row fits `available`.
fn fit_columns(natural: &[usize], available: usize) -> Vec<usize> {
    let mut widths = natural.to_vec();
    let mut total: usize = widths.iter().sum();
    while total > available {
        let Some((idx, widest)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, width)| *width)
        else {
            break;
        };
        if widest <= 1 {
            break;
        }
        widths[idx] -= 1;
        total -= 1;
    }
    widths
}

fn pad_cell(text: &str, width: usize, align: AlignKind) -> String {
    let padding = width.saturating_sub(visible_width(text));
    match align {
        AlignKind::Right => format!("{}{text}", " ".repeat(padding)),
        AlignKind::Center => {
            let left = padding / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(padding - left))
        }
        AlignKind::Left | AlignKind::None => format!("{text}{}", " ".repeat(padding)),
    }
}

fn node_span(node: &mdast::Node) -> Option<(usize, usize)> {
    node.position()
        .map(|position| (position.start.offset, position.end.offset))
}

/// A paragraph directly followed by a list with no blank line between stays visually attached.
fn is_tight_pair(previous: &mdast::Node, next: &mdast::Node, source: &str) -> bool {
    if !matches!(
        (previous, next),
        (mdast::Node::Paragraph(_), mdast::Node::List(_))
    ) {
        return false;
    }
    let (Some((_, end)), Some((start, _))) = (node_span(previous), node_span(next)) else {
        return false;
    };
    source
        .get(end..start)
        .is_some_and(|between| between.matches('\n').count() < 2)
}
