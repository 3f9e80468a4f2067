//! Terminal styles for the markdown renderer.

use std::fmt;
use std::str::FromStr;

use super::highlight::CodeHighlighter;
use super::RenderError;

pub type MarkdownStyleFn = Box<dyn Fn(&str) -> String + Send + Sync>;

pub type MarkdownCodeHighlighterFn = Box<dyn Fn(&str, Option<&str>) -> Vec<String> + Send + Sync>;

pub struct MarkdownTheme {
    pub heading: MarkdownStyleFn,
    pub link: MarkdownStyleFn,
    pub link_url: MarkdownStyleFn,
    pub code: MarkdownStyleFn,
    pub code_block: MarkdownStyleFn,
    pub code_block_border: MarkdownStyleFn,
    pub quote: MarkdownStyleFn,
    pub quote_border: MarkdownStyleFn,
    pub hr: MarkdownStyleFn,
    pub list_bullet: MarkdownStyleFn,
    pub table_border: MarkdownStyleFn,
    pub bold: MarkdownStyleFn,
    pub italic: MarkdownStyleFn,
    pub strikethrough: MarkdownStyleFn,
    pub underline: MarkdownStyleFn,
    pub highlight_code: Option<MarkdownCodeHighlighterFn>,
    pub code_block_indent: String,
}

impl fmt::Debug for MarkdownTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownTheme")
            .field("highlight_code", &self.highlight_code.is_some())
            .field("code_block_indent", &self.code_block_indent)
            .finish_non_exhaustive()
    }
}

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

fn bold(text: &str) -> String {
    ansi_wrap(text, "\x1b[1m", "\x1b[22m")
}

fn italic(text: &str) -> String {
    ansi_wrap(text, "\x1b[3m", "\x1b[23m")
}

fn underline(text: &str) -> String {
    ansi_wrap(text, "\x1b[4m", "\x1b[24m")
}

fn strikethrough(text: &str) -> String {
    ansi_wrap(text, "\x1b[9m", "\x1b[29m")
}

fn blue(text: &str) -> String {
    ansi_wrap(text, "\x1b[34m", "\x1b[39m")
}

fn cyan(text: &str) -> String {
    ansi_wrap(text, "\x1b[36m", "\x1b[39m")
}

fn green(text: &str) -> String {
    ansi_wrap(text, "\x1b[32m", "\x1b[39m")
}

fn yellow(text: &str) -> String {
    ansi_wrap(text, "\x1b[33m", "\x1b[39m")
}

fn magenta(text: &str) -> String {
    ansi_wrap(text, "\x1b[35m", "\x1b[39m")
}

fn unstyled(text: &str) -> String {
    text.to_string()
}

fn highlighter_fn(highlighter: CodeHighlighter) -> MarkdownCodeHighlighterFn {
    Box::new(move |code, lang| highlighter.highlight(code, lang))
}

impl MarkdownTheme {
    pub fn dark() -> Self {
        Self {
            heading: Box::new(cyan),
            link: Box::new(blue),
            link_url: Box::new(dim),
            code: Box::new(yellow),
            code_block: Box::new(green),
            code_block_border: Box::new(dim),
            quote: Box::new(italic),
            quote_border: Box::new(dim),
            hr: Box::new(dim),
            list_bullet: Box::new(cyan),
            table_border: Box::new(dim),
            bold: Box::new(bold),
            italic: Box::new(italic),
            strikethrough: Box::new(strikethrough),
            underline: Box::new(underline),
            highlight_code: Some(highlighter_fn(CodeHighlighter::dark())),
            code_block_indent: "  ".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            heading: Box::new(blue),
            link: Box::new(blue),
            link_url: Box::new(dim),
            code: Box::new(magenta),
            code_block: Box::new(unstyled),
            code_block_border: Box::new(dim),
            quote: Box::new(italic),
            quote_border: Box::new(dim),
            hr: Box::new(dim),
            list_bullet: Box::new(blue),
            table_border: Box::new(dim),
            bold: Box::new(bold),
            italic: Box::new(italic),
            strikethrough: Box::new(strikethrough),
            underline: Box::new(underline),
            highlight_code: Some(highlighter_fn(CodeHighlighter::light())),
            code_block_indent: "  ".to_string(),
        }
    }

    /// Layout without any escape sequences, for terminals that cannot show them.
    pub fn notty() -> Self {
        Self {
            heading: Box::new(unstyled),
            link: Box::new(unstyled),
            link_url: Box::new(unstyled),
            code: Box::new(|text| format!("`{text}`")),
            code_block: Box::new(unstyled),
            code_block_border: Box::new(unstyled),
            quote: Box::new(unstyled),
            quote_border: Box::new(unstyled),
            hr: Box::new(unstyled),
            list_bullet: Box::new(unstyled),
            table_border: Box::new(unstyled),
            bold: Box::new(unstyled),
            italic: Box::new(unstyled),
            strikethrough: Box::new(unstyled),
            underline: Box::new(unstyled),
            highlight_code: None,
            code_block_indent: "  ".to_string(),
        }
    }

    pub fn named(name: ThemeName, is_tty: bool) -> Self {
        match name.resolve(is_tty) {
            ThemeName::Light => Self::light(),
            ThemeName::Notty => Self::notty(),
            ThemeName::Dark | ThemeName::Auto => Self::dark(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Auto,
    Dark,
    Light,
    Notty,
}

impl ThemeName {
    /// `Auto` picks `Dark` on a terminal and `Notty` otherwise.
    pub fn resolve(self, is_tty: bool) -> Self {
        match self {
            ThemeName::Auto if is_tty => ThemeName::Dark,
            ThemeName::Auto => ThemeName::Notty,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Auto => "auto",
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
            ThemeName::Notty => "notty",
        }
    }
}

impl FromStr for ThemeName {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(ThemeName::Auto),
            "dark" => Ok(ThemeName::Dark),
            "light" => Ok(ThemeName::Light),
            "notty" | "none" => Ok(ThemeName::Notty),
            _ => Err(RenderError::UnknownTheme {
                name: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
