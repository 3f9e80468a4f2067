//! Syntax highlighting for fenced code blocks.

use std::fmt;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const DARK_THEME: &str = "base16-ocean.dark";
const LIGHT_THEME: &str = "InspiredGitHub";
const RESET: &str = "\x1b[0m";

/// Owns its syntax and theme sets; build one per renderer rather than sharing a global.
pub struct CodeHighlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl fmt::Debug for CodeHighlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeHighlighter")
            .field("theme", &self.theme.name)
            .finish_non_exhaustive()
    }
}

impl CodeHighlighter {
    pub fn dark() -> Self {
        Self::with_theme(DARK_THEME)
    }

    pub fn light() -> Self {
        Self::with_theme(LIGHT_THEME)
    }

    /// Falls back to the first bundled theme when `name` is not bundled with syntect.
    pub fn with_theme(name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(name) {
            Some(theme) => theme,
            None => {
                tracing::debug!(theme = name, "unknown highlight theme; using first bundled");
                themes.into_values().next().unwrap_or_default()
            }
        };
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// One escaped string per source line. Unknown languages highlight as plain text; a line
    /// that fails to highlight is returned unstyled.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> Vec<String> {
        let syntax = lang
            .and_then(|token| self.syntaxes.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let escaped = match highlighter.highlight_line(line, &self.syntaxes) {
                Ok(ranges) => {
                    let mut escaped = as_24_bit_terminal_escaped(&ranges, false);
                    let trimmed_len = escaped.trim_end_matches(['\n', '\r']).len();
                    escaped.truncate(trimmed_len);
                    escaped.push_str(RESET);
                    escaped
                }
                Err(_) => line.trim_end_matches(['\n', '\r']).to_string(),
            };
            lines.push(escaped);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::CodeHighlighter;
    use crate::core::text::ansi::strip_ansi;

    #[test]
    fn highlighting_preserves_text_per_line() {
        let highlighter = CodeHighlighter::dark();
        let lines = highlighter.highlight("fn main() {\n    let x = 1;\n}", Some("rust"));
        let plain: Vec<String> = lines.iter().map(|line| strip_ansi(line)).collect();
        assert_eq!(plain, vec!["fn main() {", "    let x = 1;", "}"]);
        assert!(lines[0].contains("\x1b[38;2;"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let highlighter = CodeHighlighter::light();
        let lines = highlighter.highlight("just words", Some("no-such-language"));
        assert_eq!(strip_ansi(&lines[0]), "just words");
    }

    #[test]
    fn empty_code_yields_one_line() {
        let highlighter = CodeHighlighter::dark();
        assert_eq!(highlighter.highlight("", None), vec![String::new()]);
    }
}
