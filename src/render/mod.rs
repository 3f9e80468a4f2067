//! Consumer side of the pipeline: segmentation, styled markdown and terminal output.

pub mod highlight;
pub mod markdown;
pub mod segmenter;
pub mod terminal;
pub mod theme;

use thiserror::Error;

pub use highlight::CodeHighlighter;
pub use markdown::MarkdownRenderer;
pub use segmenter::{BlockAwareSegmenter, BlockState, Scan};
pub use terminal::{RenderMode, RenderState, TerminalRenderer};
pub use theme::{MarkdownTheme, ThemeName};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown parse failed: {message}")]
    Parse { message: String },
    #[error("unknown theme: {name}")]
    UnknownTheme { name: String },
}

/// Markdown-to-terminal formatting used by the renderer in styled mode.
pub trait StyledRender {
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

impl<F> StyledRender for F
where
    F: Fn(&str) -> Result<String, RenderError>,
{
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        self(markdown)
    }
}
