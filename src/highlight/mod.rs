//! Code block highlighting
//!
//! A [`Highlighter`] turns the source of a fenced code block into HTML.
//! Implementations may fail internally (unknown language, parser
//! trouble), but [`Highlighter::highlight`] always returns renderable
//! HTML: on failure it falls back to a plain escaped `<pre><code>` block.

mod syntect;
mod tree_sitter;

use thiserror::Error;

use crate::config::HighlighterKind;
use crate::helpers::html_escape;

pub use self::syntect::SyntectHighlighter;
pub use self::tree_sitter::TreeSitterHighlighter;

/// Reasons a highlighter could not classify a code block
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to load grammar for {0}")]
    Language(String),

    #[error("failed to parse {0} source")]
    Parse(String),

    #[error("failed to render highlighted {lang}: {message}")]
    Render { lang: String, message: String },
}

pub trait Highlighter: Send + Sync {
    /// Highlight `code` written in `lang`, or report why it could not.
    fn try_highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError>;

    /// Highlight `code`, degrading to escaped plain text on any failure.
    fn highlight(&self, code: &str, lang: &str) -> String {
        match self.try_highlight(code, lang) {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!("Highlight fallback: {}", e);
                plain_code_block(code, lang)
            }
        }
    }
}

/// Build the configured highlighter
pub fn from_kind(kind: HighlighterKind) -> Box<dyn Highlighter> {
    match kind {
        HighlighterKind::TreeSitter => Box::new(TreeSitterHighlighter::new()),
        HighlighterKind::Syntect => Box::new(SyntectHighlighter::new()),
    }
}

/// Opening tag shared by highlighted and plain blocks
pub(crate) fn code_open_tag(lang: &str) -> String {
    if lang.is_empty() {
        "<pre><code>".to_string()
    } else {
        format!(r#"<pre><code class="language-{}">"#, html_escape(lang))
    }
}

pub(crate) const CODE_CLOSE_TAG: &str = "</code></pre>";

/// Unclassified, escaped code block
pub fn plain_code_block(code: &str, lang: &str) -> String {
    format!("{}{}{}", code_open_tag(lang), html_escape(code), CODE_CLOSE_TAG)
}
