//! Classed highlighting with syntect's bundled grammars

use ::syntect::html::{ClassStyle, ClassedHTMLGenerator};
use ::syntect::parsing::SyntaxSet;
use ::syntect::util::LinesWithEndings;

use super::{code_open_tag, HighlightError, Highlighter, CODE_CLOSE_TAG};

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn try_highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        if lang.is_empty() {
            return Err(HighlightError::UnsupportedLanguage(String::new()));
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(lang.to_string()))?;

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed { prefix: "tok-" },
        );
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Render {
                    lang: lang.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(format!(
            "{}{}{}",
            code_open_tag(lang),
            generator.finalize(),
            CODE_CLOSE_TAG
        ))
    }
}
