//! Highlighting by walking a tree-sitter concrete syntax tree
//!
//! Every leaf token becomes `<span class="tok-CLASS">text</span>`; text
//! between sibling nodes that no leaf covers (whitespace, mostly) is
//! copied through escaped. Strings and comments are the one exception to
//! the leaf walk: grammars give them children (quotes, escape sequences,
//! interpolations, doc markers), and those are emitted as part of a single
//! `tok-string` or `tok-comment` span instead of one span per child.
//!
//! Grammars are go, bash and rust. Other fences, lua included, fall back to
//! a plain block here; the syntect backend covers them.

use ::tree_sitter::{Language, Node, Parser};

use super::{code_open_tag, HighlightError, Highlighter, CODE_CLOSE_TAG};
use crate::helpers::html_escape;

macro_rules! define_languages {
    ($($lib:ident: [$($name:literal),* $(,)?]),* $(,)?) => {
        fn find_language(name: &str) -> Option<Language> {
            match name {
                $($($name)|* => Some($lib::language()),)*
                _ => None,
            }
        }

        /// Language names (fence labels) with a grammar
        pub const SUPPORTED_LANGUAGES: &[&str] = &[$($($name),*),*];
    }
}

define_languages! {
    tree_sitter_go: ["go", "golang"],
    tree_sitter_bash: ["bash", "sh", "shell"],
    tree_sitter_rust: ["rust", "rs"],
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterHighlighter;

impl TreeSitterHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for TreeSitterHighlighter {
    fn try_highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        let language = find_language(&lang.to_ascii_lowercase())
            .ok_or_else(|| HighlightError::UnsupportedLanguage(lang.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|_| HighlightError::Language(lang.to_string()))?;
        let tree = parser
            .parse(code, None)
            .ok_or_else(|| HighlightError::Parse(lang.to_string()))?;

        let root = tree.root_node();
        let mut html = code_open_tag(lang);
        write_text(&mut html, code, 0, root.start_byte());
        render_node(&mut html, code, root);
        write_text(&mut html, code, root.end_byte().max(root.start_byte()), code.len());
        html.push_str(CODE_CLOSE_TAG);
        Ok(html)
    }
}

fn render_node(out: &mut String, src: &str, node: Node<'_>) {
    let class = classify(&node);
    // a string or comment stays whole even when the grammar splits it
    if node.child_count() == 0 || matches!(class, "string" | "comment") {
        write_token(out, src, &node, class);
        return;
    }

    let mut start = node.start_byte();
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if child.start_byte() > start {
            write_text(out, src, start, child.start_byte());
        }
        render_node(out, src, child);
        start = start.max(child.end_byte());
    }
    if node.end_byte() > start {
        write_text(out, src, start, node.end_byte());
    }
}

fn write_token(out: &mut String, src: &str, node: &Node<'_>, class: &str) {
    let text = slice(src, node.start_byte(), node.end_byte());
    if text.is_empty() {
        return;
    }
    out.push_str(r#"<span class="tok-"#);
    out.push_str(class);
    out.push_str(r#"">"#);
    out.push_str(&html_escape(&text));
    out.push_str("</span>");
}

fn write_text(out: &mut String, src: &str, start: usize, end: usize) {
    out.push_str(&html_escape(&slice(src, start, end)));
}

/// Byte range of `src`, clamped, and lossy if the range splits a character
fn slice(src: &str, start: usize, end: usize) -> std::borrow::Cow<'_, str> {
    let end = end.min(src.len());
    let start = start.min(end);
    match src.get(start..end) {
        Some(s) => s.into(),
        None => String::from_utf8_lossy(&src.as_bytes()[start..end]),
    }
}

/// Map a grammar node kind to a stable CSS class
fn classify(node: &Node<'_>) -> &'static str {
    let kind = node.kind();

    if !node.is_named() {
        return if kind.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            "keyword"
        } else if kind.chars().all(|c| "()[]{},;:.".contains(c)) {
            "punctuation"
        } else {
            "operator"
        };
    }

    match kind {
        "ERROR" => "error",
        "true" | "false" | "nil" | "boolean_literal" | "iota" => "constant",
        "escape_sequence" => "escape",
        "type_identifier" | "primitive_type" | "package_identifier" => "type",
        "field_identifier" | "property_identifier" | "shorthand_field_identifier" => "property",
        "variable_name" | "special_variable_name" => "variable",
        "command_name" => "function",
        "identifier" => "variable",
        k if k.contains("comment") => "comment",
        k if k.contains("string") || k.contains("char") || k == "raw_string" || k == "heredoc_body" => {
            "string"
        }
        k if k.contains("int")
            || k.contains("float")
            || k.contains("number")
            || k.contains("imaginary") =>
        {
            "number"
        }
        k if k.ends_with("identifier") => "variable",
        _ => "text",
    }
}
