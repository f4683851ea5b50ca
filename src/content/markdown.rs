//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;

use crate::highlight::Highlighter;

lazy_static! {
    static ref BARE_URL: Regex = Regex::new(r"(?:https?://|www\.)[^\s<>]+").unwrap();
}

/// Markdown renderer with pluggable code highlighting
pub struct MarkdownRenderer {
    highlighter: Box<dyn Highlighter>,
    allow_unsafe_html: bool,
}

/// Fenced block being collected for the highlighter
struct FencedBlock {
    lang: String,
    code: String,
}

impl MarkdownRenderer {
    /// Create a renderer that escapes raw HTML
    pub fn new(highlighter: Box<dyn Highlighter>) -> Self {
        Self {
            highlighter,
            allow_unsafe_html: false,
        }
    }

    /// Pass raw HTML in the markdown through instead of escaping it
    pub fn allow_unsafe_html(mut self, allow: bool) -> Self {
        self.allow_unsafe_html = allow;
        self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // GFM tables, strikethrough, task lists and footnotes. Front matter
        // is stripped before we get here, so no metadata blocks.
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        let parser = TextMergeStream::new(Parser::new_ext(markdown, options));

        let mut events: Vec<Event> = Vec::new();
        let mut fenced: Option<FencedBlock> = None;
        let mut in_indented_code = false;
        let mut link_depth = 0usize;
        let mut html_link_depth = 0usize;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(label))) => {
                    fenced = Some(FencedBlock {
                        lang: fence_language(&label).to_string(),
                        code: String::new(),
                    });
                }
                Event::Text(text) if fenced.is_some() => {
                    if let Some(block) = fenced.as_mut() {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fenced.is_some() => {
                    if let Some(block) = fenced.take() {
                        let html = self.highlighter.highlight(&block.code, &block.lang);
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                    in_indented_code = true;
                    events.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_indented_code = false;
                    events.push(event);
                }
                Event::SoftBreak => events.push(Event::HardBreak),
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_unsafe_html => {
                    events.push(Event::Text(raw));
                }
                Event::InlineHtml(raw) => {
                    if is_anchor_open(&raw) {
                        html_link_depth += 1;
                    } else if is_anchor_close(&raw) {
                        html_link_depth = html_link_depth.saturating_sub(1);
                    }
                    events.push(Event::InlineHtml(raw));
                }
                Event::Start(Tag::Link { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Text(text) if link_depth == 0 && html_link_depth == 0 && !in_indented_code => {
                    push_autolinked(&mut events, text);
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

/// Language token of a fence info string (`go`, `rust,ignore`, `sh title=x`)
fn fence_language(label: &str) -> &str {
    let first = label.split_whitespace().next().unwrap_or("");
    first.split_once(',').map(|(lang, _)| lang).unwrap_or(first)
}

/// `<a>` or `<a ...>`
fn is_anchor_open(raw: &str) -> bool {
    raw.trim_start()
        .strip_prefix('<')
        .is_some_and(is_anchor_name)
}

/// `</a>`
fn is_anchor_close(raw: &str) -> bool {
    raw.trim_start()
        .strip_prefix("</")
        .is_some_and(is_anchor_name)
}

fn is_anchor_name(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some('a' | 'A'))
        && chars.next().is_some_and(|c| c == '>' || c.is_ascii_whitespace())
}

/// Push `text`, turning bare URLs into links
fn push_autolinked<'a>(events: &mut Vec<Event<'a>>, text: CowStr<'a>) {
    if !BARE_URL.is_match(&text) {
        events.push(Event::Text(text));
        return;
    }

    let mut last = 0;
    for m in BARE_URL.find_iter(&text) {
        let url = m
            .as_str()
            .trim_end_matches(|c: char| ".,:;!?'\")".contains(c));
        if url.is_empty() || url == "www." {
            continue;
        }
        let start = m.start();
        let end = start + url.len();

        if start > last {
            events.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        let dest = if url.starts_with("www.") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(dest),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}
