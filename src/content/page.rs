//! Page model

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::Metadata;
use crate::routes::{self, RouteId, RouteTable};

/// Reading speed used for `read_time`, in words per minute
const WORDS_PER_MINUTE: f64 = 200.0;

/// One rendered content file
#[derive(Debug, Clone)]
pub struct Page {
    /// Front matter plus computed `slug` and `read_time`
    pub metadata: Metadata,

    /// Rendered HTML content
    pub content: String,

    /// Owning route, `None` when no route matches the source path
    pub route: Option<RouteId>,

    /// Publish date parsed from `metadata.date`; `None` sorts last
    pub date: Option<DateTime<Utc>>,

    /// Source path relative to the content directory, `/`-separated
    pub source: String,
}

impl Page {
    /// Slug from metadata (always present once loaded)
    pub fn slug(&self) -> &str {
        self.metadata.get_str("slug")
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.str("title")
    }

    /// Output file relative to the publish root, if the page is routed
    pub fn output_path(&self, routes: &RouteTable) -> Option<PathBuf> {
        let route = routes.get(self.route?)?;
        Some(routes::resolve_output_path(route, self.slug()))
    }

    /// Site-relative URL, if the page is routed
    pub fn url(&self, routes: &RouteTable) -> Option<String> {
        let route = routes.get(self.route?)?;
        Some(routes::url_path(route, self.slug()))
    }

    /// Ordering key for newest-first listings
    pub fn newest_first(a: &Page, b: &Page) -> std::cmp::Ordering {
        b.date.cmp(&a.date)
    }
}

/// Normalize a title or file name into a URL slug: trimmed, lower-cased,
/// spaces become `-`, periods are dropped.
pub fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '.' => None,
            c if c.is_whitespace() => Some('-'),
            c => Some(c),
        })
        .collect()
}

/// Estimated reading time in whole minutes
pub fn read_time(text: &str) -> u64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_PER_MINUTE).round() as u64
}
