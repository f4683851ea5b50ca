//! Listing helpers exposed to templates

use serde::Serialize;
use serde_json::Value;

use crate::templates::PageInfo;

/// A link with its display title, for navigation partials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkItem {
    pub link: String,
    pub title: String,
}

/// A listing entry projected for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WritingItem {
    pub date: String,
    pub link: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub fn link_item(link: &str, title: &str) -> LinkItem {
    LinkItem {
        link: link.to_string(),
        title: title.to_string(),
    }
}

/// String field of a mapping, or `""` when absent or not a string
pub fn get_str(map: &Value, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Project listing entries into `{date, link, title, type}` records
pub fn writing_items(pages: &[PageInfo]) -> Vec<WritingItem> {
    pages
        .iter()
        .map(|p| WritingItem {
            date: p.metadata.get_str("date").to_string(),
            link: p.link.clone(),
            title: p.metadata.get_str("title").to_string(),
            kind: p.metadata.get_str("type").to_string(),
        })
        .collect()
}
