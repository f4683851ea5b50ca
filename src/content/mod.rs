//! Content module - front matter, markdown rendering and page loading

mod frontmatter;
pub mod loader;
mod markdown;
mod page;

pub use frontmatter::{split as split_front_matter, FrontMatterError, Metadata};
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;
pub use page::{read_time, slugify, Page};
