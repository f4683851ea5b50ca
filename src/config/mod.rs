//! Configuration module

mod site;

pub use site::HighlighterKind;
pub use site::Route;
pub use site::RssConfig;
pub use site::SiteConfig;
