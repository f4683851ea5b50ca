//! Helper functions shared by the pipeline and the templates

mod date;
mod html;
mod list;

pub use date::*;
pub use html::*;
pub use list::*;
