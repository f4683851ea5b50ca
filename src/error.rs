//! Build error types

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which layer of the template registry failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLayer {
    Base,
    Partial,
    Page,
    Render,
}

impl fmt::Display for TemplateLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateLayer::Base => "base template",
            TemplateLayer::Partial => "partial",
            TemplateLayer::Page => "page template",
            TemplateLayer::Render => "render",
        };
        f.write_str(name)
    }
}

/// Fatal errors that abort a build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("route '{route}': {message}")]
    Route { route: String, message: String },

    #[error("invalid front matter in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{layer} '{name}' failed: {source}")]
    Template {
        layer: TemplateLayer,
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("publish failed at {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feed error: {0}")]
    Feed(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn config(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        BuildError::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn route(route: impl Into<String>, message: impl fmt::Display) -> Self {
        BuildError::Route {
            route: route.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn publish(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Publish {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
