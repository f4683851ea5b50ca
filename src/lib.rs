//! cedar: a small static site generator driven by a route table
//!
//! Markdown files with YAML front matter are rendered through Tera
//! templates into a staging directory, synced incrementally into the
//! publish directory, and optionally summarized in an RSS feed.

pub mod build;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod generator;
pub mod helpers;
pub mod highlight;
pub mod publish;
pub mod routes;
pub mod templates;

use std::path::{Path, PathBuf};

pub use build::BuildReport;
pub use error::{BuildError, Result};

/// The main Cedar application
#[derive(Debug, Clone)]
pub struct Cedar {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Directory holding the configuration file; every other path is relative to it
    pub base_dir: PathBuf,
    pub content_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Staging directory pages are rendered into
    pub cache_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Public (output) directory
    pub publish_dir: PathBuf,
}

impl Cedar {
    /// Load the configuration file and resolve the site directories
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config = config::SiteConfig::load(config_path)?;
        let base_dir = match config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::new(config, base_dir))
    }

    /// Create an instance from an already loaded configuration
    pub fn new(config: config::SiteConfig, base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            content_dir: base_dir.join(&config.content_dir),
            template_dir: base_dir.join(&config.template_dir),
            cache_dir: base_dir.join(&config.cache_dir),
            static_dir: base_dir.join(&config.static_dir),
            publish_dir: base_dir.join(&config.publish_dir),
            config,
            base_dir,
        }
    }

    /// Build the site
    pub fn build(&self) -> Result<BuildReport> {
        build::run(self)
    }
}
