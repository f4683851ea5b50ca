//! Site configuration (cedar.toml / cedar.yaml / cedar.json)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Directories
    pub publish_dir: String,
    pub static_dir: String,
    pub content_dir: String,
    pub template_dir: String,
    pub template_ext: String,
    pub cache_dir: String,
    /// Base layout, relative to `template_dir`. Empty means no base layout.
    pub base_template_path: String,
    /// Partials directory, relative to `template_dir`
    pub partials_dir: String,

    pub copyright: String,

    // Build flags
    pub clean_build: bool,
    pub build_draft: bool,
    pub build_future: bool,
    pub allow_unsafe_html: bool,
    pub highlighter: HighlighterKind,

    #[serde(default)]
    pub rss: RssConfig,

    /// Ordered route table. Declaration order is the match order.
    pub routes: Vec<Route>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            publish_dir: "public".to_string(),
            static_dir: "static".to_string(),
            content_dir: "content".to_string(),
            template_dir: "templates".to_string(),
            template_ext: ".tmpl".to_string(),
            cache_dir: "build".to_string(),
            base_template_path: String::new(),
            partials_dir: "partials".to_string(),

            copyright: String::new(),

            clean_build: false,
            build_draft: false,
            build_future: false,
            allow_unsafe_html: false,
            highlighter: HighlighterKind::default(),

            rss: RssConfig::default(),

            routes: vec![Route {
                content_path: "index.md".to_string(),
                output_pattern: "/".to_string(),
                template: "_index.html".to_string(),
                generate_rss: false,
            }],
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file, picking the decoder from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BuildError::config(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: SiteConfig = match ext {
            "toml" => toml::from_str(&content).map_err(|e| BuildError::config(path, e))?,
            "json" => serde_json::from_str(&content).map_err(|e| BuildError::config(path, e))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| BuildError::config(path, e))?
            }
            other => {
                return Err(BuildError::config(
                    path,
                    format!("invalid config file type: '.{}'", other),
                ))
            }
        };

        config.validate().map_err(|msg| BuildError::config(path, msg))?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check the invariants the build relies on
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.routes.is_empty() {
            return Err("no routes configured".to_string());
        }
        if self.template_ext.is_empty() {
            return Err("template_ext must not be empty".to_string());
        }
        for route in &self.routes {
            if route.content_path.trim().is_empty() {
                return Err("route with empty content_path".to_string());
            }
            if route.template.trim().is_empty() {
                return Err(format!("route '{}' has no template", route.content_path));
            }
            if !route.output_pattern.starts_with('/') {
                return Err(format!(
                    "route '{}' output_pattern '{}' must start with '/'",
                    route.content_path, route.output_pattern
                ));
            }
        }
        Ok(())
    }
}

/// RSS feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    pub generate: bool,
    pub title: String,
    pub description: String,
    pub url: String,
    /// Feed location relative to `publish_dir`
    pub path: String,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            generate: false,
            title: "Your Site".to_string(),
            description: "built with Cedar".to_string(),
            url: "example.com".to_string(),
            path: "rss.xml".to_string(),
        }
    }
}

/// A content path (file or directory) published through a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub content_path: String,
    pub output_pattern: String,
    pub template: String,
    #[serde(default)]
    pub generate_rss: bool,
}

/// Code highlighting backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlighterKind {
    #[default]
    TreeSitter,
    Syntect,
}
