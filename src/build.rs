//! The build pipeline: load → render → publish → feed

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use crate::content::{ContentLoader, MarkdownRenderer};
use crate::error::Result;
use crate::feed::FeedGenerator;
use crate::generator::Generator;
use crate::highlight;
use crate::publish::{Publisher, SyncStats};
use crate::routes::RouteTable;
use crate::templates::{SiteData, TemplateRenderer};
use crate::Cedar;

/// What a successful build produced
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Pages rendered into the cache
    pub pages: usize,
    /// Files synced into the publish directory
    pub published: SyncStats,
    /// Feed location, if one was generated
    pub feed: Option<PathBuf>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated {} pages, published {} files ({} unchanged)",
            self.pages, self.published.written, self.published.skipped
        )?;
        if let Some(feed) = &self.feed {
            write!(f, ", feed at {}", feed.display())?;
        }
        Ok(())
    }
}

/// Run a full build
pub fn run(cedar: &Cedar) -> Result<BuildReport> {
    let start = Instant::now();
    let config = &cedar.config;
    let routes = RouteTable::new(config.routes.clone());

    let markdown = MarkdownRenderer::new(highlight::from_kind(config.highlighter))
        .allow_unsafe_html(config.allow_unsafe_html);
    let pages = ContentLoader::new(config, &cedar.content_dir, &routes, markdown).load_pages()?;
    tracing::info!("Loaded {} pages from {} routes", pages.len(), routes.len());

    let templates = TemplateRenderer::load(&cedar.template_dir, config, &routes)?;
    let site = SiteData::from_config(config);
    let rendered = Generator::new(&routes, &templates, site, &cedar.cache_dir).generate(&pages)?;

    let published = Publisher::new(&cedar.cache_dir, &cedar.static_dir, &cedar.publish_dir)
        .clean_build(config.clean_build)
        .publish()?;

    let feed = if config.rss.generate {
        Some(FeedGenerator::new(&config.rss, &routes).write(&pages, &cedar.publish_dir)?)
    } else {
        None
    };

    tracing::info!("Completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(BuildReport {
        pages: rendered,
        published,
        feed,
    })
}
