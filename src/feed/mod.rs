//! RSS feed generation.
//!
//! Collects the pages of every route flagged `generate_rss` and writes a
//! single RSS 2.0 channel, newest first.

use chrono::{DateTime, Utc};
use rss::{validation::Validate, CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::path::{Path, PathBuf};

use crate::config::RssConfig;
use crate::content::Page;
use crate::error::{BuildError, Result};
use crate::helpers::date_rfc2822;
use crate::publish::write_atomic;
use crate::routes::RouteTable;

/// RSS feed builder
pub struct FeedGenerator<'a> {
    config: &'a RssConfig,
    routes: &'a RouteTable,
    now: DateTime<Utc>,
}

impl<'a> FeedGenerator<'a> {
    pub fn new(config: &'a RssConfig, routes: &'a RouteTable) -> Self {
        Self {
            config,
            routes,
            now: Utc::now(),
        }
    }

    /// Pin the channel's `pubDate`
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Build and validate the channel
    pub fn build_channel(&self, pages: &[Page]) -> Result<Channel> {
        let mut selected: Vec<&Page> = pages.iter().filter(|p| self.in_feed(p)).collect();
        selected.sort_by(|a, b| Page::newest_first(a, b));

        let base = self.base_url();
        let items = selected
            .into_iter()
            .map(|page| self.item(page, &base))
            .collect::<Result<Vec<_>>>()?;

        let channel = ChannelBuilder::default()
            .title(self.config.title.as_str())
            .link(base.as_str())
            .description(self.config.description.as_str())
            .pub_date(Some(date_rfc2822(&self.now)))
            .generator(Some("cedar".to_string()))
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| BuildError::Feed(format!("rss validation failed: {e}")))?;
        Ok(channel)
    }

    /// Write the feed under `publish_dir`, returning its path
    pub fn write(&self, pages: &[Page], publish_dir: &Path) -> Result<PathBuf> {
        let channel = self.build_channel(pages)?;
        let path = publish_dir.join(&self.config.path);
        write_atomic(&path, channel.to_string().as_bytes())?;

        tracing::info!("Generated {} ({} items)", self.config.path, channel.items().len());
        Ok(path)
    }

    fn in_feed(&self, page: &Page) -> bool {
        page.route
            .and_then(|id| self.routes.get(id))
            .is_some_and(|route| route.generate_rss)
    }

    fn item(&self, page: &Page, base: &str) -> Result<rss::Item> {
        let title = page
            .title()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BuildError::Feed(format!("{} has no title", page.source)))?;

        let path = page.url(self.routes).unwrap_or_default();
        let link = format!("{}{}", base, path.trim_end_matches('/'));

        let categories = page.metadata.get_str_list("categories");
        let categories = if categories.is_empty() {
            Vec::new()
        } else {
            vec![CategoryBuilder::default().name(categories.join(", ")).build()]
        };

        Ok(ItemBuilder::default()
            .title(Some(title.to_string()))
            .link(Some(link.clone()))
            .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
            .description(Some(page.metadata.get_str("description").to_string()))
            .categories(categories)
            .pub_date(page.date.as_ref().map(date_rfc2822))
            .content(Some(page.content.clone()))
            .build())
    }

    /// Site URL with a scheme and no trailing slash
    fn base_url(&self) -> String {
        let url = self.config.url.trim_end_matches('/');
        if url.contains("://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }
}
