//! Generator module - renders routed pages into the build cache

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::content::Page;
use crate::error::{BuildError, Result};
use crate::helpers::ISO_DATE;
use crate::routes::RouteTable;
use crate::templates::{Listing, PageData, PageInfo, SiteData, TemplateRenderer};

/// Renders pages through their route templates
pub struct Generator<'a> {
    routes: &'a RouteTable,
    renderer: &'a TemplateRenderer,
    site: SiteData,
    output_dir: PathBuf,
}

impl<'a> Generator<'a> {
    pub fn new(
        routes: &'a RouteTable,
        renderer: &'a TemplateRenderer,
        site: SiteData,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            routes,
            renderer,
            site,
            output_dir: output_dir.into(),
        }
    }

    /// Render every routed page, returning the number of files written
    pub fn generate(&self, pages: &[Page]) -> Result<usize> {
        check_collisions(pages, self.routes)?;
        let listing = build_listing(pages, self.routes);

        fs::create_dir_all(&self.output_dir).map_err(|e| BuildError::io(&self.output_dir, e))?;

        let mut written = 0;
        for page in pages {
            if page.route.is_none() {
                tracing::debug!("Skipping unrouted page {}", page.source);
                continue;
            }
            let path = self.render_page(page, &listing)?;
            tracing::debug!("Generated: {:?}", path);
            written += 1;
        }

        tracing::info!("Rendered {} pages", written);
        Ok(written)
    }

    fn render_page(&self, page: &Page, listing: &Listing) -> Result<PathBuf> {
        let (Some(route), Some(rel)) = (
            page.route.and_then(|id| self.routes.get(id)),
            page.output_path(self.routes),
        ) else {
            return Err(BuildError::route(&page.source, "page has no route"));
        };

        let context = self.page_context(page, listing);
        let html = self.renderer.render(&route.template, &context)?;

        let output_path = self.output_dir.join(rel);
        write_file(&output_path, &html)?;
        Ok(output_path)
    }

    fn page_context(&self, page: &Page, listing: &Listing) -> Context {
        let data = PageData {
            url: page.url(self.routes).unwrap_or_default(),
            slug: page.slug().to_string(),
            source: page.source.clone(),
            read_time: page
                .metadata
                .get("read_time")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        };

        let mut context = Context::new();
        context.insert("metadata", &page.metadata);
        context.insert("content", &page.content);
        context.insert("all_pages", listing);
        context.insert("site", &self.site);
        context.insert("page", &data);
        context
    }
}

/// Group routed pages by route content path, newest first within a route.
/// Every route gets an entry, empty if nothing was loaded for it.
pub fn build_listing(pages: &[Page], routes: &RouteTable) -> Listing {
    let mut grouped: HashMap<usize, Vec<&Page>> = HashMap::new();
    for page in pages {
        if let Some(id) = page.route {
            grouped.entry(id.index()).or_default().push(page);
        }
    }

    let mut listing = Listing::new();
    for (id, route) in routes.iter() {
        let mut group = grouped.remove(&id.index()).unwrap_or_default();
        group.sort_by(|a, b| Page::newest_first(a, b));

        let infos = group
            .into_iter()
            .map(|page| PageInfo {
                metadata: page.metadata.clone(),
                slug: page.slug().to_string(),
                date: page
                    .date
                    .map(|d| d.format(ISO_DATE).to_string())
                    .unwrap_or_default(),
                link: page.url(routes).unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        listing.entry(route.content_path.clone()).or_default().extend(infos);
    }
    listing
}

/// Fail when two pages resolve to the same output file
pub fn check_collisions(pages: &[Page], routes: &RouteTable) -> Result<()> {
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
    for page in pages {
        let Some(path) = page.output_path(routes) else {
            continue;
        };
        if let Some(other) = claimed.get(&path) {
            let route = page
                .route
                .and_then(|id| routes.get(id))
                .map(|r| r.content_path.as_str())
                .unwrap_or_default();
            return Err(BuildError::route(
                route,
                format!(
                    "'{}' and '{}' both resolve to {}",
                    other,
                    page.source,
                    path.display()
                ),
            ));
        }
        claimed.insert(path, &page.source);
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| BuildError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Route, SiteConfig};
    use crate::content::Metadata;
    use crate::helpers::parse_date;
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        SiteConfig {
            routes: vec![
                Route {
                    content_path: "writing".to_string(),
                    output_pattern: "/writing/:slug".to_string(),
                    template: "post.tmpl".to_string(),
                    generate_rss: true,
                },
                Route {
                    content_path: "index.md".to_string(),
                    output_pattern: "/".to_string(),
                    template: "index.tmpl".to_string(),
                    generate_rss: false,
                },
            ],
            ..Default::default()
        }
    }

    fn page(routes: &RouteTable, source: &str, slug: &str, date: &str) -> Page {
        let mut metadata = Metadata::new();
        metadata.insert("title", slug.to_uppercase());
        metadata.insert("slug", slug);
        metadata.insert("date", date);
        metadata.insert("read_time", 3u64);
        Page {
            metadata,
            content: format!("<p>{}</p>", slug),
            route: routes.match_route(source),
            date: parse_date(date),
            source: source.to_string(),
        }
    }

    fn templates(dir: &Path) {
        fs::write(
            dir.join("post.tmpl"),
            "{{ metadata.title }}|{{ content | safe }}|{{ page.url }}|{{ page.read_time }}|{{ site.title }}",
        )
        .unwrap();
        fs::write(
            dir.join("index.tmpl"),
            "{% for p in all_pages.writing %}{{ p.slug }}@{{ p.date }}{{ p.link }};{% endfor %}",
        )
        .unwrap();
    }

    #[test]
    fn test_build_listing_orders_newest_first() {
        let config = config();
        let routes = RouteTable::new(config.routes.clone());
        let pages = vec![
            page(&routes, "writing/b.md", "b", "2024-02-01"),
            page(&routes, "writing/none.md", "none", ""),
            page(&routes, "writing/c.md", "c", "2024-03-01"),
            page(&routes, "writing/a.md", "a", "2024-01-01"),
            page(&routes, "notes/x.md", "x", "2024-05-01"),
        ];

        let listing = build_listing(&pages, &routes);
        let slugs: Vec<_> = listing["writing"].iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["c", "b", "a", "none"]);
        assert_eq!(listing["writing"][0].date, "2024-03-01");
        assert_eq!(listing["writing"][0].link, "/writing/c/");
        assert_eq!(listing["writing"][3].date, "");
        assert!(listing["index.md"].is_empty());
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn test_generate_writes_pages() {
        let tmp = TempDir::new().unwrap();
        let template_dir = tmp.path().join("templates");
        fs::create_dir_all(&template_dir).unwrap();
        templates(&template_dir);

        let config = config();
        let routes = RouteTable::new(config.routes.clone());
        let renderer = TemplateRenderer::load(&template_dir, &config, &routes).unwrap();
        let out = tmp.path().join("build");
        let generator = Generator::new(&routes, &renderer, SiteData::from_config(&config), &out);

        let pages = vec![
            page(&routes, "writing/a.md", "a", "2024-01-01"),
            page(&routes, "writing/b.md", "b", "2024-02-01"),
            page(&routes, "index.md", "index", "2024-01-01"),
            page(&routes, "drafts/x.md", "x", "2024-01-01"),
        ];
        assert_eq!(generator.generate(&pages).unwrap(), 3);

        let post = fs::read_to_string(out.join("writing/a/index.html")).unwrap();
        assert_eq!(post, "A|<p>a</p>|/writing/a/|3|Your Site");
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert_eq!(index, "b@2024-02-01/writing/b/;a@2024-01-01/writing/a/;");
        assert!(!out.join("drafts").exists());
    }

    #[test]
    fn test_output_collision_is_route_error() {
        let config = config();
        let routes = RouteTable::new(config.routes.clone());
        let pages = vec![
            page(&routes, "writing/a.md", "same", "2024-01-01"),
            page(&routes, "writing/sub/b.md", "same", "2024-02-01"),
        ];
        let err = check_collisions(&pages, &routes).unwrap_err();
        assert!(matches!(err, BuildError::Route { .. }));
        assert!(err.to_string().contains("writing/same/index.html"));
    }
}
