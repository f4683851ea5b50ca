//! Content loader - walks the routes and loads every markdown page

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::frontmatter;
use super::page::{read_time, slugify};
use super::{MarkdownRenderer, Metadata, Page};
use crate::config::SiteConfig;
use crate::error::{BuildError, Result};
use crate::helpers::{parse_date, ISO_DATE};
use crate::routes::{is_valid_slug, RouteTable};

/// Loads pages from the content directory, one route at a time
pub struct ContentLoader<'a> {
    config: &'a SiteConfig,
    content_dir: PathBuf,
    routes: &'a RouteTable,
    renderer: MarkdownRenderer,
    now: DateTime<Utc>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(
        config: &'a SiteConfig,
        content_dir: impl Into<PathBuf>,
        routes: &'a RouteTable,
        renderer: MarkdownRenderer,
    ) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
            routes,
            renderer,
            now: Utc::now(),
        }
    }

    /// Pin the clock used for default dates and the future-post check
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Load the pages of every route, in route declaration order.
    ///
    /// A file reached by several routes is loaded once and owned by the
    /// first route that matches it.
    pub fn load_pages(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut seen = HashSet::new();

        for (_, route) in self.routes.iter() {
            let path = self.content_dir.join(&route.content_path);
            let info = fs::metadata(&path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BuildError::route(
                    &route.content_path,
                    format!("points to non-existent path: {}", path.display()),
                ),
                _ => BuildError::route(&route.content_path, format!("error accessing path: {}", e)),
            })?;

            if info.is_dir() {
                let files = markdown_files(&path)?;
                if files.is_empty() {
                    return Err(BuildError::route(
                        &route.content_path,
                        "is a directory but contains no markdown files",
                    ));
                }
                tracing::debug!(
                    "Route '{}' has {} markdown files",
                    route.content_path,
                    files.len()
                );
                for file in files {
                    self.load_once(&file, &mut seen, &mut pages)?;
                }
            } else {
                if !is_markdown_file(&path) {
                    return Err(BuildError::route(
                        &route.content_path,
                        format!("points to non-markdown file: {}", path.display()),
                    ));
                }
                self.load_once(&path, &mut seen, &mut pages)?;
            }
        }

        Ok(pages)
    }

    fn load_once(
        &self,
        path: &Path,
        seen: &mut HashSet<String>,
        pages: &mut Vec<Page>,
    ) -> Result<()> {
        let source = self.relative_source(path);
        if !seen.insert(source.clone()) {
            tracing::debug!("Skipping {} (already loaded by an earlier route)", source);
            return Ok(());
        }
        if let Some(page) = self.load_page(path, source)? {
            pages.push(page);
        }
        Ok(())
    }

    /// Load a single page. Returns `None` for drafts and future posts
    /// that the configuration excludes.
    pub fn load_page(&self, path: &Path, source: String) -> Result<Option<Page>> {
        let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);

        let (metadata, body) = frontmatter::split(&text).map_err(|e| BuildError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut metadata = metadata.unwrap_or_else(|| self.default_metadata(path));

        if metadata.str("slug").map_or(true, str::is_empty) {
            metadata.insert("slug", slugify(file_stem(path)));
        }

        if metadata.get_bool("draft") && !self.config.build_draft {
            tracing::debug!("Skipping draft {}", source);
            return Ok(None);
        }

        let date = parse_date(metadata.get_str("date"));
        if !self.config.build_future && date.is_some_and(|d| d > self.now) {
            tracing::debug!("Skipping future post {}", source);
            return Ok(None);
        }

        let content = self.renderer.render(body);
        metadata.insert("read_time", read_time(body));

        let route = self.routes.match_route(&source);
        match route.and_then(|id| self.routes.get(id)) {
            Some(r) => {
                let slug = metadata.get_str("slug");
                if !is_valid_slug(slug) {
                    return Err(BuildError::route(
                        &r.content_path,
                        format!("slug '{}' in {} is not a single path segment", slug, source),
                    ));
                }
            }
            None => tracing::debug!("{} matches no route", source),
        }

        Ok(Some(Page {
            metadata,
            content,
            route,
            date,
            source,
        }))
    }

    /// Metadata for a file without front matter
    fn default_metadata(&self, path: &Path) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("title", file_stem(path));
        metadata.insert("description", "");
        metadata.insert("date", self.now.format(ISO_DATE).to_string());
        metadata
    }

    /// Path relative to the content directory, `/`-separated
    fn relative_source(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.content_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Every markdown file under `dir`, in file-name order
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::io(path, io::Error::from(e))
        })?;
        if entry.file_type().is_file() && is_markdown_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("untitled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Route;
    use crate::highlight::TreeSitterHighlighter;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn route(content_path: &str, output_pattern: &str) -> Route {
        Route {
            content_path: content_path.to_string(),
            output_pattern: output_pattern.to_string(),
            template: "page.tmpl".to_string(),
            generate_rss: false,
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn load(config: &SiteConfig, dir: &TempDir) -> Result<Vec<Page>> {
        let routes = RouteTable::new(config.routes.clone());
        let renderer = MarkdownRenderer::new(Box::new(TreeSitterHighlighter::new()));
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ContentLoader::new(config, dir.path(), &routes, renderer)
            .with_now(now)
            .load_pages()
    }

    fn config(routes: Vec<Route>) -> SiteConfig {
        SiteConfig {
            routes,
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_load_directory_route() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "writing/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nBody b");
        write(dir.path(), "writing/nested/a.md", "---\ntitle: A\nslug: custom\n---\nBody a");
        write(dir.path(), "writing/notes.txt", "ignored");

        let pages = load(&config(vec![route("writing", "/writing/:slug")]), &dir).unwrap();
        assert_eq!(pages.len(), 2);

        let b = pages.iter().find(|p| p.source == "writing/b.md").unwrap();
        assert_eq!(b.slug(), "b");
        assert!(b.content.contains("Body b"));
        assert!(b.date.is_some());
        assert!(b.route.is_some());

        let a = pages.iter().find(|p| p.source == "writing/nested/a.md").unwrap();
        assert_eq!(a.slug(), "custom");
        assert!(a.date.is_none());
    }

    #[test]
    fn test_default_metadata_without_front_matter() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "My Notes.md", &"word ".repeat(400));

        let pages = load(&config(vec![route("My Notes.md", "/notes")]), &dir).unwrap();
        let page = &pages[0];
        assert_eq!(page.metadata.get_str("title"), "My Notes");
        assert_eq!(page.metadata.get_str("description"), "");
        assert_eq!(page.metadata.get_str("date"), "2024-06-01");
        assert_eq!(page.slug(), "my-notes");
        assert_eq!(page.metadata.get("read_time").and_then(|v| v.as_u64()), Some(2));
    }

    #[test]
    fn test_empty_slug_falls_back_to_file_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "writing/My Post.md", "---\ntitle: X\nslug: \"\"\n---\nbody");
        let pages = load(&config(vec![route("writing", "/writing/:slug")]), &dir).unwrap();
        assert_eq!(pages[0].slug(), "my-post");
    }

    #[test]
    fn test_slug_cannot_leave_output_dir() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "writing/a.md", "---\ntitle: A\nslug: ../../../escaped\n---\nbody");
        let err = load(&config(vec![route("writing", "/writing/:slug")]), &dir).unwrap_err();
        assert!(matches!(err, BuildError::Route { ref route, .. } if route == "writing"));
        assert!(err.to_string().contains("../../../escaped"));
    }

    #[test]
    fn test_dot_route_loads_content_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\n---\na");
        write(dir.path(), "sub/b.md", "---\ntitle: B\n---\nb");

        let pages = load(&config(vec![route(".", "/:slug")]), &dir).unwrap();
        assert_eq!(pages.len(), 2);
        let a = pages.iter().find(|p| p.source == "a.md").unwrap();
        assert_eq!(a.route.map(|r| r.index()), Some(0));
        assert!(pages.iter().any(|p| p.source == "sub/b.md" && p.route.is_some()));
    }

    #[test]
    fn test_read_time_is_always_recomputed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.md", "---\ntitle: Home\nread_time: 99\n---\nshort");
        let pages = load(&SiteConfig::default(), &dir).unwrap();
        assert_eq!(pages[0].metadata.get("read_time").and_then(|v| v.as_u64()), Some(0));
    }

    #[test]
    fn test_empty_directory_route_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "empty-dir/readme.txt", "nothing here");

        let err = load(&config(vec![route("empty-dir", "/x/:slug")]), &dir).unwrap_err();
        assert!(matches!(err, BuildError::Route { ref route, .. } if route == "empty-dir"));
    }

    #[test]
    fn test_missing_and_non_markdown_routes_fail() {
        let dir = TempDir::new().unwrap();
        let err = load(&config(vec![route("missing.md", "/")]), &dir).unwrap_err();
        assert!(err.to_string().contains("non-existent"));

        write(dir.path(), "page.html", "<p>hi</p>");
        let err = load(&config(vec![route("page.html", "/")]), &dir).unwrap_err();
        assert!(err.to_string().contains("non-markdown"));
    }

    #[test]
    fn test_bad_front_matter_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.md", "---\ntitle: unterminated\n");
        let err = load(&SiteConfig::default(), &dir).unwrap_err();
        assert!(matches!(err, BuildError::Parse { .. }));
    }

    #[test]
    fn test_overlapping_routes_load_each_file_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/drafts/x.md", "---\ntitle: X\n---\nx");
        write(dir.path(), "blog/y.md", "---\ntitle: Y\n---\ny");

        let cfg = config(vec![route("blog", "/blog/:slug"), route("blog/drafts", "/drafts/:slug")]);
        let pages = load(&cfg, &dir).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.route.map(|r| r.index()) == Some(0)));
    }

    #[test]
    fn test_drafts_and_future_posts_are_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "posts/draft.md", "---\ntitle: D\ndraft: true\n---\n");
        write(dir.path(), "posts/future.md", "---\ntitle: F\ndate: 2030-01-01\n---\n");
        write(dir.path(), "posts/now.md", "---\ntitle: N\ndate: 2024-01-01\n---\n");

        let mut cfg = config(vec![route("posts", "/posts/:slug")]);
        let pages = load(&cfg, &dir).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, "posts/now.md");

        cfg.build_draft = true;
        cfg.build_future = true;
        assert_eq!(load(&cfg, &dir).unwrap().len(), 3);
    }

    #[test]
    fn test_directory_of_only_drafts_is_not_empty() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "posts/draft.md", "---\ntitle: D\ndraft: true\n---\n");
        let pages = load(&config(vec![route("posts", "/posts/:slug")]), &dir).unwrap();
        assert!(pages.is_empty());
    }
}
