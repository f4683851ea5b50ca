//! Route table: content path → output path + template
//!
//! Routes are matched in declaration order and the first match wins, so
//! a broad route declared before a narrower one shadows it.

use std::path::PathBuf;

use crate::config::Route;

/// Placeholder substituted with the page slug in output patterns
pub const SLUG_PLACEHOLDER: &str = ":slug";

/// Index into the immutable route table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl RouteId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn get(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RouteId, &Route)> {
        self.routes.iter().enumerate().map(|(i, r)| (RouteId(i), r))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route whose content path equals `rel_path` or is a
    /// directory prefix of it
    pub fn match_route(&self, rel_path: &str) -> Option<RouteId> {
        self.iter()
            .find(|(_, route)| route_matches(route, rel_path))
            .map(|(id, _)| id)
    }
}

/// Whether `rel_path` (relative to the content root) belongs to `route`
pub fn route_matches(route: &Route, rel_path: &str) -> bool {
    let content_path = normalize(&route.content_path);
    let rel_path = normalize(rel_path);

    if content_path.is_empty() {
        return true;
    }

    match rel_path.strip_prefix(content_path.as_str()) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Output file for a page, relative to the publish root.
///
/// `/` maps to `index.html`; any other pattern maps to
/// `<pattern>/index.html` after `:slug` substitution.
pub fn resolve_output_path(route: &Route, slug: &str) -> PathBuf {
    let expanded = expand_pattern(&route.output_pattern, slug);
    if expanded.is_empty() {
        PathBuf::from("index.html")
    } else {
        PathBuf::from(expanded).join("index.html")
    }
}

/// Site-relative URL of a page (`/` or `/writing/hello/`)
pub fn url_path(route: &Route, slug: &str) -> String {
    let expanded = expand_pattern(&route.output_pattern, slug);
    if expanded.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", expanded)
    }
}

fn expand_pattern(pattern: &str, slug: &str) -> String {
    pattern
        .replace(SLUG_PLACEHOLDER, slug)
        .trim_matches('/')
        .to_string()
}

/// `/`-joined path components with empty and `.` segments dropped,
/// so `.`, `./` and `` all name the content root
fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a slug is a single path segment that cannot leave its output
/// directory
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(|c| matches!(c, '/' | '\\'))
}
