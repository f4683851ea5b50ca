//! Tera template registry
//!
//! Templates are loaded from the site's template directory in three layers:
//! the optional base layout, every partial, then each route's page template.
//! Page templates may `{% extends %}` the base and `{% include %}` partials
//! by their path relative to the template directory (`partials/nav.tmpl`).
//!
//! Every template is autoescaped. `content` is already rendered HTML, so
//! templates print it with `{{ content | safe }}`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Metadata;
use crate::error::{BuildError, Result, TemplateLayer};
use crate::helpers;
use crate::routes::RouteTable;

/// Template renderer over the site's own templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Load base, partials and every route's page template from `template_dir`
    pub fn load(template_dir: &Path, config: &SiteConfig, routes: &RouteTable) -> Result<Self> {
        let mut tera = Tera::default();

        // "" is a suffix of every template name
        tera.autoescape_on(vec![""]);
        tera.set_escape_fn(helpers::html_escape);
        register_helpers(&mut tera);

        if !config.base_template_path.is_empty() {
            let name = config.base_template_path.as_str();
            add_file(&mut tera, &template_dir.join(name), name, TemplateLayer::Base)?;
        }

        let partials = template_dir.join(&config.partials_dir);
        let pattern = partials.join(format!("*{}", config.template_ext));
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| BuildError::Template {
            layer: TemplateLayer::Partial,
            name: pattern.to_string(),
            source: tera::Error::msg(e.to_string()),
        })?;
        let mut partial_count = 0;
        for entry in entries {
            let path = entry.map_err(|e| BuildError::io(e.path().to_path_buf(), e.into_error()))?;
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = format!("{}/{}", config.partials_dir.trim_matches('/'), file_name);
            add_file(&mut tera, &path, &name, TemplateLayer::Partial)?;
            partial_count += 1;
        }
        if partial_count == 0 {
            tracing::debug!("No partials matched {}", pattern);
        }

        let mut seen = HashSet::new();
        for (_, route) in routes.iter() {
            let name = route.template.as_str();
            if !seen.insert(name) {
                continue;
            }
            add_file(&mut tera, &template_dir.join(name), name, TemplateLayer::Page)?;
        }

        tracing::debug!(
            "Loaded {} templates ({} partials)",
            tera.get_template_names().count(),
            partial_count
        );
        Ok(Self { tera })
    }

    /// Render a loaded template with the given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(template_name, context)
            .map_err(|e| BuildError::Template {
                layer: TemplateLayer::Render,
                name: template_name.to_string(),
                source: e,
            })
    }
}

fn add_file(tera: &mut Tera, path: &Path, name: &str, layer: TemplateLayer) -> Result<()> {
    tera.add_template_file(path, Some(name))
        .map_err(|e| BuildError::Template {
            layer,
            name: name.to_string(),
            source: e,
        })
}

fn register_helpers(tera: &mut Tera) {
    tera.register_function("link_item", link_item_fn);
    tera.register_function("get_str", get_str_fn);
    tera.register_function("writing_items", writing_items_fn);
    tera.register_function("format_date", format_date_fn);
    tera.register_filter("format_date", format_date_filter);
}

fn required_arg<'a>(
    helper: &str,
    args: &'a HashMap<String, tera::Value>,
    key: &str,
) -> tera::Result<&'a tera::Value> {
    args.get(key).ok_or_else(|| {
        tera::Error::msg(format!("Function `{}` was called without a `{}` argument", helper, key))
    })
}

/// Tera function: `link_item(link="/about/", title="About")`
fn link_item_fn(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let link = tera::from_value::<String>(required_arg("link_item", args, "link")?.clone())?;
    let title = tera::from_value::<String>(required_arg("link_item", args, "title")?.clone())?;
    Ok(tera::to_value(helpers::link_item(&link, &title))?)
}

/// Tera function: `get_str(map=metadata, key="title")`
fn get_str_fn(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let map = required_arg("get_str", args, "map")?;
    let key = tera::from_value::<String>(required_arg("get_str", args, "key")?.clone())?;
    Ok(tera::Value::String(helpers::get_str(map, &key)))
}

/// Tera function: `writing_items(pages=all_pages["writing"])`
fn writing_items_fn(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let pages = match required_arg("writing_items", args, "pages")? {
        tera::Value::Null => Vec::new(),
        value => tera::from_value::<Vec<PageInfo>>(value.clone())?,
    };
    Ok(tera::to_value(helpers::writing_items(&pages))?)
}

/// Tera function: `format_date(date="2006-01-02")`
fn format_date_fn(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let date = tera::from_value::<String>(required_arg("format_date", args, "date")?.clone())?;
    Ok(tera::Value::String(helpers::format_date(&date)))
}

/// Tera filter: `{{ metadata.date | format_date }}`
fn format_date_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("format_date", "value", String, value);
    Ok(tera::Value::String(helpers::format_date(&s)))
}

// Data structures for template context

/// Route content path → that route's pages, newest first
pub type Listing = BTreeMap<String, Vec<PageInfo>>;

/// One entry of `all_pages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub metadata: Metadata,
    pub slug: String,
    /// `YYYY-MM-DD`, empty when the page has no parsable date
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub link: String,
}

/// Site-wide values exposed as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub url: String,
    pub copyright: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.rss.title.clone(),
            description: config.rss.description.clone(),
            url: config.rss.url.clone(),
            copyright: config.copyright.clone(),
        }
    }
}

/// Per-page values exposed as `page`
#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub url: String,
    pub slug: String,
    pub source: String,
    pub read_time: u64,
}
