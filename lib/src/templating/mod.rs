//! Template engines and the helpers they register.
//!
//! Every page is rendered with `page` (its `src`, `dest` and `body`) and
//! `dest` in context; site settings are globals (`site`, `data`, and any
//! other top-level table). Layouts additionally see `content`, the rendered
//! page. The helpers:
//!
//! | helper                               | kind     | result                                   |
//! |--------------------------------------|----------|------------------------------------------|
//! | `is_active_nav(uri?, dest?)`         | function | whether `uri` is the current page        |
//! | `child_links(mod?, dest?, links?)`   | function | children of the active link              |
//! | `with_mod(mod)`                      | filter   | items tagged with row position flags     |
//! | `json`                               | filter   | the value as compact JSON                |
//! | `markdown`                           | filter   | markdown as HTML, on markdown pages only |
//! | `draft`                              | filter   | the block, when the site shows drafts    |
//! | `include(file)`                      | function | a file next to the page, verbatim        |
//! | `headings(selector?, page?)`         | function | `{ name, id }` of each heading           |
//! | `has_headings(selector?, page?)`     | function | whether there are any                    |
//! | `operation(criteria, property?)`     | function | matching operations from `data`          |
//! | `operation_uri(criteria)`            | function | the docs URI of the matching operation   |
//! | `fragment(name)`                     | function | a precompiled HTML fragment              |

pub mod minijinja;
mod helpers;

use std::fmt::Debug;
use std::path::Path;

use crate::config::Settings;
use crate::error::Result;
use crate::page::Page;

pub trait EngineInit {
    type Engine: Engine + 'static;

    /// Builds an engine with every helper registered. Templates are loaded
    /// by name from `templates`, if given.
    fn init(settings: &Settings, templates: Option<&Path>) -> Result<Self::Engine>;
}

pub trait Engine: Send + Sync + Debug {
    /// Renders the page's own body as a template.
    fn render_page(&self, page: &Page) -> Result<String>;

    /// Renders the template `name` for `page`, with the already rendered page
    /// available as `content`.
    fn render_layout(&self, name: &str, page: &Page, content: &str) -> Result<String>;

    /// Renders `template_str` for `page`.
    fn render_str(&self, name: Option<&str>, template_str: &str, page: &Page) -> Result<String>;
}
