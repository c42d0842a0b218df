#![doc = svgbobdoc::transform!(
//! Template helpers for static sites.
//!
//! # Overview
//!
//! Stache renders pages of a static site through [minijinja] templates and
//! gives those templates helpers for the things every page of a
//! documentation portal needs: a navigation menu that knows where it is,
//! markdown blocks, includes, and lookups into site data.
//!
//! Navigation is a tree of links kept in the site settings:
//!
//! ```svgbob
//!        +------+     +------+     +-----------+
//!        | Home |     | Docs |     | Changelog |
//!        +------+     +--+---+     +-----------+
//!                        |
//!          +-------------+-------------+
//!          |             |             |
//!     +----+---+    +----+---+    +----+---+
//!     | Guides |    |  API   |    |  FAQ   |
//!     +--------+    +--------+    +--------+
//! ```
//!
//! A link is _active_ when the page being rendered lives under it. Paths are
//! compared after [normalization](nav::NavResolver::normalize), which strips
//! the site's base path, its build directory, and `index` file names. The
//! first active link in pre-order decides which links
//! [`child_links`](nav::NavResolver::child_links) offers a section menu.
//!
//! ## Rendering
//!
//! 1. [`Settings`](config::Settings) are read once, from TOML or JSON.
//! 2. A [`MiniJinjaEngine`](templating::minijinja::MiniJinjaEngine) is
//!    initialized with the settings and, optionally, a layout directory.
//! 3. Each [`Page`](page::Page) is rendered as a template, then into its
//!    layout with the rendered page as `content`.
//!
//! The helpers available to templates are listed in [`templating`].
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod nav;
pub mod operations;
pub mod markdown;
pub mod fragments;
pub mod templating;
pub mod config;
pub mod page;

pub use config::Settings;
pub use nav::{NavLink, NavResolver};
pub use page::Page;
pub use templating::{Engine, EngineInit};
pub use templating::minijinja::MiniJinjaEngine;
