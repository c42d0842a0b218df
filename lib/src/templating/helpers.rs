//! The helpers every page template can call.
//!
//! Arguments are positional. Optional arguments may be left off or passed as
//! `none`; most fall back to values in the render context, so that inside a
//! page `is_active_nav(link.uri)` compares against the page's own `dest`.

use std::path::Path;
use std::sync::Arc;

use minijinja::{Environment, Error, ErrorKind, State};
use minijinja::value::Value;
use serde_json::Value as Json;

use crate::config::Settings;
use crate::error::{Chainable, InvalidArgument};
use crate::markdown::{self, Markdown, Selector};
use crate::nav::{self, NavLink, NavResolver};
use crate::operations::Operations;

/// Set while a page is rendered to find its headings, so a page that lists
/// its own headings doesn't recurse.
const COLLECTING_HEADINGS: &str = "__collecting_headings";

struct Helpers {
    resolver: NavResolver,
    links: Vec<NavLink>,
    operations: Operations,
    draft: bool,
}

pub(super) fn register(env: &mut Environment<'static>, settings: &Settings) {
    let helpers = Arc::new(Helpers {
        resolver: settings.resolver(),
        links: settings.site.links.clone(),
        operations: settings.data.operations.clone(),
        draft: settings.site.draft,
    });

    let h = helpers.clone();
    env.add_function("is_active_nav", move |state: &State, uri: Option<String>, dest: Option<String>| {
        h.is_active_nav(state, uri, dest)
    });

    let h = helpers.clone();
    env.add_function("child_links", move |state: &State, m: Option<Value>, dest: Option<String>, links: Option<Value>| {
        h.child_links(state, m, dest, links)
    });

    let h = helpers.clone();
    env.add_function("operation", move |criteria: Value, property: Option<String>| {
        h.operation(criteria, property)
    });

    let h = helpers.clone();
    env.add_function("operation_uri", move |criteria: Value| h.operation_uri(criteria));

    let h = helpers;
    env.add_filter("draft", move |value: String| h.draft(&value));

    env.add_function("headings", headings);
    env.add_function("has_headings", has_headings);
    env.add_function("include", include);
    env.add_function("fragment", fragment);
    env.add_filter("with_mod", with_mod);
    env.add_filter("markdown", markdown);
    env.add_filter("json", json);
}

trait Ext {
    /// The string at the dotted path `key`, if there is one.
    fn find_str(self, key: &str) -> Option<String>;

    /// Like `find_str`, but it's an error for the value to be missing.
    fn require_str(self, key: &str) -> Result<String, Error>;
}

impl Ext for &State<'_, '_> {
    fn find_str(self, key: &str) -> Option<String> {
        let (base, rest) = key.split_once('.').unwrap_or((key, ""));
        let mut value = self.lookup(base)?;
        for attr in rest.split('.').filter(|a| !a.is_empty()) {
            value = value.get_attr(attr).ok()?;
        }

        value.as_str().map(String::from)
    }

    fn require_str(self, key: &str) -> Result<String, Error> {
        self.find_str(key).ok_or_else(|| Error::new(
            ErrorKind::MissingArgument,
            format!("expected string {key} in context but it wasn't found")
        ))
    }
}

fn invalid(error: InvalidArgument) -> Error {
    Error::new(ErrorKind::InvalidOperation, error.to_string()).with_source(error)
}

fn failed(error: crate::error::Error) -> Error {
    Error::new(ErrorKind::InvalidOperation, error.to_string())
}

/// A template value as JSON, for handing to the typed APIs.
fn to_json(value: &Value) -> Result<Json, Error> {
    serde_json::to_value(value).map_err(|e| Error::new(
        ErrorKind::InvalidOperation,
        format!("value cannot be represented as data: {e}")
    ))
}

/// An empty argument is treated as a missing one.
fn given(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn modulus(value: Option<Value>) -> Result<usize, Error> {
    let value = match value {
        Some(value) if !value.is_undefined() && !value.is_none() => value,
        _ => return Ok(0),
    };

    let kind = value.kind();
    i64::try_from(value)
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(InvalidArgument::new("mod", "a non-negative integer", kind)))
}

impl Helpers {
    fn dest(state: &State, dest: Option<String>) -> String {
        given(dest)
            .or_else(|| given(state.find_str("dest")))
            .or_else(|| given(state.find_str("page.dest")))
            .unwrap_or_default()
    }

    fn is_active_nav(&self, state: &State, uri: Option<String>, dest: Option<String>) -> bool {
        let uri = given(uri).or_else(|| state.find_str("uri")).unwrap_or_default();
        self.resolver.is_active(&Self::dest(state, dest), &uri)
    }

    fn child_links(
        &self,
        state: &State,
        m: Option<Value>,
        dest: Option<String>,
        links: Option<Value>,
    ) -> Result<Value, Error> {
        let m = modulus(m)?;
        let dest = Self::dest(state, dest);
        let links = match links.filter(|l| !l.is_undefined() && !l.is_none()) {
            Some(links) => NavLink::tree_from_json(&to_json(&links)?).map_err(invalid)?,
            None => return Ok(self.tagged_children(&dest, &self.links, m)),
        };

        Ok(self.tagged_children(&dest, &links, m))
    }

    fn tagged_children(&self, dest: &str, links: &[NavLink], m: usize) -> Value {
        let children = self.resolver.child_links(dest, links);
        Value::from_serializable(&nav::tag_with_mod(children, m))
    }

    fn operation(&self, criteria: Value, property: Option<String>) -> Result<Value, Error> {
        let criteria = to_json(&criteria)?;
        let map = criteria.as_object()
            .ok_or_else(|| invalid(InvalidArgument::new("criteria", "a map", nav::kind(&criteria))))?;

        let criteria = Operations::criteria(map).map_err(invalid)?;
        let found = self.operations.lookup(&criteria, given(property).as_deref());
        Ok(Value::from_serializable(&found))
    }

    fn operation_uri(&self, criteria: Value) -> Result<Value, Error> {
        let criteria = to_json(&criteria)?;
        let map = criteria.as_object()
            .ok_or_else(|| invalid(InvalidArgument::new("criteria", "a map", nav::kind(&criteria))))?;

        let criteria = Operations::criteria(map).map_err(invalid)?;
        Ok(self.operations.uri(&criteria).map_or(Value::UNDEFINED, Value::from))
    }

    fn draft(&self, value: &str) -> Value {
        if !self.draft {
            return Value::from("");
        }

        let html = markdown::render(value);
        Value::from_safe_string(format!(
            r#"<div class="draft"><div class="draft-title">Draft</div>{html}</div>"#
        ))
    }
}

pub fn with_mod(value: Value, m: Option<Value>) -> Result<Value, Error> {
    let m = modulus(m)?;
    let json = to_json(&value)?;
    let items = json.as_array()
        .ok_or_else(|| invalid(InvalidArgument::new("items", "a sequence", nav::kind(&json))))?;

    if m > 0 {
        if let Some((i, item)) = items.iter().enumerate().find(|(_, item)| !item.is_object()) {
            return Err(invalid(InvalidArgument::new(format!("items[{i}]"), "a map", nav::kind(item))));
        }
    }

    Ok(Value::from_serializable(&nav::tag_with_mod(items, m)))
}

pub fn json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|e| Error::new(
        ErrorKind::InvalidOperation,
        format!("failed to serialize value as JSON: {e}")
    ))
}

/// Renders markdown, but only for pages written in markdown.
pub fn markdown(state: &State, value: String) -> Value {
    match state.find_str("page.src") {
        Some(src) if crate::util::is_markdown_source(&src) => {
            Value::from_safe_string(markdown::render(&value))
        }
        _ => Value::from_safe_string(value),
    }
}

/// Reads `file` relative to the directory of the page being rendered.
pub fn include(state: &State, file: String) -> Result<Value, Error> {
    let src = state.require_str("page.src")?;
    let path = crate::util::parent_dir(Path::new(&src)).join(&file);
    let contents = std::fs::read_to_string(&path)
        .chain_with(|| error!("failed to include file", "path" => path.display()))
        .map_err(failed)?;

    tracing::debug!(path = %path.display(), "included file");
    Ok(Value::from_safe_string(contents))
}

/// The headings of a page, rendered first as a template and then as
/// markdown. The page defaults to the body of the page being rendered.
pub fn headings(state: &State, selector: Option<String>, page: Option<String>) -> Result<Value, Error> {
    let selector = Selector::parse(given(selector).as_deref().unwrap_or("h2")).map_err(invalid)?;
    if state.lookup(COLLECTING_HEADINGS).map_or(false, |v| v.is_true()) {
        return Ok(Value::from_serializable(&Vec::<markdown::Heading>::new()));
    }

    let source = match given(page) {
        Some(page) => page,
        None => state.require_str("page.body")?,
    };

    let source = match crate::util::is_template(&source) {
        true => state.env().render_str(&source, minijinja::context! {
            page => state.lookup("page"),
            dest => state.lookup("dest"),
            __collecting_headings => true,
        })?,
        false => source,
    };

    let headings = Markdown::from(&source).headings(selector);
    Ok(Value::from_serializable(&headings))
}

pub fn has_headings(state: &State, selector: Option<String>, page: Option<String>) -> Result<bool, Error> {
    let headings = headings(state, selector, page)?;
    Ok(headings.len().map_or(false, |n| n > 0))
}

pub fn fragment(name: String) -> Result<Value, Error> {
    crate::fragments::get(&name)
        .map(|f| Value::from_safe_string(f.html.to_string()))
        .ok_or_else(|| Error::new(ErrorKind::TemplateNotFound, format!("no fragment named {name}")))
}
