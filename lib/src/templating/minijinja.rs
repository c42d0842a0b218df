use std::path::Path;

use minijinja::{Environment, path_loader};
use minijinja::value::Value;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{Chainable, Result};
use crate::fragments::FRAGMENTS;
use crate::page::Page;
use crate::templating::{helpers, Engine, EngineInit};

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

/// The per-render template context. Site settings and data are globals.
#[derive(Serialize)]
struct PageContext<'a> {
    page: &'a Page,
    dest: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
}

impl<'a> PageContext<'a> {
    fn new(page: &'a Page) -> Self {
        PageContext { page, dest: &page.dest, content: None }
    }
}

fn try_init(settings: &Settings, templates: Option<&Path>) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    if let Some(root) = templates {
        env.set_loader(path_loader(root));
    }

    for fragment in FRAGMENTS {
        env.add_template(fragment.name, fragment.template)
            .chain_with(|| error!("failed to register fragment", "name" => fragment.name))?;
    }

    for (name, value) in &settings.globals {
        env.add_global(name.clone(), Value::from_serializable(value));
    }

    env.add_global("site", Value::from_serializable(&settings.site));
    env.add_global("data", Value::from_serializable(&settings.data));
    helpers::register(&mut env, settings);
    Ok(env)
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init(settings: &Settings, templates: Option<&Path>) -> Result<Self::Engine> {
        Ok(MiniJinjaEngine { env: try_init(settings, templates)? })
    }
}

impl Engine for MiniJinjaEngine {
    fn render_page(&self, page: &Page) -> Result<String> {
        tracing::debug!(src = %page.src, dest = %page.dest, "rendering page");
        self.render_str(Some(&page.src), &page.body, page)
    }

    fn render_layout(&self, name: &str, page: &Page, content: &str) -> Result<String> {
        let template = self.env.get_template(name)
            .chain_with(|| error!("layout template not found", "name" => name))?;

        let context = PageContext {
            content: Some(Value::from_safe_string(content.to_string())),
            ..PageContext::new(page)
        };

        template.render(context).chain_with(|| error! {
            "failed to render layout",
            "layout" => name,
            "page" => &page.src,
        })
    }

    fn render_str(&self, name: Option<&str>, template_str: &str, page: &Page) -> Result<String> {
        let context = PageContext::new(page);
        let string = match name {
            Some(name) => self.env.render_named_str(name, template_str, context),
            None => self.env.render_str(template_str, context),
        };

        string.chain_with(|| error! {
            "failed to render template",
            "page" => &page.src,
        })
    }
}

crate::error::impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    static_assertions::assert_impl_all!(MiniJinjaEngine: Send, Sync);

    const SETTINGS: &str = r#"
        footer = "© Example"

        [site]
        base = "/site"
        app_build = "/build"

        [[site.links]]
        name = "Home"
        uri = ""

        [[site.links]]
        name = "Docs"
        uri = "/docs"

        [[site.links.links]]
        name = "Guides"
        uri = "/docs/guides"

        [[site.links.links]]
        name = "API"
        uri = "/docs/api"

        [[site.links.links]]
        name = "FAQ"
        uri = "/docs/faq"
    "#;

    fn engine() -> MiniJinjaEngine {
        let settings = Settings::from_toml(SETTINGS).unwrap();
        MiniJinjaEngine::init(&settings, None).unwrap()
    }

    fn render(template: &str) -> String {
        let page = Page::new("content/docs/index.md", "/build/docs/index.html", template);
        engine().render_page(&page).unwrap()
    }

    #[test]
    fn globals_and_page_are_in_context() {
        assert_eq!(render("{{ dest }}|{{ page.src }}|{{ site.base }}|{{ footer }}"),
            "/build/docs/index.html|content/docs/index.md|/site|© Example");
    }

    #[test]
    fn navigation_menu() {
        let template = "{% for link in site.links %}\
            {% if is_active_nav(link.uri) %}[{{ link.name }}]{% else %}{{ link.name }}{% endif %} \
            {% endfor %}";

        assert_eq!(render(template), "Home [Docs] ");
    }

    #[test]
    fn layouts_receive_rendered_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<main>{{ content }}</main>").unwrap();

        let settings = Settings::from_toml(SETTINGS).unwrap();
        let engine = MiniJinjaEngine::init(&settings, Some(dir.path())).unwrap();
        let page = Page::new("content/a.md", "/build/a/index.html", "<b>{{ site.base }}</b>");
        let content = engine.render_page(&page).unwrap();
        let html = engine.render_layout("page.html", &page, &content).unwrap();
        assert_eq!(html, "<main><b>/site</b></main>");
    }

    #[test]
    fn missing_layouts_are_reported() {
        let page = Page::new("content/a.md", "/build/a/index.html", "");
        let error = engine().render_layout("nope.html", &page, "").unwrap_err();
        assert!(error.to_string().contains("layout template not found"));
    }

    #[test]
    fn fragments_are_included_verbatim() {
        let html = render(r#"{% include "/assets/vendor/bb-omnibar-search/templates/bb-omnibar-search.hbs" %}"#);
        assert!(html.contains("{{ ctrl.messages.searching }}"));
        assert_eq!(html, crate::fragments::FRAGMENTS[0].html);
    }

    #[test]
    fn template_errors_name_the_page() {
        let page = Page::new("content/broken.md", "/build/broken.html", "{% if %}");
        let error = engine().render_page(&page).unwrap_err().to_string();
        assert!(error.contains("failed to render template"));
        assert!(error.contains("content/broken.md"));
    }
}
