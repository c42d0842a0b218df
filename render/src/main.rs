//! Renders one page of a site through the stache helpers.
//!
//! ```text
//! stache-render site.toml content/docs/index.md --template page.html --templates templates
//! ```

use std::path::Path;

use stache::{Engine, EngineInit, MiniJinjaEngine, Page, Settings};
use stache::error::{Chainable, Result};
use tracing_subscriber::EnvFilter;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Render a page as a template, optionally into a layout.
        cmd stache-render {
            /// Site settings, TOML or JSON.
            required config: PathBuf
            /// The page to render.
            required page: PathBuf
            /// Where the page will be published. Defaults to the page with
            /// an `.html` extension.
            optional --dest dest: String
            /// Layout template to render the page into.
            optional --template template: String
            /// Directory layout templates are loaded from.
            optional --templates templates: PathBuf
            /// Write the output here instead of stdout.
            optional -o, --output output: PathBuf
            /// Log debug information.
            optional -v, --verbose
        }
    }
}

fn run(flags: &flags::StacheRender) -> Result<()> {
    let settings = Settings::read(&flags.config)?;
    let engine = MiniJinjaEngine::init(&settings, flags.templates.as_deref())?;
    let page = Page::read(&flags.page, flags.dest.as_deref())?;

    let mut html = engine.render_page(&page)?;
    if let Some(layout) = &flags.template {
        html = engine.render_layout(layout, &page, &html)?;
    }

    match &flags.output {
        Some(path) => write(path, &html),
        None => {
            print!("{html}");
            Ok(())
        }
    }
}

fn write(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).chain_with(|| stache::error! {
            "failed to create output directory",
            "path" => parent.display(),
        })?;
    }

    std::fs::write(path, html).chain_with(|| stache::error! {
        "failed to write output",
        "path" => path.display(),
    })?;

    tracing::info!(path = %path.display(), bytes = html.len(), "wrote page");
    Ok(())
}

fn main() {
    let flags = flags::StacheRender::from_env_or_exit();

    let filter = if flags.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&flags) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
