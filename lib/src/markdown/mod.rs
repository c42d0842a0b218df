//! Markdown to HTML, tuned for pages whose markdown is rendered more than
//! once.
//!
//! Pages may nest markdown blocks, so text that has already been rendered to
//! HTML can be fed through the renderer again. Indented HTML looks like a
//! code block to markdown, so code blocks are emitted verbatim (see
//! [`RawCode`]) instead of being escaped and wrapped in `<pre><code>`.

mod raw_code;
mod auto_heading;
mod headings;

pub use raw_code::*;
pub use auto_heading::*;
pub use headings::*;

use pulldown_cmark::{html, Event, Options, Parser};

#[derive(Debug, Clone)]
pub struct Markdown<'a> {
    input: &'a str,
    options: Options,
}

impl<'a> Markdown<'a> {
    pub fn from(input: &'a str) -> Self {
        Self {
            input,
            options: Options::all().difference(Options::ENABLE_SMART_PUNCTUATION),
        }
    }

    /// The event stream with code passed through raw and heading ids filled
    /// in.
    pub fn events(&self) -> impl Iterator<Item = Event<'a>> {
        let parser = Parser::new_ext(self.input, self.options);
        AutoHeading::new(RawCode::new(parser))
    }

    pub fn to_html(&self) -> String {
        let mut output = String::with_capacity(self.input.len() * 3 / 2);
        html::push_html(&mut output, self.events());
        output
    }

    /// Every heading of the rendered HTML matching `selector`, in document
    /// order.
    pub fn headings(&self, selector: Selector) -> Vec<Heading> {
        Headings::scan(&self.to_html(), selector)
    }
}

/// Renders `input` as markdown to HTML.
///
/// ```rust
/// let html = stache::markdown::render("# Hi\n\nSome *text*.");
/// assert_eq!(html, "<h1 id=\"hi\">Hi</h1>\n<p>Some <em>text</em>.</p>\n");
/// ```
pub fn render(input: &str) -> String {
    Markdown::from(input).to_html()
}
