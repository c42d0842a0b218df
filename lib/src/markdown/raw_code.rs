use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

/// Replaces every code block with its literal text as raw HTML.
pub struct RawCode<'a, I> {
    inner: I,
    code: Option<String>,
    _events: std::marker::PhantomData<Event<'a>>,
}

impl<'a, I: Iterator<Item = Event<'a>>> RawCode<'a, I> {
    pub fn new(inner: I) -> Self {
        RawCode { inner, code: None, _events: std::marker::PhantomData }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for RawCode<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Event::Start(Tag::CodeBlock(_)) => self.code = Some(String::new()),
                Event::Text(text) if self.code.is_some() => {
                    if let Some(code) = self.code.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => match self.code.take() {
                    Some(code) if !code.is_empty() => return Some(Event::Html(CowStr::from(code))),
                    _ => continue,
                },
                event => return Some(event),
            }
        }
    }
}
