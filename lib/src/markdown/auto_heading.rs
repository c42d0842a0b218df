use std::collections::VecDeque;
use std::fmt::Write;

use pulldown_cmark::{Event, Tag, TagEnd};
use rustc_hash::FxHashMap;

/// Gives every heading without an explicit id one derived from its text.
/// Repeated ids get a `-N` suffix.
pub struct AutoHeading<'a, I: Iterator<Item = Event<'a>>> {
    stack: VecDeque<Event<'a>>,
    seen: FxHashMap<String, usize>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> AutoHeading<'a, I> {
    pub fn new(inner: I) -> Self {
        AutoHeading {
            stack: VecDeque::with_capacity(4),
            seen: FxHashMap::default(),
            inner,
        }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for AutoHeading<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    if let Event::Text(ref s) | Event::Code(ref s) = event {
                        text.push_str(s);
                    } else if let Event::End(TagEnd::Heading(..)) = event {
                        break;
                    }

                    self.stack.push_back(event);
                }

                let mut id = crate::util::slugify(&text);
                let count = self.seen.entry(id.clone()).or_insert(0);
                if *count > 0 {
                    let _ = write!(&mut id, "-{}", count);
                }

                *count += 1;
                let tag = Tag::Heading { level, id: Some(id.into()), classes, attrs };
                self.stack.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(tag))
            },
            event => Some(event)
        }
    }
}
