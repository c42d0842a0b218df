use memchr::memmem;
use serde::Serialize;

use crate::error::InvalidArgument;

/// A heading's text and anchor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub name: String,
    pub id: String,
}

/// The heading tags to collect: one or more of `h1`..`h6`, separated by
/// commas, as in `"h2"` or `"h2, h3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector([bool; 6]);

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, InvalidArgument> {
        let invalid = || InvalidArgument::new("selector", "heading tags `h1`..`h6`", selector);

        let mut levels = [false; 6];
        for tag in selector.split(',').map(str::trim) {
            let n = tag.strip_prefix(|c: char| c == 'h' || c == 'H')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=6).contains(n))
                .ok_or_else(invalid)?;

            levels[n - 1] = true;
        }

        Ok(Selector(levels))
    }

    pub fn matches(&self, level: u8) -> bool {
        (1..=6).contains(&level) && self.0[level as usize - 1]
    }
}

pub struct Headings;

impl Headings {
    /// Every heading in `html` selected by `selector`, in document order.
    ///
    /// Headings are read from the HTML itself, so those that arrived as raw
    /// HTML (includes, nested blocks) are found along with markdown ones.
    /// A heading's name is its text with tags removed and entities decoded.
    pub fn scan(html: &str, selector: Selector) -> Vec<Heading> {
        // ASCII lowercasing keeps byte offsets, so tags are matched on
        // `lower` and sliced out of `html`.
        let lower = html.to_ascii_lowercase();
        let bytes = lower.as_bytes();

        let mut headings = vec![];
        let mut pos = 0;
        while let Some(i) = memchr::memchr(b'<', &bytes[pos..]).map(|i| pos + i) {
            pos = i + 1;
            let Some(level) = heading_level(&bytes[i..]) else { continue };
            let Some(open_end) = tag_end(bytes, i) else { break };
            pos = open_end + 1;
            if !selector.matches(level) {
                continue;
            }

            let close = format!("</h{level}");
            let Some(close_at) = memmem::find(&bytes[pos..], close.as_bytes()).map(|c| pos + c) else {
                break;
            };

            headings.push(Heading {
                name: text_of(&html[pos..close_at]),
                id: attribute(&html[i..open_end], &lower[i..open_end], "id").unwrap_or_default(),
            });

            pos = close_at + close.len();
        }

        headings
    }
}

/// The level of the heading tag `tag` opens, if it opens one.
fn heading_level(tag: &[u8]) -> Option<u8> {
    match tag {
        [b'<', b'h', n @ b'1'..=b'6', end, ..] if end.is_ascii_whitespace() || matches!(end, b'>' | b'/') => {
            Some(n - b'0')
        }
        _ => None,
    }
}

/// The index of the `>` closing the tag opened at `start`, skipping quoted
/// attribute values.
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            _ => {}
        }
    }

    None
}

/// The value of attribute `name` in the open tag `tag`. `lower` is `tag`
/// lowercased.
fn attribute(tag: &str, lower: &str, name: &str) -> Option<String> {
    let bytes = lower.as_bytes();
    let needle = format!("{name}=");
    let mut from = 0;
    while let Some(at) = memmem::find(&bytes[from..], needle.as_bytes()).map(|a| from + a) {
        from = at + needle.len();
        if at == 0 || !bytes[at - 1].is_ascii_whitespace() {
            continue;
        }

        let value = &tag[from..];
        let value = match value.as_bytes().first() {
            Some(&q @ (b'"' | b'\'')) => value[1..].split(q as char).next(),
            _ => value.split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/').next(),
        };

        return value.map(decode_entities);
    }

    None
}

/// Text content of an HTML fragment.
fn text_of(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn heading(name: &str, id: &str) -> Heading {
        Heading { name: name.into(), id: id.into() }
    }

    #[test]
    fn selectors() {
        let h2 = Selector::parse("h2").unwrap();
        assert!(h2.matches(2));
        assert!(!h2.matches(3));

        let some = Selector::parse("H3, h6").unwrap();
        assert!(some.matches(3) && some.matches(6) && !some.matches(2));

        assert_eq!(Selector::parse("h7").unwrap_err().argument, "selector");
        assert!(Selector::parse("div").is_err());
        assert!(Selector::parse("h").is_err());
        assert!(Selector::parse("h2,").is_err());
    }

    #[test]
    fn scan_finds_markdown_and_raw_headings() {
        let html = "<h2 id=\"inc\">Included</h2>\n<h1>Top</h1>\n\
            <H2 class='x' ID='md'>Md <code>code</code></H2>\n<h3 id=\"no\">Nope</h3>";

        let headings = Headings::scan(html, Selector::parse("h2").unwrap());
        assert_eq!(headings, vec![heading("Included", "inc"), heading("Md code", "md")]);
    }

    #[test]
    fn scan_decodes_text_and_tolerates_missing_ids() {
        let html = r#"<h2 data-x="a>b">Q &amp; A</h2><h2 >Plain</h2><header>not one</header>"#;
        let headings = Headings::scan(html, Selector::parse("h2").unwrap());
        assert_eq!(headings, vec![heading("Q & A", ""), heading("Plain", "")]);
    }

    #[test]
    fn scan_unclosed_heading_stops() {
        let html = "<h2 id=\"a\">A</h2><h2 id=\"b\">never closed";
        let headings = Headings::scan(html, Selector::parse("h2").unwrap());
        assert_eq!(headings, vec![heading("A", "a")]);
    }
}
