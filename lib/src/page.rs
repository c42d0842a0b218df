use std::path::Path;

use serde::Serialize;

use crate::error::{Chainable, Result};

/// The page being rendered: where it came from, where it's going, and its
/// raw, unrendered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub src: String,
    pub dest: String,
    pub body: String,
}

impl Page {
    pub fn new<S, D, B>(src: S, dest: D, body: B) -> Self
        where S: Into<String>, D: Into<String>, B: Into<String>
    {
        Page { src: src.into(), dest: dest.into(), body: body.into() }
    }

    /// Reads the page at `src`. Without a `dest`, the page is destined for
    /// `src` with an `.html` extension.
    pub fn read<P: AsRef<Path>>(src: P, dest: Option<&str>) -> Result<Self> {
        let src = src.as_ref();
        let body = std::fs::read_to_string(src).chain_with(|| error! {
            "failed to read page",
            "path" => src.display(),
        })?;

        let dest = match dest {
            Some(dest) => dest.to_string(),
            None => src.with_extension("html").to_string_lossy().into_owned(),
        };

        Ok(Page::new(src.to_string_lossy(), dest, body))
    }
}
