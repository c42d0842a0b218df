//! Precompiled HTML fragments served verbatim.
//!
//! Fragments belong to client-side widgets and contain the widget's own
//! `{{ ... }}` bindings, so they must never be interpreted as templates.
//! Each is registered with the engine wrapped in a raw block under its
//! name, and is available directly via [`get()`].

use derive_more::Debug;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

#[derive(Debug)]
pub struct Fragment {
    pub name: &'static str,
    #[debug(ignore)]
    pub html: &'static str,
    /// `html` inside a raw block, ready to be added as a template.
    #[debug(ignore)]
    pub template: &'static str,
}

macro_rules! fragments {
    ($($name:literal => $file:literal),* $(,)?) => (
        &[$(
            Fragment {
                name: $name,
                html: include_str!($file),
                template: concat!("{% raw %}", include_str!($file), "{% endraw %}"),
            }
        ),*]
    );
}

pub static FRAGMENTS: &[Fragment] = fragments! {
    "/assets/vendor/bb-omnibar-search/templates/bb-omnibar-search.hbs" => "omnibar-search.html",
};

static INDEX: Lazy<FxHashMap<&'static str, &'static Fragment>> = Lazy::new(|| {
    FRAGMENTS.iter().map(|f| (f.name, f)).collect()
});

pub fn get(name: &str) -> Option<&'static Fragment> {
    INDEX.get(name).copied()
}
