//! Active navigation link resolution.
//!
//! A site's navigation is a tree of [`NavLink`]s. While a page is rendered,
//! templates ask which link, if any, corresponds to that page. Paths are
//! compared after [normalization](NavResolver::normalize), which strips the
//! site base, the build output directory, any extension and an `index`
//! token, so that `/site/docs/index.html` and `/docs` are comparable.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::InvalidArgument;

/// Pass-through fields of a navigation entry (`name`, `icon`, ...).
pub type Fields = Map<String, Json>;

/// One entry in a site's navigation menu.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavLink {
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<NavLink>>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NavLink {
    pub fn new(uri: &str) -> Self {
        NavLink { uri: uri.into(), links: None, fields: Fields::new() }
    }

    pub fn with_links(mut self, links: Vec<NavLink>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_field<V: Into<Json>>(mut self, key: &str, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The nested links, or `None` if this entry is a leaf.
    pub fn children(&self) -> Option<&[NavLink]> {
        self.links.as_deref()
    }

    /// Reads a navigation tree out of loosely typed data, checking every
    /// node on the way: the tree must be a sequence of maps whose `uri`, if
    /// present, is a string and whose `links`, if present, is a sequence.
    pub fn tree_from_json(value: &Json) -> Result<Vec<NavLink>, InvalidArgument> {
        fn parse_seq(path: &str, value: &Json) -> Result<Vec<NavLink>, InvalidArgument> {
            let seq = value.as_array()
                .ok_or_else(|| InvalidArgument::new(path, "a sequence of links", kind(value)))?;

            seq.iter()
                .enumerate()
                .map(|(i, node)| parse_node(&format!("{path}[{i}]"), node))
                .collect()
        }

        fn parse_node(path: &str, value: &Json) -> Result<NavLink, InvalidArgument> {
            let map = value.as_object()
                .ok_or_else(|| InvalidArgument::new(path, "a link map", kind(value)))?;

            let mut link = NavLink::default();
            for (key, value) in map {
                match key.as_str() {
                    "uri" => match value {
                        Json::String(s) => link.uri = s.clone(),
                        Json::Null => {},
                        _ => return Err(InvalidArgument::new(
                            format!("{path}.uri"), "a string", kind(value)
                        )),
                    },
                    "links" if value.is_null() => {},
                    "links" => link.links = Some(parse_seq(&format!("{path}.links"), value)?),
                    _ => { link.fields.insert(key.clone(), value.clone()); }
                }
            }

            Ok(link)
        }

        parse_seq("links", value)
    }
}

pub(crate) fn kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "none",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "sequence",
        Json::Object(_) => "map",
    }
}

/// Resolves the active link in a navigation tree.
#[derive(Debug, Clone, Default)]
pub struct NavResolver {
    base: String,
    app_build: String,
}

impl NavResolver {
    /// `base` is the site's base path, `app_build` its build output path.
    /// Both are removed from paths before comparison.
    pub fn new(base: &str, app_build: &str) -> Self {
        NavResolver { base: base.into(), app_build: app_build.into() }
    }

    /// Reduces `path` to a comparable form.
    ///
    /// Everything from the last `.` on is dropped, then the first occurrence
    /// of the site base, of the build output path and of `index` is removed,
    /// in that order. The removals are substring removals, not prefix strips.
    ///
    /// ```rust
    /// use stache::nav::NavResolver;
    ///
    /// let nav = NavResolver::new("/site", "/build");
    /// assert_eq!(nav.normalize("/site/docs/index.html", true), "/docs/");
    /// assert_eq!(nav.normalize("/build/docs/api.html", true), "/docs/api");
    /// assert_eq!(nav.normalize("/site/docs/index.html", false), "");
    /// ```
    pub fn normalize(&self, path: &str, clean: bool) -> String {
        if !clean || path.is_empty() {
            return String::new();
        }

        let stem = path.rfind('.').map_or(path, |dot| &path[..dot]);
        [&*self.base, &*self.app_build, "index"].iter()
            .filter(|token| !token.is_empty())
            .fold(stem.to_string(), |path, token| path.replacen(token, "", 1))
    }

    /// Whether the navigation entry `uri` is the page at `dest`.
    ///
    /// A non-empty normalized `uri` matches any `dest` whose normalized form
    /// contains it. An empty normalized `uri` (the home page) only matches an
    /// empty normalized `dest`.
    pub fn is_active(&self, dest: &str, uri: &str) -> bool {
        let dest = self.normalize(dest, true);
        let uri = self.normalize(uri, true);
        if uri.is_empty() {
            dest.is_empty()
        } else {
            dest.contains(&*uri)
        }
    }

    /// Finds the first active link in pre-order: each link is checked before
    /// its children, and an earlier link's subtree is exhausted before a later
    /// sibling is checked.
    pub fn find_active<'a>(&self, dest: &str, links: &'a [NavLink]) -> Option<&'a NavLink> {
        for link in links {
            if self.is_active(dest, &link.uri) {
                tracing::trace!(dest, uri = &*link.uri, "active navigation link");
                return Some(link);
            }

            if let Some(found) = link.children().and_then(|c| self.find_active(dest, c)) {
                return Some(found);
            }
        }

        None
    }

    /// The children of the active link. Empty when no link is active or the
    /// active link is a leaf.
    pub fn child_links<'a>(&self, dest: &str, links: &'a [NavLink]) -> &'a [NavLink] {
        let children = self.find_active(dest, links)
            .and_then(|active| active.children())
            .unwrap_or(&[]);

        tracing::debug!(dest, count = children.len(), "resolved child links");
        children
    }
}

/// Position flags for laying items out in rows of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModFlags {
    pub first: bool,
    pub last: bool,
    pub mod_zero: bool,
    pub mod_last: bool,
    pub first_or_mod_zero: bool,
    pub last_or_mod_last: bool,
}

/// An item paired with its [`ModFlags`].
///
/// Serializes as the item's own fields followed by the flags, so a tagged
/// item must serialize as a map. Untagged items serialize as themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub item: T,
    pub flags: Option<ModFlags>,
}

impl<T: Serialize> Serialize for Tagged<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a, T> {
            #[serde(flatten)]
            item: &'a T,
            #[serde(flatten)]
            flags: &'a ModFlags,
        }

        match &self.flags {
            Some(flags) => Flat { item: &self.item, flags }.serialize(serializer),
            None => self.item.serialize(serializer),
        }
    }
}

/// Tags every item with its position relative to the start and end of the
/// sequence and of each run of `modulus` items. A `modulus` of `0` tags
/// nothing.
///
/// ```rust
/// use stache::nav::tag_with_mod;
///
/// let tagged = tag_with_mod(vec!['a', 'b', 'c', 'd'], 2);
/// let row_starts: Vec<_> = tagged.iter()
///     .filter(|t| t.flags.map_or(false, |f| f.first_or_mod_zero))
///     .map(|t| t.item)
///     .collect();
///
/// assert_eq!(row_starts, ['a', 'c']);
/// ```
pub fn tag_with_mod<T, I>(items: I, modulus: usize) -> Vec<Tagged<T>>
    where I: IntoIterator<Item = T>, I::IntoIter: ExactSizeIterator
{
    let items = items.into_iter();
    let n = items.len();
    items.enumerate()
        .map(|(i, item)| {
            let flags = (modulus > 0).then(|| {
                let (first, last) = (i == 0, i + 1 == n);
                let (mod_zero, mod_last) = (i % modulus == 0, i % modulus == modulus - 1);
                ModFlags {
                    first,
                    last,
                    mod_zero,
                    mod_last,
                    first_or_mod_zero: first || mod_zero,
                    last_or_mod_last: last || mod_last,
                }
            });

            Tagged { item, flags }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver() -> NavResolver {
        NavResolver::new("/site", "/build")
    }

    #[test]
    fn normalize_unclean_or_empty_is_empty() {
        let nav = resolver();
        for path in ["", "/site/docs/index.html", "x"] {
            assert_eq!(nav.normalize(path, false), "");
        }

        assert_eq!(nav.normalize("", true), "");
    }

    #[test]
    fn normalize_strips_tokens_once_in_order() {
        let nav = resolver();
        assert_eq!(nav.normalize("/site/docs/index.html", true), "/docs/");
        assert_eq!(nav.normalize("/docs", true), "/docs");
        assert_eq!(nav.normalize("/build/index.html", true), "/");
        assert_eq!(nav.normalize("/site/site/a.b.html", true), "/site/a.b");
        assert_eq!(nav.normalize("docs/indexindex", true), "docs/index");
        assert_eq!(nav.normalize("/v1.2/guide", true), "/v1");
    }

    #[test]
    fn normalize_is_idempotent_on_clean_paths() {
        let nav = resolver();
        for path in ["/docs/", "/guides/getting-started", "", "/"] {
            let once = nav.normalize(path, true);
            assert_eq!(nav.normalize(&once, true), once);
        }
    }

    #[test]
    fn normalize_without_base_or_build() {
        let nav = NavResolver::default();
        assert_eq!(nav.normalize("/docs/index.html", true), "/docs/");
    }

    #[test]
    fn empty_uri_only_matches_home() {
        let nav = resolver();
        assert!(nav.is_active("index.html", ""));
        assert!(nav.is_active("/siteindex.html", "index.html"));
        assert!(!nav.is_active("/site/index.html", "index.html"));
        assert!(!nav.is_active("/site/docs/index.html", ""));
        assert!(!nav.is_active("/site/docs/index.html", "index.html"));

        // The leading separator survives normalization, so this isn't empty.
        assert_eq!(nav.normalize("/site/index.html", true), "/");
        assert!(!nav.is_active("/site/index.html", ""));
    }

    #[test]
    fn uri_matches_by_substring() {
        let nav = resolver();
        assert!(nav.is_active("/site/docs/index.html", "/docs"));
        assert!(nav.is_active("/site/docs/api/index.html", "/docs"));
        assert!(!nav.is_active("/site/blog/index.html", "/docs"));

        // Substring, not prefix: an unrelated path containing the uri matches.
        assert!(nav.is_active("/site/my/docs-archive/index.html", "/docs"));
    }

    #[test]
    fn find_active_in_empty_tree() {
        assert!(resolver().find_active("/site/docs/index.html", &[]).is_none());
    }

    #[test]
    fn find_active_prefers_own_match_over_children() {
        let links = vec![
            NavLink::new("/docs").with_links(vec![NavLink::new("/docs/api")]),
        ];

        let found = resolver().find_active("/site/docs/api/index.html", &links).unwrap();
        assert!(std::ptr::eq(found, &links[0]));
    }

    #[test]
    fn find_active_descends_in_pre_order() {
        let links = vec![
            NavLink::new("/x"),
            NavLink::new("/guides").with_links(vec![
                NavLink::new("/guides/a"),
                NavLink::new("/guides/b").with_links(vec![NavLink::new("/deep")]),
            ]),
            NavLink::new("/deep"),
        ];

        let found = resolver().find_active("/site/deep/index.html", &links).unwrap();
        assert!(std::ptr::eq(found, &links[1].links.as_ref().unwrap()[1].links.as_ref().unwrap()[0]));
    }

    #[test]
    fn find_active_exhausts_earlier_subtrees_before_later_siblings() {
        // [A(uri=X, links=[C(uri=Y)]), B(uri=Y)]: A's subtree is searched
        // before B is visited, so C wins.
        let links = vec![
            NavLink::new("/x").with_links(vec![NavLink::new("/y").with_field("name", "C")]),
            NavLink::new("/y").with_field("name", "B"),
        ];

        let found = resolver().find_active("/site/y/index.html", &links).unwrap();
        assert!(std::ptr::eq(found, &links[0].links.as_ref().unwrap()[0]));

        // Once A's subtree has no match, B is found.
        let links = vec![
            NavLink::new("/x").with_links(vec![NavLink::new("/z")]),
            NavLink::new("/y"),
        ];

        let found = resolver().find_active("/site/y/index.html", &links).unwrap();
        assert!(std::ptr::eq(found, &links[1]));
    }

    #[test]
    fn find_active_none_when_nothing_matches() {
        let links = vec![NavLink::new("/a").with_links(vec![NavLink::new("/b")])];
        assert!(resolver().find_active("/site/c/index.html", &links).is_none());
    }

    #[test]
    fn child_links_of_active_group() {
        let links = vec![
            NavLink::new(""),
            NavLink::new("/about"),
            NavLink::new("/docs").with_links(vec![NavLink::new("/docs/a"), NavLink::new("/docs/b")]),
        ];

        let nav = resolver();
        assert_eq!(nav.child_links("/site/docs/index.html", &links).len(), 2);
        assert_eq!(nav.child_links("/site/docs/a/index.html", &links).len(), 2);
        assert!(nav.child_links("/site/about/index.html", &links).is_empty());
        assert!(nav.child_links("/site/elsewhere.html", &links).is_empty());
    }

    #[test]
    fn tag_with_mod_three_over_seven() {
        let tagged = tag_with_mod(0..7, 3);
        let flags: Vec<ModFlags> = tagged.iter().map(|t| t.flags.unwrap()).collect();

        assert!(flags[0].first && flags[0].first_or_mod_zero);
        assert!(flags[3].mod_zero && flags[3].first_or_mod_zero && !flags[3].first);
        assert!(flags[2].mod_last && flags[2].last_or_mod_last && !flags[2].last);
        assert!(flags[6].last && flags[6].last_or_mod_last && flags[6].mod_zero);
        assert!(!flags[4].first_or_mod_zero && !flags[4].last_or_mod_last);
        assert_eq!(tagged.iter().map(|t| t.item).collect::<Vec<_>>(), (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn tag_with_mod_one_marks_every_item() {
        for tagged in tag_with_mod(["a", "b"], 1) {
            let flags = tagged.flags.unwrap();
            assert!(flags.mod_zero && flags.mod_last);
        }
    }

    #[test]
    fn tag_with_mod_zero_is_a_no_op() {
        let tagged = tag_with_mod(vec!["a", "b", "c"], 0);
        assert!(tagged.iter().all(|t| t.flags.is_none()));
        assert_eq!(json!(tagged), json!(["a", "b", "c"]));
    }

    #[test]
    fn tagged_links_serialize_flat() {
        let tagged = tag_with_mod(vec![NavLink::new("/a").with_field("name", "A")], 2);
        assert_eq!(json!(tagged[0]), json!({
            "uri": "/a",
            "name": "A",
            "first": true,
            "last": true,
            "mod_zero": true,
            "mod_last": false,
            "first_or_mod_zero": true,
            "last_or_mod_last": true,
        }));
    }

    #[test]
    fn tree_from_json_keeps_fields_and_nesting() {
        let tree = NavLink::tree_from_json(&json!([
            { "name": "Home", "uri": "" },
            { "name": "Docs", "uri": "/docs", "links": [{ "name": "API", "uri": "/docs/api" }] },
            { "name": "Heading" },
        ])).unwrap();

        assert_eq!(tree[0].fields["name"], "Home");
        assert_eq!(&*tree[1].children().unwrap()[0].uri, "/docs/api");
        assert_eq!(&*tree[2].uri, "");
        assert!(tree[2].children().is_none());
    }

    #[test]
    fn tree_from_json_rejects_malformed_links() {
        let error = NavLink::tree_from_json(&json!({ "uri": "/docs" })).unwrap_err();
        assert_eq!(error.argument, "links");
        assert_eq!(error.found, "map");

        let error = NavLink::tree_from_json(&json!("/docs")).unwrap_err();
        assert_eq!(error.found, "string");

        let error = NavLink::tree_from_json(&json!([{ "uri": 7 }])).unwrap_err();
        assert_eq!(error.argument, "links[0].uri");

        let error = NavLink::tree_from_json(&json!([{ "uri": "/a", "links": "nope" }])).unwrap_err();
        assert_eq!(error.argument, "links[0].links");

        let error = NavLink::tree_from_json(&json!([[]])).unwrap_err();
        assert_eq!(error.expected, "a link map");
    }
}
