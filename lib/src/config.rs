use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Chainable, ErrorDetail, Result};
use crate::nav::{NavLink, NavResolver};
use crate::operations::Operations;

/// Everything templates know about the site, loaded once before rendering.
///
/// ```rust
/// use stache::config::Settings;
///
/// let settings = Settings::from_toml(r#"
///     [site]
///     base = "/site"
///
///     [[site.links]]
///     name = "Docs"
///     uri = "/docs"
/// "#).unwrap();
///
/// assert_eq!(settings.site.links[0].uri, "/docs");
/// assert!(!settings.site.draft);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub data: Data,
    /// Any other top-level table, exposed to templates under its own name.
    #[serde(flatten)]
    pub globals: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// The site's base path, removed from paths before navigation matching.
    #[serde(default)]
    pub base: String,
    /// The build output directory, removed likewise.
    #[serde(default)]
    pub app_build: String,
    /// Whether `draft` blocks are shown.
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub links: Vec<NavLink>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    #[serde(default)]
    pub operations: Operations,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub trait Format {
    type Error: ErrorDetail + 'static;

    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error);
impl_format!(Json: serde_json::from_str, serde_json::Error);

impl Settings {
    pub fn from_toml(string: &str) -> Result<Self> {
        Ok(Toml::from_str(string)?)
    }

    pub fn from_json(string: &str) -> Result<Self> {
        Ok(Json::from_str(string)?)
    }

    /// Reads settings from `path`: JSON for a `.json` file, TOML otherwise.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path).chain_with(|| error! {
            "failed to read settings",
            "path" => path.display(),
        })?;

        let settings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&string),
            _ => Self::from_toml(&string),
        };

        let settings = settings.chain_with(|| error! {
            "invalid settings file",
            "path" => path.display(),
        })?;

        tracing::debug!(path = %path.display(), links = settings.site.links.len(), "loaded settings");
        Ok(settings)
    }

    pub fn resolver(&self) -> NavResolver {
        NavResolver::new(&self.site.base, &self.site.app_build)
    }
}
