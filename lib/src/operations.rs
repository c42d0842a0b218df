//! Lookup of API operation records kept in site data.
//!
//! Operations are free-form records, conventionally carrying an `id` (the
//! operation's path in the API portal), a `name` and a `description`.
//! Templates select them with criteria: a map from field name to a
//! substring the field must contain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::InvalidArgument;
use crate::nav::kind;

pub type Operation = Map<String, Json>;

/// Field name to required substring.
pub type Criteria<'c> = Vec<(&'c str, &'c str)>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operations(pub Vec<Operation>);

#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// Exactly one operation matched.
    One(&'a Operation),
    /// Zero or several operations matched.
    Many(Vec<&'a Operation>),
}

impl Operations {
    /// Turns a template-supplied criteria map into [`Criteria`].
    pub fn criteria(map: &Map<String, Json>) -> Result<Criteria<'_>, InvalidArgument> {
        map.iter()
            .map(|(key, value)| match value {
                Json::String(needle) => Ok((key.as_str(), needle.as_str())),
                _ => Err(InvalidArgument::new(format!("criteria.{key}"), "a string", kind(value))),
            })
            .collect()
    }

    /// Operations having, for every criterion, a field of that name that
    /// contains the criterion's value: a string containing it as a substring
    /// or a sequence holding it as an element.
    pub fn select(&self, criteria: &[(&str, &str)]) -> Selection<'_> {
        let mut matches: Vec<&Operation> = self.0.iter()
            .filter(|op| criteria.iter().all(|(key, needle)| match op.get(*key) {
                Some(Json::String(field)) => field.contains(needle),
                Some(Json::Array(items)) => items.iter().any(|item| item.as_str() == Some(*needle)),
                _ => false,
            }))
            .collect();

        match matches.len() {
            1 => Selection::One(matches.remove(0)),
            _ => Selection::Many(matches),
        }
    }

    /// The single matching operation, or its `property` when it has one.
    /// When zero or several operations match, all matches are returned.
    pub fn lookup(&self, criteria: &[(&str, &str)], property: Option<&str>) -> Json {
        match self.select(criteria) {
            Selection::One(op) => match property.and_then(|p| op.get(p)) {
                Some(value) => value.clone(),
                None => Json::Object(op.clone()),
            },
            Selection::Many(ops) => ops.into_iter()
                .map(|op| Json::Object(op.clone()))
                .collect(),
        }
    }

    /// The documentation URI of the single matching operation: its `id`
    /// with `/apis/` replaced by `docs/services/`.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use stache::operations::Operations;
    ///
    /// let ops: Operations = serde_json::from_value(json!([
    ///     { "id": "/apis/constituents/address-create", "name": "Address (Create)" },
    /// ])).unwrap();
    ///
    /// let uri = ops.uri(&[("name", "Address")]);
    /// assert_eq!(uri.as_deref(), Some("docs/services/constituents/address-create"));
    /// ```
    pub fn uri(&self, criteria: &[(&str, &str)]) -> Option<String> {
        match self.select(criteria) {
            Selection::One(op) => {
                let id = op.get("id")?.as_str()?;
                Some(id.replacen("/apis/", "docs/services/", 1))
            }
            Selection::Many(ops) => {
                tracing::debug!(matches = ops.len(), "no unique operation for uri");
                None
            }
        }
    }
}
