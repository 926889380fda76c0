//! Accessors for the `packages` list and the legacy `extensions` list.
//!
//! The two lists are independent on disk. `packages` entries are either a
//! bare source identifier or a filter object; `extensions` is a list of plain
//! local paths. Neither list is folded into the other.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display};

use crate::document::SettingsDocument;

pub const PACKAGES_KEY: &str = "packages";
pub const EXTENSIONS_KEY: &str = "extensions";

/// Resource kinds a package can contribute, named as their filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Extensions,
    Skills,
    Prompts,
    Themes,
}

/// One entry of the `packages` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageSource {
    /// Bare identifier such as `"npm:pkg"` or `"git:github.com/org/repo"`.
    Source(String),
    /// Identifier plus per-resource filters.
    Filtered(PackageSourceFilter),
}

/// Structured package entry, held exactly as it appears on disk.
///
/// Accessors interpret the well-known fields; the object itself is never
/// normalized, so fields of unexpected type, explicit `null`s and fields this
/// crate does not know about all round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSourceFilter {
    fields: Map<String, Value>,
}

impl PackageSourceFilter {
    pub fn new(source: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("source".to_string(), Value::String(source.into()));
        Self { fields }
    }

    /// Restrict `kind` to `patterns`. An empty list disables the kind.
    pub fn with_filter<I, S>(mut self, kind: ResourceKind, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Value::String(p.into()))
            .collect();
        self.fields
            .insert(kind.as_ref().to_string(), Value::Array(patterns));
        self
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The `source` field, when it is a string.
    pub fn source(&self) -> Option<&str> {
        self.fields.get("source").and_then(Value::as_str)
    }

    /// String patterns listed for `kind`. `None` when the field is absent,
    /// `null`, or not an array; non-string array items are ignored.
    pub fn filter(&self, kind: ResourceKind) -> Option<Vec<&str>> {
        match self.fields.get(kind.as_ref())? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    /// A kind is disabled only by an explicit empty array.
    pub fn enables(&self, kind: ResourceKind) -> bool {
        !matches!(self.fields.get(kind.as_ref()), Some(Value::Array(items)) if items.is_empty())
    }
}

impl PackageSource {
    pub fn source(&self) -> Option<&str> {
        match self {
            PackageSource::Source(source) => Some(source),
            PackageSource::Filtered(filter) => filter.source(),
        }
    }

    pub fn enables(&self, kind: ResourceKind) -> bool {
        match self {
            PackageSource::Source(_) => true,
            PackageSource::Filtered(filter) => filter.enables(kind),
        }
    }

    /// On-disk form of this entry.
    pub fn to_value(&self) -> Value {
        match self {
            PackageSource::Source(source) => Value::String(source.clone()),
            PackageSource::Filtered(filter) => Value::Object(filter.fields.clone()),
        }
    }
}

impl From<&str> for PackageSource {
    fn from(source: &str) -> Self {
        PackageSource::Source(source.to_string())
    }
}

impl From<PackageSourceFilter> for PackageSource {
    fn from(filter: PackageSourceFilter) -> Self {
        PackageSource::Filtered(filter)
    }
}

/// The `packages` list of `doc`, entries unchanged. Empty when absent.
///
/// String and object entries are returned as written. Anything else is
/// skipped with a warning.
pub fn get_packages(doc: &SettingsDocument) -> Vec<PackageSource> {
    let Some(value) = doc.get(PACKAGES_KEY) else {
        return Vec::new();
    };
    let Value::Array(entries) = value else {
        tracing::warn!("ignoring `packages`: expected an array");
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(source) => Some(PackageSource::Source(source.clone())),
            Value::Object(fields) => Some(PackageSource::Filtered(
                PackageSourceFilter::from_fields(fields.clone()),
            )),
            other => {
                tracing::warn!("ignoring package entry {other}: expected a string or an object");
                None
            }
        })
        .collect()
}

/// The legacy `extensions` list of `doc`, verbatim. Empty when absent.
///
/// These are local paths; they are never promoted into `packages`.
pub fn get_extension_paths(doc: &SettingsDocument) -> Vec<String> {
    string_list(doc, EXTENSIONS_KEY)
}

/// A top-level list of strings, skipping non-string entries.
pub(crate) fn string_list(doc: &SettingsDocument, key: &str) -> Vec<String> {
    match doc.get(key) {
        None => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.clone()),
                other => {
                    tracing::warn!("ignoring non-string entry {other} in `{key}`");
                    None
                }
            })
            .collect(),
        Some(_) => {
            tracing::warn!("ignoring `{key}`: expected an array of strings");
            Vec::new()
        }
    }
}

/// Serialize a package list back into its on-disk form.
pub fn packages_to_value(packages: &[PackageSource]) -> Value {
    Value::Array(packages.iter().map(PackageSource::to_value).collect())
}
