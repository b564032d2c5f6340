//! Manifest field shapes shared across the three ecosystems.

use std::collections::BTreeMap;

use serde::Deserialize;
use tydi_core::types::BrowserField;

/// A field that accepts a single string or an ordered list of strings.
///
/// Native dependency values use this for fallback candidates; bower uses
/// it for `main`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    List(Vec<String>),
}

impl StringOrList {
    /// View the value as an ordered candidate list
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }

    /// The first candidate, if any
    pub fn first(&self) -> Option<&str> {
        self.candidates().first().map(String::as_str)
    }
}

/// The `browser` field: a replacement entry or a specifier map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BrowserValue {
    Source(String),
    Map(BTreeMap<String, String>),
}

impl From<BrowserValue> for BrowserField {
    fn from(value: BrowserValue) -> Self {
        match value {
            BrowserValue::Source(source) => BrowserField::Source(source),
            BrowserValue::Map(map) => BrowserField::Map(map),
        }
    }
}
