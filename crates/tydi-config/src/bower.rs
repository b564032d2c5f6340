//! bower `bower.json` and `.bowerrc` parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use tydi_core::types::{NodeKind, TreeNode};

use crate::fields::{BrowserValue, StringOrList};

/// The bower manifest shape, reduced to the fields tydi reads.
///
/// Bower's `main` may be a list; the first entry is taken as the
/// implementation entry point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BowerJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<StringOrList>,
    pub browser: Option<BrowserValue>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl BowerJson {
    /// Build the partial tree node for this manifest
    pub fn into_tree_node(self, src: impl Into<String>) -> TreeNode {
        TreeNode {
            name: self.name,
            version: self.version,
            main: self
                .main
                .as_ref()
                .and_then(StringOrList::first)
                .map(str::to_string),
            browser: self.browser.map(Into::into),
            typings: self.typings,
            browser_typings: self.browser_typings,
            ..TreeNode::new(NodeKind::Bower, src)
        }
    }
}

/// The `.bowerrc` shape; only `directory` is read
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BowerRc {
    pub directory: Option<String>,
}

impl BowerRc {
    /// The components directory, defaulting to `bower_components`
    pub fn components_dir(&self) -> &str {
        self.directory
            .as_deref()
            .unwrap_or(crate::discover::DEFAULT_COMPONENTS_DIR)
    }
}
