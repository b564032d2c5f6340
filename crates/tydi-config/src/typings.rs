//! Native `typings.json` manifest parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use tydi_core::types::{NodeKind, TreeNode};

use crate::fields::{BrowserValue, StringOrList};

/// The native manifest shape.
///
/// Dependency values are short-form strings or ordered candidate lists;
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TypingsJson {
    pub name: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserValue>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub ambient: bool,
    #[serde(default)]
    pub dependencies: BTreeMap<String, StringOrList>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, StringOrList>,
    #[serde(default, rename = "ambientDependencies")]
    pub ambient_dependencies: BTreeMap<String, StringOrList>,
    #[serde(default, rename = "ambientDevDependencies")]
    pub ambient_dev_dependencies: BTreeMap<String, StringOrList>,
}

impl TypingsJson {
    /// Build the partial tree node for this manifest (dependency maps are
    /// attached by the resolver)
    pub fn into_tree_node(self, src: impl Into<String>) -> TreeNode {
        TreeNode {
            ambient: self.ambient,
            name: self.name,
            main: self.main,
            browser: self.browser.map(Into::into),
            typings: self.typings,
            browser_typings: self.browser_typings,
            ..TreeNode::new(NodeKind::Typings, src)
        }
    }
}
