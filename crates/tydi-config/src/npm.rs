//! npm `package.json` manifest parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use tydi_core::types::{NodeKind, TreeNode};

use crate::fields::BrowserValue;

/// The npm manifest shape, reduced to the fields tydi reads.
///
/// Unknown keys are ignored; nothing here is required because upstream
/// packages routinely ship partial manifests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserValue>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    /// Build the partial tree node for this manifest
    pub fn into_tree_node(self, src: impl Into<String>) -> TreeNode {
        TreeNode {
            name: self.name,
            version: self.version,
            main: self.main,
            browser: self.browser.map(Into::into),
            typings: self.typings,
            browser_typings: self.browser_typings,
            ..TreeNode::new(NodeKind::Npm, src)
        }
    }

    /// Runtime dependency names, with `optionalDependencies` overriding
    /// `dependencies` on key collision
    pub fn runtime_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        for (name, range) in &self.optional_dependencies {
            merged.insert(name.clone(), range.clone());
        }
        merged
    }
}
