//! The resolved dependency tree.
//!
//! Nodes live in an arena (`Vec<TreeNode>`) and refer to each other by
//! index. Ownership flows exclusively through the four dependency maps;
//! `parent` is a non-owning back-edge consulted only for cycle checks and
//! URL base resolution.

use std::collections::BTreeMap;

/// Index of a node inside a [`DependencyTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which source produced a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A native `typings.json` manifest
    Typings,
    /// An npm `package.json` manifest
    Npm,
    /// A bower `bower.json` manifest
    Bower,
    /// A local path given directly (manifest or bare `.d.ts` file)
    File,
    /// An HTTP(S) location given directly
    Http,
}

/// The npm-style `browser` field: a replacement entry or a specifier map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserField {
    /// Replaces the `main` entry for the browser target
    Source(String),
    /// Remaps module specifiers within the owning node
    Map(BTreeMap<String, String>),
}

impl BrowserField {
    /// The replacement entry, when the field is a plain string
    pub fn as_source(&self) -> Option<&str> {
        match self {
            Self::Source(source) => Some(source),
            Self::Map(_) => None,
        }
    }

    /// Apply the specifier overlay, returning the input when no mapping applies
    pub fn remap<'a>(&'a self, specifier: &'a str) -> &'a str {
        match self {
            Self::Source(_) => specifier,
            Self::Map(map) => map.get(specifier).map(String::as_str).unwrap_or(specifier),
        }
    }
}

/// Which of the four dependency maps a child was reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Normal,
    Dev,
    Ambient,
    AmbientDev,
}

impl DependencyKind {
    /// The fixed emission/merge sequence over the four maps
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::Normal,
        DependencyKind::Dev,
        DependencyKind::Ambient,
        DependencyKind::AmbientDev,
    ];

    /// Check if children reached through this map are globally declared
    pub fn is_ambient(&self) -> bool {
        matches!(self, DependencyKind::Ambient | DependencyKind::AmbientDev)
    }

    /// Check if this map is only populated for development resolution
    pub fn is_dev(&self) -> bool {
        matches!(self, DependencyKind::Dev | DependencyKind::AmbientDev)
    }
}

/// A resolved dependency node
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Absolute path or URL of the manifest that produced this node
    pub src: String,
    /// Which source produced it
    pub kind: NodeKind,
    /// True when the manifest could not be read; the subtree is empty
    pub missing: bool,
    /// True when the node declares global names (no module wrapper)
    pub ambient: bool,
    pub name: Option<String>,
    pub version: Option<String>,
    /// Implementation entry point
    pub main: Option<String>,
    /// Browser replacement entry or specifier map
    pub browser: Option<BrowserField>,
    /// Declaration entry for the main target
    pub typings: Option<String>,
    /// Declaration entry for the browser target
    pub browser_typings: Option<String>,
    /// The short-form string that produced this node, for diagnostics
    pub raw: Option<String>,
    /// Non-owning back-edge to the dependent node
    pub parent: Option<NodeId>,
    pub dependencies: BTreeMap<String, NodeId>,
    pub dev_dependencies: BTreeMap<String, NodeId>,
    pub ambient_dependencies: BTreeMap<String, NodeId>,
    pub ambient_dev_dependencies: BTreeMap<String, NodeId>,
}

impl TreeNode {
    /// Create an empty node for a manifest location
    pub fn new(kind: NodeKind, src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            kind,
            missing: false,
            ambient: false,
            name: None,
            version: None,
            main: None,
            browser: None,
            typings: None,
            browser_typings: None,
            raw: None,
            parent: None,
            dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            ambient_dependencies: BTreeMap::new(),
            ambient_dev_dependencies: BTreeMap::new(),
        }
    }

    /// Create a placeholder for a manifest that could not be read
    pub fn missing(kind: NodeKind, src: impl Into<String>) -> Self {
        Self {
            missing: true,
            ..Self::new(kind, src)
        }
    }

    /// Check whether any of the entry fields is set.
    ///
    /// The 3-ecosystem merge treats these four fields (plus `name` and
    /// `src`) as one unit: the last subtree defining any of them wins.
    pub fn has_entry_fields(&self) -> bool {
        self.main.is_some()
            || self.browser.is_some()
            || self.typings.is_some()
            || self.browser_typings.is_some()
    }

    /// The dependency map for a given kind
    pub fn children(&self, kind: DependencyKind) -> &BTreeMap<String, NodeId> {
        match kind {
            DependencyKind::Normal => &self.dependencies,
            DependencyKind::Dev => &self.dev_dependencies,
            DependencyKind::Ambient => &self.ambient_dependencies,
            DependencyKind::AmbientDev => &self.ambient_dev_dependencies,
        }
    }

    /// Mutable access to the dependency map for a given kind
    pub fn children_mut(&mut self, kind: DependencyKind) -> &mut BTreeMap<String, NodeId> {
        match kind {
            DependencyKind::Normal => &mut self.dependencies,
            DependencyKind::Dev => &mut self.dev_dependencies,
            DependencyKind::Ambient => &mut self.ambient_dependencies,
            DependencyKind::AmbientDev => &mut self.ambient_dev_dependencies,
        }
    }

    /// Total number of direct children across all four maps
    pub fn child_count(&self) -> usize {
        DependencyKind::ALL
            .iter()
            .map(|kind| self.children(*kind).len())
            .sum()
    }
}

/// Arena-backed dependency tree rooted at node 0
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyTree {
    nodes: Vec<TreeNode>,
}

impl DependencyTree {
    /// The root node's id in every tree
    pub const ROOT: NodeId = NodeId(0);

    /// Create a tree holding a single root node.
    ///
    /// The root's dependency maps must be empty; children are attached
    /// with [`DependencyTree::graft`].
    pub fn new(mut root: TreeNode) -> Self {
        debug_assert_eq!(root.child_count(), 0);
        root.parent = None;
        Self { nodes: vec![root] }
    }

    /// Borrow the root node
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Mutable access to the root node
    pub fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.nodes[0]
    }

    /// Borrow a node by id
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    /// Mutable access to a node by id
    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree holds at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their ids
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Attach another tree as a child of `parent` under `key`.
    ///
    /// The subtree's nodes are appended to this arena with their ids
    /// re-based; its root becomes the child entry. Returns the child's
    /// new id. An existing entry under the same key is replaced.
    pub fn graft(
        &mut self,
        parent: NodeId,
        kind: DependencyKind,
        key: impl Into<String>,
        subtree: DependencyTree,
    ) -> NodeId {
        let offset = self.nodes.len() as u32;
        for mut node in subtree.nodes {
            node.parent = node.parent.map(|id| NodeId(id.0 + offset));
            for child_kind in DependencyKind::ALL {
                for id in node.children_mut(child_kind).values_mut() {
                    *id = NodeId(id.0 + offset);
                }
            }
            self.nodes.push(node);
        }
        let child = NodeId(offset);
        self.nodes[child.index()].parent = Some(parent);
        self.node_mut(parent).children_mut(kind).insert(key.into(), child);
        child
    }

    /// Deep-copy the subtree rooted at `id` into a standalone tree
    pub fn subtree(&self, id: NodeId) -> DependencyTree {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            let node = self.node(current);
            for kind in DependencyKind::ALL {
                stack.extend(node.children(kind).values().copied());
            }
        }

        let remap: BTreeMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(index, old)| (*old, NodeId(index as u32)))
            .collect();

        let nodes = order
            .iter()
            .map(|old| {
                let mut node = self.node(*old).clone();
                node.parent = node.parent.and_then(|p| remap.get(&p).copied());
                for kind in DependencyKind::ALL {
                    for child in node.children_mut(kind).values_mut() {
                        *child = remap[child];
                    }
                }
                node
            })
            .collect();

        DependencyTree { nodes }
    }

    /// Look up a direct child by key, searching the four maps in order
    pub fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        let node = self.node(parent);
        DependencyKind::ALL
            .iter()
            .find_map(|kind| node.children(*kind).get(key).copied())
    }

    /// The `src` values along the parent chain, nearest first
    pub fn ancestor_srcs(&self, id: NodeId) -> Vec<&str> {
        let mut srcs = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(ancestor) = current {
            srcs.push(self.node(ancestor).src.as_str());
            current = self.node(ancestor).parent;
        }
        srcs
    }
}
