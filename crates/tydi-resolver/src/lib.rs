//! Dependency tree resolution for tydi.
//!
//! Walks the native, npm and bower ecosystems concurrently from a root
//! directory, expands each manifest's dependency maps with fan-out per
//! entry, applies native overlays, detects cycles through parent chains,
//! and merges the three ecosystem subtrees into a single root node.
//!
//! A manifest that cannot be read is never an error during resolution: it
//! becomes a `missing: true` node, and only the compiler decides whether
//! that is fatal.

mod bower;
mod merge;
mod native;
mod npm;

use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::debug;
use tydi_core::error::TydiError;
use tydi_core::types::{DependencyTree, NodeKind, TreeNode};
use tydi_core::utils::location;
use tydi_fetch::Fetcher;

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, TydiError>;

/// Caller options for a resolution run
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory the ecosystem walk starts from
    pub cwd: Utf8PathBuf,
    /// Include `devDependencies` of the root
    pub dev: bool,
    /// Include `ambientDependencies` of the root
    pub ambient: bool,
}

/// Inclusion flags for one manifest expansion.
///
/// Only the root expansion carries the caller's flags; every deeper
/// expansion is forced to `NONE`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Flags {
    pub dev: bool,
    pub ambient: bool,
}

impl Flags {
    pub(crate) const NONE: Flags = Flags {
        dev: false,
        ambient: false,
    };
}

/// Multi-ecosystem dependency resolver
#[derive(Debug)]
pub struct Resolver {
    fetcher: Arc<Fetcher>,
}

impl Resolver {
    /// Create a resolver reading through the given fetcher
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    pub(crate) fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Resolve the dependency tree for a project directory.
    ///
    /// The three ecosystems are walked in parallel and merged with the
    /// native subtree authoritative.
    pub async fn resolve_dependencies(
        &self,
        options: &ResolveOptions,
    ) -> ResolveResult<DependencyTree> {
        let flags = Flags {
            dev: options.dev,
            ambient: options.ambient,
        };

        debug!(cwd = %options.cwd, dev = options.dev, ambient = options.ambient, "resolving");

        let (bower, npm, native) = tokio::join!(
            self.resolve_bower_tree(options, flags),
            self.resolve_npm_tree(options, flags),
            self.resolve_typings_tree(options, flags),
        );

        Ok(merge::merge_roots(bower?, npm?, native?))
    }
}

/// Fail when `src` already appears along the chain of manifests being
/// expanded
pub(crate) fn check_cycle(ancestry: &[String], src: &str) -> ResolveResult<()> {
    if ancestry.iter().any(|ancestor| ancestor == src) {
        let chain = ancestry
            .iter()
            .map(String::as_str)
            .chain([src])
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(TydiError::CircularDependency { chain });
    }
    Ok(())
}

/// Extend an ancestry chain with the manifest about to be expanded
pub(crate) fn extend_ancestry(ancestry: &[String], src: &str) -> Vec<String> {
    let mut extended = Vec::with_capacity(ancestry.len() + 1);
    extended.extend_from_slice(ancestry);
    extended.push(src.to_string());
    extended
}

/// A single-node tree for a bare `.d.ts` dependency.
///
/// The declaration file is the typings entry directly; no manifest is
/// read.
pub(crate) fn definition_tree(loc: String) -> DependencyTree {
    let kind = if location::is_http(&loc) {
        NodeKind::Http
    } else {
        NodeKind::File
    };
    DependencyTree::new(TreeNode {
        typings: Some(loc.clone()),
        ..TreeNode::new(kind, loc)
    })
}

/// A single `missing: true` node tree
pub(crate) fn missing_tree(kind: NodeKind, src: impl Into<String>) -> DependencyTree {
    DependencyTree::new(TreeNode::missing(kind, src))
}
