//! Core data types for tydi.
//!
//! The dependency tree is the central data structure: an arena of nodes
//! with non-owning parent back-edges, built by the resolver and walked by
//! the compiler.

mod source;
mod tree;

pub use source::DependencySource;
pub use tree::{BrowserField, DependencyKind, DependencyTree, NodeId, NodeKind, TreeNode};
