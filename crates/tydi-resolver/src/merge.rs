//! Subtree merging.
//!
//! Two merge steps exist: folding the three top-level ecosystem subtrees
//! into one root (bower, then npm, then native, so the native overlay is
//! authoritative), and applying an adjacent native config over a single
//! external manifest.

use std::collections::BTreeMap;

use tydi_core::types::{DependencyKind, DependencyTree, NodeId, TreeNode};

/// Merge the three ecosystem subtrees into a single root.
///
/// Field rule: the last subtree (in bower, npm, native order) that
/// defines any of `main`/`browser`/`typings`/`browserTypings` wins for
/// all four plus `name`, `version` and `src`. Dependency maps take the
/// key-wise union with later subtrees overwriting earlier ones.
pub(crate) fn merge_roots(
    bower: DependencyTree,
    npm: DependencyTree,
    native: DependencyTree,
) -> DependencyTree {
    let trees = [bower, npm, native];
    let native_root = trees[2].root();

    let mut root = TreeNode::new(native_root.kind, native_root.src.clone());
    root.missing = trees.iter().all(|tree| tree.root().missing);
    root.ambient = native_root.ambient;

    for tree in &trees {
        let candidate = tree.root();
        if candidate.has_entry_fields() {
            root.src = candidate.src.clone();
            root.kind = candidate.kind;
            root.name = candidate.name.clone();
            root.version = candidate.version.clone();
            root.main = candidate.main.clone();
            root.browser = candidate.browser.clone();
            root.typings = candidate.typings.clone();
            root.browser_typings = candidate.browser_typings.clone();
        }
    }

    let mut merged = DependencyTree::new(root);
    for kind in DependencyKind::ALL {
        let mut winners: BTreeMap<&str, (usize, NodeId)> = BTreeMap::new();
        for (index, tree) in trees.iter().enumerate() {
            for (key, id) in tree.root().children(kind) {
                winners.insert(key, (index, *id));
            }
        }
        for (key, (index, id)) in winners {
            merged.graft(
                DependencyTree::ROOT,
                kind,
                key.to_string(),
                trees[index].subtree(id),
            );
        }
    }
    merged
}

/// Merge an adjacent native config over an external manifest's node.
///
/// The overlay's entry fields win when it defines any of them, and its
/// resolved children replace same-key children of the ecosystem
/// manifest. A missing overlay changes nothing.
pub(crate) fn apply_overlay(
    node: &mut TreeNode,
    children: &mut Vec<(DependencyKind, String, DependencyTree)>,
    overlay: DependencyTree,
) {
    if overlay.root().missing {
        return;
    }

    let overlay_root = overlay.root();
    if overlay_root.has_entry_fields() {
        node.main = overlay_root.main.clone();
        node.browser = overlay_root.browser.clone();
        node.typings = overlay_root.typings.clone();
        node.browser_typings = overlay_root.browser_typings.clone();
    }
    if overlay_root.name.is_some() {
        node.name = overlay_root.name.clone();
    }
    if overlay_root.ambient {
        node.ambient = true;
    }

    for kind in DependencyKind::ALL {
        for (key, id) in overlay.root().children(kind) {
            let subtree = overlay.subtree(*id);
            children.retain(|(existing_kind, existing_key, _)| {
                !(*existing_kind == kind && existing_key == key)
            });
            children.push((kind, key.clone(), subtree));
        }
    }
}
