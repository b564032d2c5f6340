//! Entry declaration resolution.
//!
//! Picks the declaration file a node contributes for a target, with a
//! defined precedence: explicit typings fields first, then a parent
//! browser-map override (browser target only), then the implementation
//! entry with its extension substituted to `.d.ts`.

use tydi_core::error::TydiError;
use tydi_core::types::{BrowserField, DependencyKind, DependencyTree, NodeId};
use tydi_core::utils::location;

use crate::CompileResult;

/// Which artifact a compile run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Main,
    Browser,
}

impl Target {
    pub fn is_browser(&self) -> bool {
        matches!(self, Target::Browser)
    }
}

/// Resolve the entry declaration location for a node.
///
/// `namespace` is only used to label errors with the fully-namespaced
/// dependency name.
pub(crate) async fn resolve_entry(
    tree: &DependencyTree,
    id: NodeId,
    target: Target,
    namespace: &str,
) -> CompileResult<String> {
    let node = tree.node(id);

    if target.is_browser() {
        if let Some(browser_typings) = &node.browser_typings {
            return Ok(location::join_location(&node.src, browser_typings));
        }
        // The dependent's browser map may remap this dependency to a
        // replacement file of its own.
        if let Some(parent) = node.parent {
            let parent_node = tree.node(parent);
            if let Some(BrowserField::Map(map)) = &parent_node.browser {
                if let Some(mapped) = child_key(tree, parent, id).and_then(|key| map.get(&key)) {
                    return from_implementation(&parent_node.src, mapped, namespace).await;
                }
            }
        }
    }

    if let Some(typings) = &node.typings {
        return Ok(location::join_location(&node.src, typings));
    }

    let main = if target.is_browser() {
        node.browser
            .as_ref()
            .and_then(BrowserField::as_source)
            .or(node.main.as_deref())
    } else {
        node.main.as_deref()
    };

    match main {
        Some(main) => from_implementation(&node.src, main, namespace).await,
        None => Err(TydiError::EntryResolution {
            name: namespace.to_string(),
        }),
    }
}

/// Accept an implementation entry as-is when it is already a declaration
/// file, otherwise substitute its extension and require the result to
/// exist on disk.
async fn from_implementation(
    base_src: &str,
    main: &str,
    namespace: &str,
) -> CompileResult<String> {
    let loc = location::join_location(base_src, main);
    if location::is_definition(&loc) {
        return Ok(loc);
    }

    let candidate = definition_candidate(&loc);
    if location::is_http(&candidate) {
        // Remote existence is settled by the fetch itself.
        return Ok(candidate);
    }
    if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        Ok(candidate)
    } else {
        Err(TydiError::EntryNotFound {
            name: namespace.to_string(),
            path: candidate,
        })
    }
}

/// Substitute a location's extension with `.d.ts`
pub(crate) fn definition_candidate(loc: &str) -> String {
    if location::is_definition(loc) {
        return loc.to_string();
    }
    let last_segment = loc.rsplit('/').next().unwrap_or(loc);
    match last_segment.rfind('.').filter(|dot| *dot > 0) {
        Some(dot) => {
            let stem_end = loc.len() - (last_segment.len() - dot);
            format!("{}{}", &loc[..stem_end], location::DEFINITION_EXT)
        },
        None => format!("{loc}{}", location::DEFINITION_EXT),
    }
}

/// The key under which `child` hangs off `parent`
fn child_key(tree: &DependencyTree, parent: NodeId, child: NodeId) -> Option<String> {
    let parent_node = tree.node(parent);
    DependencyKind::ALL.iter().find_map(|kind| {
        parent_node
            .children(*kind)
            .iter()
            .find(|(_, id)| **id == child)
            .map(|(key, _)| key.clone())
    })
}
