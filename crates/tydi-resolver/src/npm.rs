//! npm ecosystem expansion.
//!
//! The npm root is the nearest `package.json` upward from the starting
//! directory. Each dependency is located by searching upward from its
//! dependent manifest for `node_modules/NAME`, mirroring node's own
//! resolution algorithm.

use camino::Utf8Path;
use futures::future::{try_join_all, BoxFuture};
use tydi_config::discover::{self, NPM_MANIFEST, TYPINGS_MANIFEST};
use tydi_config::PackageJson;
use tydi_core::types::{DependencyKind, DependencyTree, NodeKind};
use tydi_core::utils::location;

use crate::{
    check_cycle, definition_tree, extend_ancestry, merge, missing_tree, Flags, ResolveOptions,
    ResolveResult, Resolver,
};

impl Resolver {
    pub(crate) async fn resolve_npm_tree(
        &self,
        options: &ResolveOptions,
        flags: Flags,
    ) -> ResolveResult<DependencyTree> {
        match discover::find_up(&options.cwd, NPM_MANIFEST).await {
            Some(path) => self.expand_npm(path.as_str().to_string(), flags, &[]).await,
            None => Ok(missing_tree(
                NodeKind::Npm,
                options.cwd.join(NPM_MANIFEST).as_str(),
            )),
        }
    }

    /// Expand one `package.json` into a subtree.
    ///
    /// Boxed because npm dependencies recurse back into this function.
    pub(crate) fn expand_npm<'a>(
        &'a self,
        src: String,
        flags: Flags,
        ancestry: &'a [String],
    ) -> BoxFuture<'a, ResolveResult<DependencyTree>> {
        Box::pin(async move {
            check_cycle(ancestry, &src)?;

            let manifest: PackageJson = match self.fetcher().read_json(&src).await {
                Ok(manifest) => manifest,
                Err(e) if e.is_local_recoverable() => {
                    return Ok(missing_tree(NodeKind::Npm, src));
                },
                Err(e) => return Err(e),
            };

            let runtime = manifest.runtime_dependencies();
            let dev = if flags.dev {
                manifest.dev_dependencies.clone()
            } else {
                Default::default()
            };
            let node = manifest.into_tree_node(src.clone());

            let ancestry = extend_ancestry(ancestry, &src);
            let mut children = Vec::new();
            for (kind, names) in [
                (DependencyKind::Normal, runtime),
                (DependencyKind::Dev, dev),
            ] {
                let resolved = try_join_all(names.into_keys().map(|name| {
                    let ancestry = &ancestry;
                    let src = &src;
                    async move {
                        let subtree = self.resolve_npm_dependency(&name, src, ancestry).await?;
                        Ok::<_, tydi_core::TydiError>((name, subtree))
                    }
                }))
                .await?;
                children.extend(
                    resolved
                        .into_iter()
                        .map(|(name, subtree)| (kind, name, subtree)),
                );
            }

            let mut tree = DependencyTree::new(node);
            self.apply_native_overlay(&mut tree, &mut children, &src, flags, &ancestry)
                .await?;
            for (kind, key, subtree) in children {
                tree.graft(DependencyTree::ROOT, kind, key, subtree);
            }
            Ok(tree)
        })
    }

    /// Locate and expand one npm dependency by name.
    ///
    /// A name ending in `.d.ts` short-circuits manifest reading: the
    /// located file itself is the typings entry.
    pub(crate) async fn resolve_npm_dependency(
        &self,
        name: &str,
        parent_src: &str,
        ancestry: &[String],
    ) -> ResolveResult<DependencyTree> {
        if location::is_http(parent_src) {
            // node_modules lookups have no meaning against a URL base.
            return Ok(missing_tree(
                NodeKind::Npm,
                location::join_location(parent_src, name),
            ));
        }

        let dir = location::location_dir(parent_src);
        if location::is_definition(name) {
            let target = format!("node_modules/{name}");
            return match discover::find_up(Utf8Path::new(&dir), &target).await {
                Some(found) => Ok(definition_tree(found.into_string())),
                None => Ok(missing_tree(NodeKind::Npm, format!("{dir}/{target}"))),
            };
        }

        let target = format!("node_modules/{name}/{NPM_MANIFEST}");
        match discover::find_up(Utf8Path::new(&dir), &target).await {
            Some(found) => {
                self.expand_npm(found.into_string(), Flags::NONE, ancestry).await
            },
            None => Ok(missing_tree(NodeKind::Npm, format!("{dir}/{target}"))),
        }
    }

    /// Read the native config sitting next to an external manifest and
    /// merge it over the node (fields) and its children (maps).
    pub(crate) async fn apply_native_overlay(
        &self,
        tree: &mut DependencyTree,
        children: &mut Vec<(DependencyKind, String, DependencyTree)>,
        src: &str,
        flags: Flags,
        ancestry: &[String],
    ) -> ResolveResult<()> {
        let overlay_src = location::join_location(src, TYPINGS_MANIFEST);
        let overlay = self.expand_typings(overlay_src, None, flags, ancestry).await?;
        merge::apply_overlay(tree.root_mut(), children, overlay);
        Ok(())
    }
}
