//! Native ecosystem expansion.
//!
//! Native manifests declare dependencies as short-form strings (or
//! ordered candidate lists); each value is parsed into a
//! [`DependencySource`] and dispatched on its tag. Candidate lists
//! resolve to the first non-missing result.

use camino::Utf8Path;
use futures::future::{try_join_all, BoxFuture};
use tydi_config::discover::{self, TYPINGS_MANIFEST};
use tydi_config::{StringOrList, TypingsJson};
use tydi_core::types::{DependencyKind, DependencySource, DependencyTree, NodeKind};
use tydi_core::utils::location;

use crate::{
    check_cycle, definition_tree, extend_ancestry, missing_tree, Flags, ResolveOptions,
    ResolveResult, Resolver,
};

impl Resolver {
    pub(crate) async fn resolve_typings_tree(
        &self,
        options: &ResolveOptions,
        flags: Flags,
    ) -> ResolveResult<DependencyTree> {
        match discover::find_up(&options.cwd, TYPINGS_MANIFEST).await {
            Some(path) => {
                self.expand_typings(path.as_str().to_string(), None, flags, &[])
                    .await
            },
            None => Ok(missing_tree(
                NodeKind::Typings,
                options.cwd.join(TYPINGS_MANIFEST).as_str(),
            )),
        }
    }

    /// Expand one native manifest into a subtree.
    ///
    /// Which of the four maps expand is driven by `flags`; `dev` and
    /// `ambient` are only ever set for the root manifest.
    pub(crate) fn expand_typings<'a>(
        &'a self,
        src: String,
        raw: Option<String>,
        flags: Flags,
        ancestry: &'a [String],
    ) -> BoxFuture<'a, ResolveResult<DependencyTree>> {
        Box::pin(async move {
            check_cycle(ancestry, &src)?;

            let manifest: TypingsJson = match self.fetcher().read_json(&src).await {
                Ok(manifest) => manifest,
                Err(e) if e.is_local_recoverable() => {
                    let mut tree = missing_tree(NodeKind::Typings, src);
                    tree.root_mut().raw = raw;
                    return Ok(tree);
                },
                Err(e) => return Err(e),
            };

            let maps = [
                (DependencyKind::Normal, manifest.dependencies.clone(), true),
                (
                    DependencyKind::Dev,
                    manifest.dev_dependencies.clone(),
                    flags.dev,
                ),
                (
                    DependencyKind::Ambient,
                    manifest.ambient_dependencies.clone(),
                    flags.ambient,
                ),
                (
                    DependencyKind::AmbientDev,
                    manifest.ambient_dev_dependencies.clone(),
                    flags.dev && flags.ambient,
                ),
            ];

            let mut node = manifest.into_tree_node(src.clone());
            node.raw = raw;

            let ancestry = extend_ancestry(ancestry, &src);
            let mut entries = Vec::new();
            for (kind, map, included) in maps {
                if !included {
                    continue;
                }
                entries.extend(map.into_iter().map(|(key, value)| (kind, key, value)));
            }

            let children = try_join_all(entries.into_iter().map(|(kind, key, value)| {
                let ancestry = &ancestry;
                let src = &src;
                async move {
                    let subtree = self
                        .resolve_candidates(&key, &value, src, ancestry)
                        .await?;
                    Ok::<_, tydi_core::TydiError>((kind, key, subtree))
                }
            }))
            .await?;

            let mut tree = DependencyTree::new(node);
            for (kind, key, subtree) in children {
                tree.graft(DependencyTree::ROOT, kind, key, subtree);
            }
            Ok(tree)
        })
    }

    /// Try each candidate in order, accepting the first non-missing
    /// result
    async fn resolve_candidates(
        &self,
        key: &str,
        value: &StringOrList,
        parent_src: &str,
        ancestry: &[String],
    ) -> ResolveResult<DependencyTree> {
        let mut last = None;
        for raw in value.candidates() {
            let source = DependencySource::parse(raw);
            let mut tree = self.resolve_source(&source, parent_src, ancestry).await?;
            tree.root_mut().raw = Some(raw.clone());
            let resolved = !tree.root().missing;
            last = Some(tree);
            if resolved {
                break;
            }
        }
        Ok(last.unwrap_or_else(|| {
            missing_tree(NodeKind::Typings, location::join_location(parent_src, key))
        }))
    }

    /// Dispatch one parsed dependency source
    pub(crate) async fn resolve_source(
        &self,
        source: &DependencySource,
        parent_src: &str,
        ancestry: &[String],
    ) -> ResolveResult<DependencyTree> {
        match source {
            DependencySource::Npm { name } => {
                self.resolve_npm_dependency(name, parent_src, ancestry).await
            },
            DependencySource::Bower { name } => {
                self.resolve_bower_named(name, parent_src, ancestry).await
            },
            DependencySource::Github { .. } => {
                let url = source.location();
                if location::is_definition(&url) {
                    Ok(definition_tree(url))
                } else {
                    self.expand_typings(url, None, Flags::NONE, ancestry).await
                }
            },
            DependencySource::Http { url } => {
                if location::is_definition(url) {
                    Ok(definition_tree(url.clone()))
                } else {
                    self.expand_typings(url.clone(), None, Flags::NONE, ancestry)
                        .await
                }
            },
            DependencySource::File { path } => {
                let loc = location::join_location(parent_src, path);
                if location::is_definition(&loc) {
                    Ok(definition_tree(loc))
                } else if loc.ends_with(".json") {
                    self.expand_typings(loc, None, Flags::NONE, ancestry).await
                } else {
                    // A directory: look for its native manifest.
                    let manifest = Utf8Path::new(&loc).join(discover::TYPINGS_MANIFEST);
                    self.expand_typings(manifest.into_string(), None, Flags::NONE, ancestry)
                        .await
                }
            },
        }
    }
}
