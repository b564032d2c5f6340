//! bower ecosystem expansion.
//!
//! The bower root is the nearest `bower.json` upward from the starting
//! directory; `.bowerrc` beside it may relocate the components
//! directory. Bower installs are flat, so every dependency at any depth
//! resolves through the same components directory.

use camino::{Utf8Path, Utf8PathBuf};
use futures::future::{try_join_all, BoxFuture};
use tydi_config::discover::{self, BOWERRC, BOWER_MANIFEST, DEFAULT_COMPONENTS_DIR};
use tydi_config::{BowerJson, BowerRc};
use tydi_core::types::{DependencyKind, DependencyTree, NodeKind};
use tydi_core::utils::location;

use crate::{
    check_cycle, definition_tree, extend_ancestry, missing_tree, Flags, ResolveOptions,
    ResolveResult, Resolver,
};

impl Resolver {
    pub(crate) async fn resolve_bower_tree(
        &self,
        options: &ResolveOptions,
        flags: Flags,
    ) -> ResolveResult<DependencyTree> {
        let Some(path) = discover::find_up(&options.cwd, BOWER_MANIFEST).await else {
            return Ok(missing_tree(
                NodeKind::Bower,
                options.cwd.join(BOWER_MANIFEST).as_str(),
            ));
        };

        let dir = path.parent().unwrap_or(&options.cwd).to_path_buf();
        let components = self.bower_components_dir(&dir).await?;
        self.expand_bower(path.as_str().to_string(), &components, flags, &[])
            .await
    }

    /// The components directory configured beside a bower root
    async fn bower_components_dir(&self, dir: &Utf8Path) -> ResolveResult<Utf8PathBuf> {
        let rc_path = dir.join(BOWERRC);
        let rc: BowerRc = match self.fetcher().read_json(rc_path.as_str()).await {
            Ok(rc) => rc,
            Err(e) if e.is_local_recoverable() => BowerRc::default(),
            Err(e) => return Err(e),
        };
        Ok(dir.join(rc.components_dir()))
    }

    /// Expand one `bower.json` into a subtree.
    pub(crate) fn expand_bower<'a>(
        &'a self,
        src: String,
        components: &'a Utf8Path,
        flags: Flags,
        ancestry: &'a [String],
    ) -> BoxFuture<'a, ResolveResult<DependencyTree>> {
        Box::pin(async move {
            check_cycle(ancestry, &src)?;

            let manifest: BowerJson = match self.fetcher().read_json(&src).await {
                Ok(manifest) => manifest,
                Err(e) if e.is_local_recoverable() => {
                    return Ok(missing_tree(NodeKind::Bower, src));
                },
                Err(e) => return Err(e),
            };

            let runtime = manifest.dependencies.clone();
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
                    async move {
                        let subtree = self
                            .resolve_bower_dependency(&name, components, ancestry)
                            .await?;
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

    /// Locate and expand one bower dependency inside the components
    /// directory, with the `.d.ts` short-circuit.
    pub(crate) async fn resolve_bower_dependency(
        &self,
        name: &str,
        components: &Utf8Path,
        ancestry: &[String],
    ) -> ResolveResult<DependencyTree> {
        if location::is_definition(name) {
            return Ok(definition_tree(components.join(name).into_string()));
        }
        self.expand_bower(
            components.join(name).join(BOWER_MANIFEST).into_string(),
            components,
            Flags::NONE,
            ancestry,
        )
        .await
    }

    /// Resolve a `bower:NAME` dependency declared in a native manifest.
    ///
    /// The components directory is rediscovered relative to the declaring
    /// manifest since native manifests can sit anywhere.
    pub(crate) async fn resolve_bower_named(
        &self,
        name: &str,
        parent_src: &str,
        ancestry: &[String],
    ) -> ResolveResult<DependencyTree> {
        if location::is_http(parent_src) {
            return Ok(missing_tree(
                NodeKind::Bower,
                location::join_location(parent_src, name),
            ));
        }

        let dir = location::location_dir(parent_src);
        let components = match discover::find_up(Utf8Path::new(&dir), BOWERRC).await {
            Some(rc_path) => {
                let base = rc_path
                    .parent()
                    .map(Utf8Path::to_path_buf)
                    .unwrap_or_else(|| Utf8PathBuf::from(dir.clone()));
                let rc: BowerRc = match self.fetcher().read_json(rc_path.as_str()).await {
                    Ok(rc) => rc,
                    Err(e) if e.is_local_recoverable() => BowerRc::default(),
                    Err(e) => return Err(e),
                };
                base.join(rc.components_dir())
            },
            None => match discover::find_up(Utf8Path::new(&dir), DEFAULT_COMPONENTS_DIR).await {
                Some(found) => found,
                None => {
                    return Ok(missing_tree(
                        NodeKind::Bower,
                        format!("{dir}/{DEFAULT_COMPONENTS_DIR}/{name}/{BOWER_MANIFEST}"),
                    ))
                },
            },
        };

        self.resolve_bower_dependency(name, &components, ancestry).await
    }
}
