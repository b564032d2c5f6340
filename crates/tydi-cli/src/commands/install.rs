//! `tydi install` command implementation.
//!
//! Resolves the project tree, compiles every root dependency into its
//! own declaration pair under the typings directory, and refreshes the
//! aggregate reference listings.

use camino::Utf8Path;
use tracing::{info, warn};
use tydi_compiler::{compile, CompileOptions};
use tydi_core::error::TydiResult;
use tydi_core::types::DependencyKind;
use tydi_resolver::{ResolveOptions, Resolver};

use super::CommandContext;
use crate::writer;

pub async fn execute(
    dev: bool,
    ambient: bool,
    out: &Utf8Path,
    ctx: &CommandContext,
) -> TydiResult<()> {
    info!("resolving dependency tree");
    let resolver = Resolver::new(ctx.fetcher.clone());
    let tree = resolver
        .resolve_dependencies(&ResolveOptions {
            cwd: ctx.cwd.clone(),
            dev,
            ambient,
        })
        .await?;

    let out_dir = if out.is_absolute() {
        out.to_path_buf()
    } else {
        ctx.cwd.join(out)
    };

    let mut main_references = Vec::new();
    let mut browser_references = Vec::new();
    let mut installed = 0usize;

    for kind in DependencyKind::ALL {
        for (key, id) in tree.root().children(kind) {
            let subtree = tree.subtree(*id);
            if subtree.root().missing {
                warn!(name = %key, "skipping missing dependency");
                continue;
            }

            info!(name = %key, "compiling");
            let options = CompileOptions {
                name: key.clone(),
                cwd: ctx.cwd.clone(),
                ambient: kind.is_ambient(),
                meta: true,
            };
            let output = compile(&subtree, &ctx.fetcher, &options).await?;

            let module_dir = out_dir.join("modules").join(key);
            writer::write_declaration(&module_dir.join("main.d.ts"), &output.main).await?;
            writer::write_declaration(&module_dir.join("browser.d.ts"), &output.browser).await?;

            main_references.push(format!("modules/{key}/main.d.ts"));
            browser_references.push(format!("modules/{key}/browser.d.ts"));
            installed += 1;
        }
    }

    writer::update_reference_listing(&out_dir.join("main.d.ts"), &main_references).await?;
    writer::update_reference_listing(&out_dir.join("browser.d.ts"), &browser_references).await?;

    info!(installed, "install complete");
    Ok(())
}
