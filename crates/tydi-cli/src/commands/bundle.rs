//! `tydi bundle` command implementation.
//!
//! Compiles the whole project into one `{main, browser}` declaration
//! pair, printed to stdout or written beside each other on disk.

use camino::Utf8PathBuf;
use tracing::info;
use tydi_compiler::{compile, CompileOptions};
use tydi_core::error::TydiResult;
use tydi_core::utils::location;
use tydi_resolver::{ResolveOptions, Resolver};

use super::CommandContext;
use crate::writer;

pub async fn execute(
    name: Option<String>,
    out: Option<Utf8PathBuf>,
    dev: bool,
    ambient: bool,
    meta: bool,
    ctx: &CommandContext,
) -> TydiResult<()> {
    let resolver = Resolver::new(ctx.fetcher.clone());
    let tree = resolver
        .resolve_dependencies(&ResolveOptions {
            cwd: ctx.cwd.clone(),
            dev,
            ambient,
        })
        .await?;

    let name = name
        .or_else(|| tree.root().name.clone())
        .unwrap_or_else(|| "main".to_string());

    let output = compile(
        &tree,
        &ctx.fetcher,
        &CompileOptions {
            name,
            cwd: ctx.cwd.clone(),
            ambient,
            meta,
        },
    )
    .await?;

    match out {
        Some(out) => {
            let main_path = if out.is_absolute() {
                out
            } else {
                ctx.cwd.join(out)
            };
            let browser_path = Utf8PathBuf::from(format!(
                "{}.browser.d.ts",
                location::strip_definition(main_path.as_str())
            ));

            writer::write_declaration(&main_path, &output.main).await?;
            writer::write_declaration(&browser_path, &output.browser).await?;
            info!(main = %main_path, browser = %browser_path, "bundle written");
        },
        None => {
            println!("{}", output.main);
        },
    }

    Ok(())
}
