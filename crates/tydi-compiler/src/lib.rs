//! Declaration compilation for tydi.
//!
//! Takes a resolved dependency tree and produces the two concatenated
//! declaration artifacts (`main` and `browser`): each node's entry file
//! is located, parsed just enough to find module boundaries and
//! specifiers, rewritten into the node's tree-position namespace, and
//! emitted in deterministic post-order.
//!
//! ## Architecture
//!
//! - `entry`: entry declaration selection per node and target
//! - `parser`: the minimal declaration tokenizer
//! - `rewrite`: the namespacing walk producing output blocks
//! - `assemble`: block concatenation

mod assemble;
mod entry;
pub mod parser;
mod rewrite;

use camino::Utf8PathBuf;
use futures::future::join_all;
use tracing::debug;
use tydi_core::error::TydiError;
use tydi_core::types::DependencyTree;
use tydi_core::utils::location;
use tydi_fetch::Fetcher;

pub use entry::Target;

/// Result type for compile operations
pub type CompileResult<T> = Result<T, TydiError>;

/// Caller options for a compile run
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The root namespace every emitted module name derives from
    pub name: String,
    /// Base directory for provenance paths in meta headers
    pub cwd: Utf8PathBuf,
    /// Treat the root as globally declared (no module wrappers)
    pub ambient: bool,
    /// Prefix each block with compiler-version and source comments
    pub meta: bool,
}

/// The compiled artifact pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub main: String,
    pub browser: String,
}

/// Compile a resolved tree into its `main` and `browser` artifacts.
///
/// Deterministic: two runs over the same tree produce byte-identical
/// output regardless of fetch completion order.
pub async fn compile(
    tree: &DependencyTree,
    fetcher: &Fetcher,
    options: &CompileOptions,
) -> CompileResult<CompiledOutput> {
    let main = compile_target(tree, fetcher, options, Target::Main).await?;
    let browser = compile_target(tree, fetcher, options, Target::Browser).await?;
    Ok(CompiledOutput { main, browser })
}

async fn compile_target(
    tree: &DependencyTree,
    fetcher: &Fetcher,
    options: &CompileOptions,
    target: Target,
) -> CompileResult<String> {
    if fetcher.has_cache() {
        prefetch_entries(tree, fetcher, target).await;
    }

    rewrite::Emitter {
        tree,
        fetcher,
        options,
        target,
        blocks: Vec::new(),
    }
    .run()
    .await
}

/// Issue all remote entry fetches up front so they land in the cache in
/// parallel; the emission walk then reads them back in deterministic
/// order. Failures are ignored here and resurface during emission with
/// namespace context attached.
async fn prefetch_entries(tree: &DependencyTree, fetcher: &Fetcher, target: Target) {
    let mut locations = Vec::new();
    for (id, node) in tree.nodes() {
        if node.missing {
            continue;
        }
        if let Ok(loc) = entry::resolve_entry(tree, id, target, "").await {
            if location::is_http(&loc) {
                locations.push(loc);
            }
        }
    }

    debug!(count = locations.len(), "prefetching remote entries");
    join_all(locations.iter().map(|loc| fetcher.read_text(loc))).await;
}

#[cfg(test)]
mod tests;
