//! Namespacing rewriter.
//!
//! Walks the resolved tree in post-order and turns every non-missing
//! node's declaration files into output blocks: module specifiers are
//! rewritten into tree-position namespaces, relative imports pull their
//! files into the same node, inline `declare module` blocks are renamed
//! and hoisted, and non-ambient bodies are wrapped in a `declare module`
//! for the node's namespace.

use std::collections::HashSet;

use futures::future::BoxFuture;
use tracing::debug;
use tydi_core::error::TydiError;
use tydi_core::types::{DependencyKind, DependencyTree, NodeId, TreeNode};
use tydi_core::utils::location;
use tydi_fetch::Fetcher;

use crate::entry::{self, Target};
use crate::parser::{self, ReferenceKind, Span};
use crate::{assemble, CompileOptions, CompileResult};

/// A byte-range replacement against a source file
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    span: Span,
    replacement: String,
}

/// Apply the edits that fall inside `region`, returning the rewritten
/// slice. Edits are applied in span order; an edit overlapping an
/// already-consumed range is dropped.
pub(crate) fn apply_edits(source: &str, region: Span, mut edits: Vec<Edit>) -> String {
    edits.retain(|edit| region.contains(&edit.span));
    edits.sort_by_key(|edit| edit.span.start);

    let mut out = String::new();
    let mut cursor = region.start;
    for edit in edits {
        if edit.span.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..region.end]);
    out
}

/// Per-node emission state
struct NodeCtx<'a> {
    node: &'a TreeNode,
    namespace: String,
    ambient: bool,
    is_root: bool,
    entry: String,
    entry_dir: String,
    /// Files already emitted for this node; breaks import cycles
    visited: HashSet<String>,
    entry_export_assignment: bool,
}

/// One target's walk over the tree, accumulating output blocks
pub(crate) struct Emitter<'a> {
    pub tree: &'a DependencyTree,
    pub fetcher: &'a Fetcher,
    pub options: &'a CompileOptions,
    pub target: Target,
    pub blocks: Vec<String>,
}

impl<'a> Emitter<'a> {
    pub(crate) async fn run(mut self) -> CompileResult<String> {
        self.emit_node(DependencyTree::ROOT, self.options.name.clone(), false)
            .await?;
        Ok(assemble::join_blocks(&self.blocks))
    }

    /// Emit a node's dependencies (post-order, fixed map sequence,
    /// alphabetical keys) and then the node's own files.
    fn emit_node<'s>(
        &'s mut self,
        id: NodeId,
        namespace: String,
        via_ambient: bool,
    ) -> BoxFuture<'s, CompileResult<()>> {
        Box::pin(async move {
            let tree = self.tree;
            let node = tree.node(id);

            if node.missing {
                return Err(TydiError::MissingDependency { name: namespace });
            }

            for kind in DependencyKind::ALL {
                for (key, child) in node.children(kind) {
                    self.emit_node(
                        *child,
                        format!("{namespace}~{key}"),
                        via_ambient || kind.is_ambient(),
                    )
                    .await?;
                }
            }

            let is_root = id == DependencyTree::ROOT;
            let ambient = via_ambient || node.ambient || (is_root && self.options.ambient);
            let entry = entry::resolve_entry(tree, id, self.target, &namespace).await?;
            debug!(namespace = %namespace, entry = %entry, "emitting node");

            let mut ctx = NodeCtx {
                node,
                namespace,
                ambient,
                is_root,
                entry_dir: location::location_dir(&entry),
                entry: entry.clone(),
                visited: HashSet::new(),
                entry_export_assignment: false,
            };
            self.emit_file(&mut ctx, entry, true).await?;

            if ctx.is_root && !ctx.ambient && !location::is_http(&ctx.entry) {
                self.emit_root_alias(&ctx);
            }
            Ok(())
        })
    }

    /// Emit one declaration file of a node: files it pulls in first,
    /// then its own block(s).
    fn emit_file<'s>(
        &'s mut self,
        ctx: &'s mut NodeCtx<'a>,
        loc: String,
        is_entry: bool,
    ) -> BoxFuture<'s, CompileResult<()>> {
        Box::pin(async move {
            if !ctx.visited.insert(loc.clone()) {
                return Ok(());
            }

            let text = self
                .fetcher
                .read_text(&loc)
                .await
                .map_err(|e| TydiError::typings_read_failure(ctx.namespace.clone(), e))?;
            let parsed = parser::parse_declaration(&text);
            if is_entry {
                ctx.entry_export_assignment = parsed.has_export_assignment;
            }

            let mut edits: Vec<Edit> = Vec::new();
            let mut pending_files: Vec<String> = Vec::new();

            for reference in &parsed.references {
                edits.push(Edit {
                    span: reference.line,
                    replacement: String::new(),
                });
                if reference.kind == ReferenceKind::Path {
                    pending_files.push(location::join_location(&loc, &reference.value));
                }
            }

            if !ctx.ambient {
                for spec in &parsed.specifiers {
                    // A dependency reference keeps its namespace on every
                    // target; the browser field overrides the dependency's
                    // entry file, not references to it.
                    if let Some(kind) = dependency_kind_of(ctx.node, &spec.value) {
                        if !kind.is_ambient() {
                            edits.push(Edit {
                                span: spec.span,
                                replacement: format!("{}~{}", ctx.namespace, spec.value),
                            });
                        }
                        continue;
                    }

                    let value = match (self.target, &ctx.node.browser) {
                        (Target::Browser, Some(browser)) => browser.remap(&spec.value).to_string(),
                        _ => spec.value.clone(),
                    };

                    if value.starts_with("./") || value.starts_with("../") {
                        let resolved = definition_location(&loc, &value);
                        let is_entry_file = resolved == ctx.entry;
                        edits.push(Edit {
                            span: spec.span,
                            replacement: file_module_name(ctx, &resolved, is_entry_file),
                        });
                        pending_files.push(resolved);
                    } else if parsed.modules.iter().any(|block| block.name == value) {
                        edits.push(Edit {
                            span: spec.span,
                            replacement: inline_module_name(ctx, &value),
                        });
                    } else {
                        return Err(TydiError::UnresolvedSpecifier {
                            specifier: value,
                            file: loc.clone(),
                        });
                    }
                }
            }

            for pending in pending_files {
                self.emit_file(ctx, pending, false).await?;
            }

            let header = self.meta_header(&loc);

            if ctx.ambient {
                // Globally declared names pass through without a wrapper.
                let body = apply_edits(&text, Span { start: 0, end: text.len() }, edits);
                let body = body.trim();
                if !body.is_empty() {
                    self.blocks.push(format!("{header}{body}"));
                }
                return Ok(());
            }

            // Inline module blocks hoist to the top level under renamed
            // namespaces; the rest of the file wraps under its own name.
            let mut edits = edits;
            for block in &parsed.modules {
                edits.push(Edit {
                    span: block.name_span,
                    replacement: inline_module_name(ctx, &block.name),
                });
            }
            for block in &parsed.modules {
                let content = apply_edits(&text, block.outer, edits.clone());
                self.blocks.push(format!("{header}{}", content.trim()));
            }

            for block in &parsed.modules {
                edits.push(Edit {
                    span: block.outer,
                    replacement: String::new(),
                });
            }
            let remaining = apply_edits(&text, Span { start: 0, end: text.len() }, edits);
            let remaining = remaining.trim();
            if !remaining.is_empty() {
                let name = file_module_name(ctx, &loc, is_entry);
                self.blocks
                    .push(format!("{header}declare module '{name}' {{\n{remaining}\n}}"));
            }
            Ok(())
        })
    }

    /// The root's addressable alias: re-export the entry file's module,
    /// or forward its export assignment.
    fn emit_root_alias(&mut self, ctx: &NodeCtx<'a>) {
        let entry_name = file_module_name(ctx, &ctx.entry, false);
        let body = if ctx.entry_export_assignment {
            format!("import main = require('{entry_name}');\nexport = main;")
        } else {
            format!("export * from '{entry_name}';")
        };
        let header = self.meta_header(&ctx.entry);
        self.blocks.push(format!(
            "{header}declare module '{}' {{\n{body}\n}}",
            ctx.namespace
        ));
    }

    /// Provenance comment lines, when the `meta` option is on
    fn meta_header(&self, loc: &str) -> String {
        if !self.options.meta {
            return String::new();
        }
        let source = if location::is_http(loc) {
            loc.to_string()
        } else {
            location::relative_path(self.options.cwd.as_str(), loc)
        };
        format!(
            "// Generated by tydi {}\n// Source: {source}\n",
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// The namespace of one file within a node.
///
/// The entry file is addressed by the node namespace itself, except for
/// a root compiled from a local entry, whose files all live under
/// `name/<path>` with a separate alias block.
fn file_module_name(ctx: &NodeCtx, loc: &str, is_entry: bool) -> String {
    if is_entry && (!ctx.is_root || location::is_http(&ctx.entry)) {
        return ctx.namespace.clone();
    }
    let rel = location::relative_path(&ctx.entry_dir, loc);
    format!("{}/{}", ctx.namespace, location::strip_definition(&rel))
}

/// The namespace of an inline `declare module "SUB"` block
fn inline_module_name(ctx: &NodeCtx, sub: &str) -> String {
    if sub.starts_with("./") || sub.starts_with("../") {
        let resolved = location::join_location(&ctx.entry, sub);
        let mut rel = location::relative_path(&ctx.entry_dir, &resolved);
        if let Some(name) = &ctx.node.name {
            if let Some(stripped) = rel.strip_prefix(&format!("{name}/")) {
                rel = stripped.to_string();
            }
        }
        format!("{}/{}", ctx.namespace, location::strip_definition(&rel))
    } else {
        format!("{}/{sub}", ctx.namespace)
    }
}

/// Which dependency map of `node` holds `name`, if any
fn dependency_kind_of(node: &TreeNode, name: &str) -> Option<DependencyKind> {
    DependencyKind::ALL
        .into_iter()
        .find(|kind| node.children(*kind).contains_key(name))
}

/// Resolve a relative specifier to the declaration file it names
fn definition_location(current: &str, specifier: &str) -> String {
    let joined = location::join_location(current, specifier);
    entry::definition_candidate(&joined)
}
