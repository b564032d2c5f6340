//! Compile tests over constructed trees and on-disk fixtures.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tydi_core::types::{BrowserField, DependencyKind, DependencyTree, NodeKind, TreeNode};
use tydi_core::TydiError;
use tydi_fetch::{FetchConfig, Fetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{compile, parser, CompileOptions};

fn fetcher() -> Fetcher {
    Fetcher::new(FetchConfig::default()).unwrap()
}

fn fixture() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

async fn write(root: &Utf8Path, rel: &str, content: &str) {
    let path = root.join(rel);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, content).await.unwrap();
}

fn options(name: &str, cwd: &Utf8Path) -> CompileOptions {
    CompileOptions {
        name: name.to_string(),
        cwd: cwd.to_path_buf(),
        ambient: false,
        meta: false,
    }
}

/// A project with an npm dependency carrying browser typings, a bower
/// dependency remapped by the root's browser field, and a native
/// dependency whose entry imports a sibling file.
async fn normal_project(root: &Utf8Path) -> DependencyTree {
    write(
        root,
        "root.d.ts",
        "import a from 'a';\nimport b from 'b';\nimport dep from 'dep';\nimport ri from './root-import';\nexport const root: string;\n",
    )
    .await;
    write(root, "root-import.d.ts", "export const imported: string;\n").await;
    write(
        root,
        "node_modules/a/typed.d.ts",
        "export function a(): void;\n",
    )
    .await;
    write(
        root,
        "node_modules/a/typed.browser.d.ts",
        "export function aBrowser(): void;\n",
    )
    .await;
    write(
        root,
        "bower_components/b/typings/b.d.ts",
        "export const b: number;\n",
    )
    .await;
    write(root, "browser.d.ts", "export const bBrowser: number;\n").await;
    write(
        root,
        "dep/main.d.ts",
        "import p from './path';\nexport const dep: string;\n",
    )
    .await;
    write(root, "dep/path.d.ts", "export const path: string;\n").await;

    let mut browser_map = BTreeMap::new();
    browser_map.insert("b".to_string(), "browser.d.ts".to_string());

    let mut tree = DependencyTree::new(TreeNode {
        name: Some("root".to_string()),
        typings: Some("root.d.ts".to_string()),
        browser: Some(BrowserField::Map(browser_map)),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Normal,
        "a",
        DependencyTree::new(TreeNode {
            typings: Some("typed.d.ts".to_string()),
            browser_typings: Some("typed.browser.d.ts".to_string()),
            ..TreeNode::new(
                NodeKind::Npm,
                root.join("node_modules/a/package.json").as_str(),
            )
        }),
    );
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Normal,
        "b",
        DependencyTree::new(TreeNode {
            typings: Some("typings/b.d.ts".to_string()),
            ..TreeNode::new(
                NodeKind::Bower,
                root.join("bower_components/b/bower.json").as_str(),
            )
        }),
    );
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Normal,
        "dep",
        DependencyTree::new(TreeNode {
            main: Some("dep/main.d.ts".to_string()),
            ..TreeNode::new(NodeKind::Typings, root.join("dep.json").as_str())
        }),
    );
    tree
}

#[tokio::test]
async fn test_normal_compile() {
    let (_temp, root) = fixture();
    let tree = normal_project(&root).await;

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    let expected_main = concat!(
        "declare module 'root~a' {\n",
        "export function a(): void;\n",
        "}\n",
        "\n",
        "declare module 'root~b' {\n",
        "export const b: number;\n",
        "}\n",
        "\n",
        "declare module 'root~dep/path' {\n",
        "export const path: string;\n",
        "}\n",
        "\n",
        "declare module 'root~dep' {\n",
        "import p from 'root~dep/path';\n",
        "export const dep: string;\n",
        "}\n",
        "\n",
        "declare module 'root/root-import' {\n",
        "export const imported: string;\n",
        "}\n",
        "\n",
        "declare module 'root/root' {\n",
        "import a from 'root~a';\n",
        "import b from 'root~b';\n",
        "import dep from 'root~dep';\n",
        "import ri from 'root/root-import';\n",
        "export const root: string;\n",
        "}\n",
        "\n",
        "declare module 'root' {\n",
        "export * from 'root/root';\n",
        "}"
    );
    assert_eq!(output.main, expected_main);

    // The browser artifact swaps the `a` and `b` bodies for their
    // browser variants and is otherwise identical.
    let expected_browser = expected_main
        .replace("export function a(): void;", "export function aBrowser(): void;")
        .replace("export const b: number;", "export const bBrowser: number;");
    assert_eq!(output.browser, expected_browser);
}

#[tokio::test]
async fn test_compile_is_deterministic() {
    let (_temp, root) = fixture();
    let tree = normal_project(&root).await;
    let fetcher = fetcher();
    let options = options("root", &root);

    let first = compile(&tree, &fetcher, &options).await.unwrap();
    let second = compile(&tree, &fetcher, &options).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_browser_namespaces_match_main() {
    let (_temp, root) = fixture();
    let tree = normal_project(&root).await;

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    let names = |text: &str| -> Vec<String> {
        parser::parse_declaration(text)
            .modules
            .into_iter()
            .map(|block| block.name)
            .collect()
    };
    assert_eq!(names(&output.main), names(&output.browser));
}

#[tokio::test]
async fn test_output_reparses_to_same_modules() {
    let (_temp, root) = fixture();
    let tree = normal_project(&root).await;

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    let reparsed = parser::parse_declaration(&output.main);
    let names: Vec<&str> = reparsed.modules.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "root~a",
            "root~b",
            "root~dep/path",
            "root~dep",
            "root/root-import",
            "root/root",
            "root",
        ]
    );
}

#[tokio::test]
async fn test_export_equals_alias() {
    let (_temp, root) = fixture();
    write(
        &root,
        "file.d.ts",
        "function foo(value: string): foo.Bar;\n\nmodule foo {\n  export interface Bar {\n    value: string;\n  }\n}\n\nexport = foo;\n",
    )
    .await;

    let tree = DependencyTree::new(TreeNode {
        main: Some("file.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let output = compile(&tree, &fetcher(), &options("foobar", &root))
        .await
        .unwrap();

    let expected = concat!(
        "declare module 'foobar/file' {\n",
        "function foo(value: string): foo.Bar;\n",
        "\n",
        "module foo {\n",
        "  export interface Bar {\n",
        "    value: string;\n",
        "  }\n",
        "}\n",
        "\n",
        "export = foo;\n",
        "}\n",
        "\n",
        "declare module 'foobar' {\n",
        "import main = require('foobar/file');\n",
        "export = main;\n",
        "}"
    );
    assert_eq!(output.main, expected);
}

#[tokio::test]
async fn test_ambient_compile_emits_verbatim() {
    let (_temp, root) = fixture();
    write(&root, "root.d.ts", "declare var __dirname: string;\n").await;
    write(
        &root,
        "fs.d.ts",
        "declare module 'fs' {\nexport function readFileSync(path: string): any;\n}\n",
    )
    .await;

    let mut tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });
    let fs_src = root.join("fs.d.ts");
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Ambient,
        "fs",
        DependencyTree::new(TreeNode {
            typings: Some(fs_src.to_string()),
            ..TreeNode::new(NodeKind::File, fs_src.as_str())
        }),
    );

    let output = compile(
        &tree,
        &fetcher(),
        &CompileOptions {
            ambient: true,
            ..options("test", &root)
        },
    )
    .await
    .unwrap();

    let expected = concat!(
        "declare module 'fs' {\n",
        "export function readFileSync(path: string): any;\n",
        "}\n",
        "\n",
        "declare var __dirname: string;"
    );
    assert_eq!(output.main, expected);
}

#[tokio::test]
async fn test_missing_root_fails_compile() {
    let (_temp, root) = fixture();
    let tree = DependencyTree::new(TreeNode::missing(
        NodeKind::Typings,
        root.join("typings.json").as_str(),
    ));

    let err = compile(&tree, &fetcher(), &options("test", &root))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing dependency \"test\", unable to compile dependency tree"
    );
}

#[tokio::test]
async fn test_missing_dependency_reports_namespaced_name() {
    let (_temp, root) = fixture();
    write(&root, "root.d.ts", "export const root: string;\n").await;

    let mut tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Normal,
        "ghost",
        DependencyTree::new(TreeNode::missing(
            NodeKind::Npm,
            root.join("node_modules/ghost/package.json").as_str(),
        )),
    );

    let err = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap_err();
    match err {
        TydiError::MissingDependency { name } => assert_eq!(name, "root~ghost"),
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_entry_fails_compile() {
    let (_temp, root) = fixture();
    let tree = DependencyTree::new(TreeNode::new(
        NodeKind::Npm,
        root.join("package.json").as_str(),
    ));

    let err = compile(&tree, &fetcher(), &options("main", &root))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to resolve entry \".d.ts\" file for \"main\""
    );
}

#[tokio::test]
async fn test_http_entry_compiles_under_root_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.d.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("export const helloWorld: string"))
        .mount(&server)
        .await;

    let (_temp, root) = fixture();
    let tree = DependencyTree::new(TreeNode {
        typings: Some("index.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, format!("{}/typings.json", server.uri()))
    });

    let output = compile(&tree, &fetcher(), &options("test", &root))
        .await
        .unwrap();

    assert_eq!(
        output.main,
        "declare module 'test' {\nexport const helloWorld: string\n}"
    );
    assert_eq!(output.browser, output.main);
}

#[tokio::test]
async fn test_reference_path_pulls_file_in() {
    let (_temp, root) = fixture();
    write(
        &root,
        "root.d.ts",
        "/// <reference path=\"./refd.d.ts\" />\nexport const root: string;\n",
    )
    .await;
    write(&root, "refd.d.ts", "export const refd: number;\n").await;

    let tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    assert!(output.main.contains("declare module 'root/refd' {"));
    assert!(!output.main.contains("<reference"));
    let refd = output.main.find("'root/refd'").unwrap();
    let entry = output.main.find("'root/root'").unwrap();
    assert!(refd < entry);
}

#[tokio::test]
async fn test_import_of_ambient_dependency_is_unchanged() {
    let (_temp, root) = fixture();
    write(
        &root,
        "root.d.ts",
        "import 'node';\nexport const root: string;\n",
    )
    .await;
    write(&root, "node.d.ts", "declare var process: any;\n").await;

    let mut tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });
    let node_src = root.join("node.d.ts");
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Ambient,
        "node",
        DependencyTree::new(TreeNode {
            typings: Some(node_src.to_string()),
            ..TreeNode::new(NodeKind::File, node_src.as_str())
        }),
    );

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    assert!(output.main.contains("import 'node';"));
    assert!(output.main.contains("declare var process: any;"));
}

#[tokio::test]
async fn test_unresolved_specifier_fails() {
    let (_temp, root) = fixture();
    write(&root, "root.d.ts", "import x from 'mystery';\n").await;

    let tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let err = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap_err();
    match err {
        TydiError::UnresolvedSpecifier { specifier, .. } => assert_eq!(specifier, "mystery"),
        other => panic!("expected UnresolvedSpecifier, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sibling_import_cycle_terminates() {
    let (_temp, root) = fixture();
    write(
        &root,
        "entry.d.ts",
        "import s from './sibling';\nexport const entry: string;\n",
    )
    .await;
    write(
        &root,
        "sibling.d.ts",
        "import e from './entry';\nexport const sibling: string;\n",
    )
    .await;

    let tree = DependencyTree::new(TreeNode {
        typings: Some("entry.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    assert_eq!(output.main.matches("declare module 'root/sibling'").count(), 1);
    assert_eq!(output.main.matches("declare module 'root/entry'").count(), 1);
    // The sibling's back-reference points at the entry's module name.
    assert!(output.main.contains("import e from 'root/entry';"));
}

#[tokio::test]
async fn test_inline_module_blocks_are_hoisted_and_renamed() {
    let (_temp, root) = fixture();
    write(
        &root,
        "root.d.ts",
        "declare module \"sub\" {\nexport const sub: string;\n}\nimport s from 'sub';\nexport const root: string;\n",
    )
    .await;

    let tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    assert!(output.main.contains("declare module \"root/sub\" {"));
    assert!(output.main.contains("import s from 'root/sub';"));
    // The hoisted block is not nested inside the wrapper.
    let wrapper = output.main.find("declare module 'root/root'").unwrap();
    let inline = output.main.find("declare module \"root/sub\"").unwrap();
    assert!(inline < wrapper);
}

#[tokio::test]
async fn test_meta_headers() {
    let (_temp, root) = fixture();
    write(&root, "root.d.ts", "export const root: string;\n").await;

    let tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });

    let output = compile(
        &tree,
        &fetcher(),
        &CompileOptions {
            meta: true,
            ..options("root", &root)
        },
    )
    .await
    .unwrap();

    let version = env!("CARGO_PKG_VERSION");
    assert!(output.main.starts_with(&format!("// Generated by tydi {version}\n")));
    assert!(output.main.contains("// Source: root.d.ts\n"));
}

#[tokio::test]
async fn test_dev_dependencies_emit_after_normal() {
    let (_temp, root) = fixture();
    write(&root, "root.d.ts", "export const root: string;\n").await;
    write(&root, "z.d.ts", "export const z: string;\n").await;
    write(&root, "d.d.ts", "export const d: string;\n").await;

    let mut tree = DependencyTree::new(TreeNode {
        typings: Some("root.d.ts".to_string()),
        ..TreeNode::new(NodeKind::Typings, root.join("typings.json").as_str())
    });
    let z_src = root.join("z.d.ts");
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Normal,
        "z",
        DependencyTree::new(TreeNode {
            typings: Some(z_src.to_string()),
            ..TreeNode::new(NodeKind::File, z_src.as_str())
        }),
    );
    let d_src = root.join("d.d.ts");
    tree.graft(
        DependencyTree::ROOT,
        DependencyKind::Dev,
        "d",
        DependencyTree::new(TreeNode {
            typings: Some(d_src.to_string()),
            ..TreeNode::new(NodeKind::File, d_src.as_str())
        }),
    );

    let output = compile(&tree, &fetcher(), &options("root", &root))
        .await
        .unwrap();

    // The map sequence is fixed: normal before dev, despite 'd' < 'z'.
    let z = output.main.find("declare module 'root~z'").unwrap();
    let d = output.main.find("declare module 'root~d'").unwrap();
    assert!(z < d);
}
