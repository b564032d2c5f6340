//! On-disk writers for compiled typings.
//!
//! Every mutating write goes through the per-path file lock so
//! concurrent tydi invocations cannot tear each other's files. The
//! aggregate reference listings are deduplicated, sorted, and keep the
//! EOL flavor already present in the file.

use std::collections::BTreeSet;

use camino::Utf8Path;
use tydi_compiler::parser;
use tydi_core::error::{TydiError, TydiResult};
use tydi_fetch::FileLock;

/// End-of-line sequence used for newly created files
const DEFAULT_EOL: &str = "\n";

/// Write a compiled declaration artifact, appending the final EOL
pub async fn write_declaration(path: &Utf8Path, content: &str) -> TydiResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TydiError::io(format!("Failed to create {parent}"), e))?;
    }

    let _lock = FileLock::acquire(path).await?;
    tokio::fs::write(path, format!("{content}{DEFAULT_EOL}"))
        .await
        .map_err(|e| TydiError::io(format!("Failed to write {path}"), e))
}

/// Merge reference paths into an aggregate listing file.
///
/// Existing references are kept; the result is one triple-slash
/// directive per line, deduplicated and sorted.
pub async fn update_reference_listing(path: &Utf8Path, references: &[String]) -> TydiResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TydiError::io(format!("Failed to create {parent}"), e))?;
    }

    let existing = tokio::fs::read_to_string(path).await.ok();
    let eol = existing.as_deref().map(detect_eol).unwrap_or(DEFAULT_EOL);

    let mut paths: BTreeSet<String> = existing
        .as_deref()
        .map(|content| {
            parser::parse_declaration(content)
                .references
                .into_iter()
                .filter(|reference| reference.kind == parser::ReferenceKind::Path)
                .map(|reference| reference.value)
                .collect()
        })
        .unwrap_or_default();
    paths.extend(references.iter().cloned());

    let mut content = String::new();
    for reference in &paths {
        content.push_str(&format!("/// <reference path=\"{reference}\" />{eol}"));
    }

    let _lock = FileLock::acquire(path).await?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| TydiError::io(format!("Failed to write {path}"), e))
}

/// The EOL flavor already used by a file
fn detect_eol(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        DEFAULT_EOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, root)
    }

    #[tokio::test]
    async fn test_write_declaration_appends_eol() {
        let (_temp, root) = fixture();
        let path = root.join("modules/a/main.d.ts");

        write_declaration(&path, "declare module 'a' {\n}").await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "declare module 'a' {\n}\n");
        assert!(!root.join("modules/a/main.d.ts.lock").exists());
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_deduplicated() {
        let (_temp, root) = fixture();
        let path = root.join("main.d.ts");

        update_reference_listing(
            &path,
            &[
                "modules/b/main.d.ts".to_string(),
                "modules/a/main.d.ts".to_string(),
                "modules/b/main.d.ts".to_string(),
            ],
        )
        .await
        .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            written,
            "/// <reference path=\"modules/a/main.d.ts\" />\n\
             /// <reference path=\"modules/b/main.d.ts\" />\n"
        );
    }

    #[tokio::test]
    async fn test_listing_keeps_existing_references() {
        let (_temp, root) = fixture();
        let path = root.join("main.d.ts");
        tokio::fs::write(&path, "/// <reference path=\"modules/old/main.d.ts\" />\n")
            .await
            .unwrap();

        update_reference_listing(&path, &["modules/new/main.d.ts".to_string()])
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("modules/old/main.d.ts"));
        assert!(written.contains("modules/new/main.d.ts"));
    }

    #[tokio::test]
    async fn test_listing_preserves_crlf() {
        let (_temp, root) = fixture();
        let path = root.join("main.d.ts");
        tokio::fs::write(&path, "/// <reference path=\"modules/old/main.d.ts\" />\r\n")
            .await
            .unwrap();

        update_reference_listing(&path, &["modules/new/main.d.ts".to_string()])
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.ends_with("\r\n"));
        assert!(!written.replace("\r\n", "").contains('\r'));
    }
}
