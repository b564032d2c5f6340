//! Upward manifest discovery.
//!
//! Each ecosystem is located by walking from the starting directory
//! toward the filesystem root until its manifest is found, mirroring how
//! the package tools themselves pick a project root.

use camino::{Utf8Path, Utf8PathBuf};

/// Native manifest filename
pub const TYPINGS_MANIFEST: &str = "typings.json";
/// npm manifest filename
pub const NPM_MANIFEST: &str = "package.json";
/// bower manifest filename
pub const BOWER_MANIFEST: &str = "bower.json";
/// bower configuration filename
pub const BOWERRC: &str = ".bowerrc";
/// Fallback components directory when `.bowerrc` has none
pub const DEFAULT_COMPONENTS_DIR: &str = "bower_components";

/// Walk upward from `start` until `target` exists, returning its path.
///
/// `target` may be a multi-segment relative path such as
/// `node_modules/lodash`.
pub async fn find_up(start: &Utf8Path, target: &str) -> Option<Utf8PathBuf> {
    let mut current = start;

    loop {
        let candidate = current.join(target);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}
