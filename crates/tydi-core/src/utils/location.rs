//! Location utilities for manifest and declaration files.
//!
//! A "location" is either an absolute filesystem path or an absolute
//! HTTP(S) URL; every function here works on both so the resolver and
//! compiler never branch on transport.

use camino::{Utf8Path, Utf8PathBuf};
use url::Url;

/// The extension carried by declaration files
pub const DEFINITION_EXT: &str = ".d.ts";

/// Check whether a location is an HTTP(S) URL
pub fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Check whether a location points at a declaration file
pub fn is_definition(location: &str) -> bool {
    // Query strings and fragments do not survive into filesystem paths,
    // so only URLs need them stripped before the suffix check.
    let location = location
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(location);
    location.ends_with(DEFINITION_EXT)
}

/// The canonical declaration filename for a dependency name
pub fn to_definition(name: &str) -> String {
    format!("{name}{DEFINITION_EXT}")
}

/// Strip the declaration extension when present
pub fn strip_definition(location: &str) -> &str {
    location.strip_suffix(DEFINITION_EXT).unwrap_or(location)
}

/// Resolve `child` against the location of a parent file.
///
/// Absolute children (URL or absolute path) pass through. A relative
/// child resolves against the parent's containing directory, as a URL
/// when the parent is HTTP and as a normalized path otherwise.
pub fn join_location(parent: &str, child: &str) -> String {
    if is_http(child) {
        return child.to_string();
    }
    if Utf8Path::new(child).is_absolute() {
        return normalize(Utf8Path::new(child)).into_string();
    }
    if is_http(parent) {
        if let Ok(base) = Url::parse(parent) {
            if let Ok(joined) = base.join(child) {
                return joined.to_string();
            }
        }
        return format!("{}/{}", location_dir(parent), child);
    }
    let dir = Utf8Path::new(parent).parent().unwrap_or(Utf8Path::new(""));
    normalize(&dir.join(child)).into_string()
}

/// The containing directory of a file location, without a trailing slash
pub fn location_dir(location: &str) -> String {
    if is_http(location) {
        match location.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => location.to_string(),
        }
    } else {
        Utf8Path::new(location)
            .parent()
            .unwrap_or(Utf8Path::new(""))
            .to_string()
    }
}

/// Normalize a path by resolving `.` and `..` components
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut components: Vec<camino::Utf8Component> = Vec::new();

    for component in path.components() {
        match component {
            camino::Utf8Component::CurDir => {},
            camino::Utf8Component::ParentDir => match components.last() {
                Some(camino::Utf8Component::Normal(_)) => {
                    components.pop();
                },
                Some(camino::Utf8Component::RootDir) | Some(camino::Utf8Component::Prefix(_)) => {},
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    components.iter().map(|c| c.as_str()).collect()
}

/// Express `to` relative to the directory location `from_dir`.
///
/// Used to derive file namespaces, so the result always uses forward
/// slashes. Locations outside `from_dir` keep explicit `..` segments.
pub fn relative_path(from_dir: &str, to: &str) -> String {
    if is_http(from_dir) || is_http(to) {
        let base = format!("{}/", from_dir.trim_end_matches('/'));
        return match to.strip_prefix(&base) {
            Some(relative) => relative.to_string(),
            None => to.to_string(),
        };
    }

    let from = normalize(Utf8Path::new(from_dir));
    let to = normalize(Utf8Path::new(to));

    let from_components: Vec<&str> = from.components().map(|c| c.as_str()).collect();
    let to_components: Vec<&str> = to.components().map(|c| c.as_str()).collect();

    let shared = from_components
        .iter()
        .zip(to_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = Vec::new();
    segments.resize(from_components.len() - shared, "..");
    segments.extend(&to_components[shared..]);
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http() {
        assert!(is_http("http://example.com/typings.json"));
        assert!(is_http("https://example.com/typings.json"));
        assert!(!is_http("/home/user/typings.json"));
        assert!(!is_http("httpx://example.com"));
    }

    #[test]
    fn test_is_definition() {
        assert!(is_definition("typings/main.d.ts"));
        assert!(is_definition("http://example.com/index.d.ts?raw=1"));
        assert!(!is_definition("index.ts"));
        assert!(!is_definition("typings.json"));
    }

    #[test]
    fn test_to_definition() {
        assert_eq!(to_definition("node"), "node.d.ts");
    }

    #[test]
    fn test_strip_definition() {
        assert_eq!(strip_definition("dep/main.d.ts"), "dep/main");
        assert_eq!(strip_definition("dep/main"), "dep/main");
    }

    #[test]
    fn test_join_location_local() {
        assert_eq!(
            join_location("/project/typings.json", "typings/main.d.ts"),
            "/project/typings/main.d.ts"
        );
        assert_eq!(
            join_location("/project/a/typings.json", "../b/typings.json"),
            "/project/b/typings.json"
        );
    }

    #[test]
    fn test_join_location_http() {
        assert_eq!(
            join_location("http://example.com/typings.json", "index.d.ts"),
            "http://example.com/index.d.ts"
        );
        assert_eq!(
            join_location("http://example.com/a/typings.json", "../index.d.ts"),
            "http://example.com/index.d.ts"
        );
    }

    #[test]
    fn test_join_location_absolute_child() {
        assert_eq!(
            join_location("/project/typings.json", "/other/file.d.ts"),
            "/other/file.d.ts"
        );
        assert_eq!(
            join_location("/project/typings.json", "https://example.com/x.d.ts"),
            "https://example.com/x.d.ts"
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Utf8Path::new("/a/./b/../c/file.d.ts")),
            Utf8Path::new("/a/c/file.d.ts")
        );
        assert_eq!(normalize(Utf8Path::new("a/../../b")), Utf8Path::new("../b"));
    }

    #[test]
    fn test_location_dir() {
        assert_eq!(location_dir("/a/b/typings.json"), "/a/b");
        assert_eq!(
            location_dir("http://example.com/a/typings.json"),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_relative_path_local() {
        assert_eq!(relative_path("/project/dep", "/project/dep/path.d.ts"), "path.d.ts");
        assert_eq!(
            relative_path("/project/dep", "/project/other/path.d.ts"),
            "../other/path.d.ts"
        );
    }

    #[test]
    fn test_relative_path_http() {
        assert_eq!(
            relative_path("http://example.com/t", "http://example.com/t/index.d.ts"),
            "index.d.ts"
        );
    }
}
