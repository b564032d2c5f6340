//! Short-form dependency strings.
//!
//! A dependency value in a native manifest (or on the command line) is a
//! compact string such as `npm:lodash`, `bower:angular`,
//! `github:owner/repo#tag`, `file:../local/typings.json` or a bare URL.
//! Parsing produces a tagged descriptor the resolver dispatches on.

use crate::utils::location;

/// Branch used when a `github:` short form omits the ref.
const GITHUB_DEFAULT_REF: &str = "master";

/// A parsed dependency descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// Resolved against `node_modules` directories
    Npm { name: String },
    /// Resolved against the bower components directory
    Bower { name: String },
    /// Resolved to a raw-content URL on GitHub
    Github {
        owner: String,
        repo: String,
        git_ref: Option<String>,
    },
    /// A local filesystem path
    File { path: String },
    /// An absolute HTTP(S) URL
    Http { url: String },
}

impl DependencySource {
    /// Parse a short-form dependency string.
    ///
    /// Unrecognized schemes fall through to a bare filesystem path, so
    /// parsing never fails.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix("npm:") {
            return Self::Npm {
                name: name.to_string(),
            };
        }
        if let Some(name) = raw.strip_prefix("bower:") {
            return Self::Bower {
                name: name.to_string(),
            };
        }
        if let Some(slug) = raw.strip_prefix("github:") {
            if let Some(source) = Self::parse_github(slug) {
                return source;
            }
        }
        if let Some(path) = raw.strip_prefix("file:") {
            return Self::File {
                path: path.to_string(),
            };
        }
        if location::is_http(raw) {
            return Self::Http {
                url: raw.to_string(),
            };
        }
        Self::File {
            path: raw.to_string(),
        }
    }

    fn parse_github(slug: &str) -> Option<Self> {
        let (slug, git_ref) = match slug.split_once('#') {
            Some((slug, git_ref)) => (slug, Some(git_ref.to_string())),
            None => (slug, None),
        };
        let (owner, repo) = slug.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::Github {
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref,
        })
    }

    /// The location this descriptor resolves to.
    ///
    /// Registry-style sources (`github:`) collapse to an HTTP location of
    /// the manifest at the repository root.
    pub fn location(&self) -> String {
        match self {
            Self::Npm { name } | Self::Bower { name } => name.clone(),
            Self::Github {
                owner,
                repo,
                git_ref,
            } => {
                let git_ref = git_ref.as_deref().unwrap_or(GITHUB_DEFAULT_REF);
                format!("https://raw.githubusercontent.com/{owner}/{repo}/{git_ref}/typings.json")
            },
            Self::File { path } => path.clone(),
            Self::Http { url } => url.clone(),
        }
    }
}
