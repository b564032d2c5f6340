//! Command handlers and shared command context.

pub mod bundle;
pub mod install;

use std::sync::Arc;

use camino::Utf8PathBuf;
use tydi_core::error::{TydiError, TydiResult};
use tydi_fetch::{FetchConfig, Fetcher};

/// State shared by every command
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub fetcher: Arc<Fetcher>,
}

impl CommandContext {
    pub fn new(proxy: Option<String>, cache_dir: Option<Utf8PathBuf>) -> TydiResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| TydiError::io("Failed to determine working directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| TydiError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Working directory {} is not UTF-8", path.display()),
        })?;

        let cache_dir = match cache_dir {
            Some(dir) => Some(dir),
            None => default_cache_dir(),
        };

        let fetcher = Arc::new(Fetcher::new(FetchConfig {
            proxy,
            cache_dir,
            timeout: None,
        })?);

        Ok(Self { cwd, fetcher })
    }
}

/// `~/.tydi/cache`, when a home directory can be determined
fn default_cache_dir() -> Option<Utf8PathBuf> {
    let home = dirs::home_dir()?;
    let home = Utf8PathBuf::from_path_buf(home).ok()?;
    Some(home.join(".tydi").join("cache"))
}
