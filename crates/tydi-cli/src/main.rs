//! # tydi-cli
//!
//! Command-line surface for the tydi typings manager. Parses arguments,
//! sets up logging, and dispatches to the command handlers; all real
//! work happens in the library crates.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tydi_core::error::TydiResult;

mod commands;
mod writer;

use commands::CommandContext;

/// Manage and compile external type-declaration dependencies
#[derive(Parser)]
#[command(name = "tydi", version, about = "Typings dependency manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Proxy URL for HTTP requests
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Directory for the HTTP content cache
    #[arg(long, global = true)]
    pub cache_dir: Option<Utf8PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve all dependencies and write compiled typings
    Install {
        /// Include devDependencies of the root
        #[arg(long)]
        dev: bool,
        /// Include ambientDependencies of the root
        #[arg(long)]
        ambient: bool,
        /// Output directory for installed typings
        #[arg(long, default_value = "typings")]
        out: Utf8PathBuf,
    },
    /// Compile the whole project into one declaration pair
    Bundle {
        /// Root namespace for emitted modules (defaults to the manifest name)
        #[arg(long)]
        name: Option<String>,
        /// Write the main artifact here; the browser variant lands beside it
        #[arg(long)]
        out: Option<Utf8PathBuf>,
        #[arg(long)]
        dev: bool,
        #[arg(long)]
        ambient: bool,
        /// Prefix blocks with provenance comments
        #[arg(long)]
        meta: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        if let Some(suggestion) = e.suggestion() {
            eprintln!("help: {suggestion}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> TydiResult<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        tydi_core::TydiError::io("Failed to create async runtime".to_string(), e)
    })?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.proxy, cli.cache_dir)?;

        match cli.command {
            Commands::Install { dev, ambient, out } => {
                commands::install::execute(dev, ambient, &out, &ctx).await
            },
            Commands::Bundle {
                name,
                out,
                dev,
                ambient,
                meta,
            } => commands::bundle::execute(name, out, dev, ambient, meta, &ctx).await,
        }
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tydi={level},tydi_resolver={level},tydi_compiler={level},tydi_fetch={level}"
        ))
        .with_target(false)
        .init();
}
