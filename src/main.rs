use crate::utils::{
    fs::get_cwd,
    logger::{LogLevel, Logger},
    signature::get_signature,
    version::get_version,
};
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod addon;
mod builder;
mod types;
mod utils;

#[derive(Parser)]
#[command(name = "kodipack")]
#[command(author = "Kodipack Contributors")]
#[command(about = "Install local Kodi addons and package them for a repository")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Symlink an addon directory into the Kodi addons directory
    Install {
        /// Addon directory containing addon.xml (defaults to the current directory)
        #[arg(short, long)]
        source: Option<PathBuf>,
        /// Kodi addons directory (overrides KODIPACK_ADDONS_DIR, kodipack.toml and KODI_HOME)
        #[arg(long)]
        addons_dir: Option<PathBuf>,
    },

    /// Remove the symlink created by `install`
    Uninstall {
        /// Addon directory containing addon.xml (defaults to the current directory)
        #[arg(short, long)]
        source: Option<PathBuf>,
        /// Kodi addons directory
        #[arg(long)]
        addons_dir: Option<PathBuf>,
    },

    /// Package addons into zips and write addons.xml + addons.xml.md5
    Package {
        /// Addon directories. Leave empty to package the current directory.
        sources: Vec<PathBuf>,
        /// Output directory (defaults to [package].output or ./dist)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        /// Keep the staging copy next to the archives
        keep_staging: bool,
    },

    /// Show the id and version declared in addon.xml
    Info {
        /// Addon directory containing addon.xml (defaults to the current directory)
        #[arg(short, long)]
        source: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        /// Print the descriptor as JSON
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let version = get_version();
    let signature = get_signature(&version);

    let version_static: &'static str = Box::leak(format!("v{}", version).into_boxed_str());
    let signature_static: &'static str = Box::leak(signature.into_boxed_str());

    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", signature_static);
        return;
    }

    let mut cmd = Cli::command();
    cmd = cmd.version(version_static).before_help(signature_static);

    let matches = cmd.get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    if let Err(e) = run(cli).await {
        Logger::new().log_message(LogLevel::Error, &e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let cwd = get_cwd()?;

    match cli.command {
        Commands::Install { source, addons_dir } => {
            blocking(move || {
                addon::install::install(&cwd, source.as_deref(), addons_dir.as_deref())
            })
            .await
        }

        Commands::Uninstall { source, addons_dir } => {
            blocking(move || {
                addon::install::uninstall(&cwd, source.as_deref(), addons_dir.as_deref())
            })
            .await
        }

        Commands::Package {
            sources,
            out,
            keep_staging,
        } => {
            blocking(move || {
                builder::package::package_all(&sources, out.as_deref(), &cwd, keep_staging)
            })
            .await
        }

        Commands::Info { source, json } => {
            let dir = source.map(|s| cwd.join(s)).unwrap_or_else(|| cwd.clone());
            print_info(&dir, json)
        }
    }
}

async fn blocking<F>(task: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), String> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| format!("Join error: {}", e))?
}

fn print_info(dir: &Path, json: bool) -> Result<(), String> {
    let source = addon::descriptor::read_descriptor(dir)?;
    if json {
        let out = serde_json::to_string_pretty(&source.descriptor)
            .map_err(|e| format!("Failed to serialize descriptor: {}", e))?;
        println!("{}", out);
    } else {
        addon::summary::print_descriptor(&source);
    }
    Ok(())
}
