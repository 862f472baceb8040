use camino::{Utf8Path, Utf8PathBuf};
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::ActivateArgs;
use helper::LocalHelper;
use ltk_activation::Orchestrator;
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utils::config;

mod commands;
mod errors;
mod helper;
mod utils;

const LOG_PREFIX: &str = "ltk-activate";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Use this config.toml instead of the one next to the executable
    #[arg(long = "config", global = true)]
    config_file: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the selected skins and start the overlay
    Activate {
        /// Skin to activate: CHAMPION_ID:SKIN_ID[:chroma=ID|:form=ID]
        #[arg(short, long = "skin")]
        skins: Vec<String>,

        /// Custom mod to activate: ID=PATH
        #[arg(short, long = "custom")]
        customs: Vec<String>,

        /// JSON file with a list of selection items
        #[arg(long)]
        selection: Option<PathBuf>,

        /// Keep running until Ctrl+C, then stop the overlay
        #[arg(short, long)]
        wait: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stop the running overlay
    Stop,
    /// Show overlay and environment status
    Status,
    /// Inspect or change the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage downloaded and imported mods
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the game folder manually
    SetGamePath {
        /// The Game folder or the path to 'League of Legends.exe'
        path: String,
    },
    /// Forget the manually set game folder
    ClearGamePath,
    /// Auto-detect the game folder and save it
    Detect,
    /// Enter the path to 'League of Legends.exe' interactively
    Browse,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List downloaded and imported mods with their size
    Info,
    /// Delete one downloaded or imported mod
    Remove {
        /// Cache folder name (e.g. 103_103085) or custom mod id
        name: String,
    },
    /// Delete every downloaded and imported mod
    Clear,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging(log_dir: &Utf8Path) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "ltk_activate=info,ltk_activation=info,ltk_mod_core=info".into()
    });

    // stdout is reserved for command output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = match std::fs::create_dir_all(log_dir) {
        Ok(()) => rolling::RollingFileAppender::builder()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(LOG_PREFIX)
            .filename_suffix("log")
            .build(log_dir)
            .map_err(|e| eprintln!("Failed to create log file appender: {}", e))
            .ok(),
        Err(e) => {
            eprintln!("Failed to create log directory {}: {}", log_dir, e);
            None
        }
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);
    match file {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            registry.with(layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Delete log files older than `max_age_days` from the log directory.
fn cleanup_old_logs(log_dir: &Utf8Path, max_age_days: u64) {
    let max_age = std::time::Duration::from_secs(max_age_days * 24 * 60 * 60);
    let prefix = format!("{LOG_PREFIX}.");

    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // Only dated log files, e.g. "ltk-activate.2026-02-17.log"
        if !file_name.starts_with(&prefix) || !file_name.ends_with(".log") {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| std::time::SystemTime::now().duration_since(modified).ok());

        if age.is_some_and(|age| age > max_age) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
            } else {
                tracing::debug!("Deleted old log file: {}", path.display());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    let cfg = match &args.config_file {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    let log_dir = cfg.log_dir();
    let _log_guard = init_logging(&log_dir);
    cleanup_old_logs(&log_dir, 7);
    tracing::debug!("Log directory: {}", log_dir);

    let helper = Arc::new(LocalHelper::from_config(&cfg));
    let orchestrator = Orchestrator::with_config(helper, cfg.activation.clone());

    match args.command {
        Commands::Activate {
            skins,
            customs,
            selection,
            wait,
            json,
        } => {
            commands::activate(
                &orchestrator,
                ActivateArgs {
                    skins,
                    customs,
                    selection,
                    wait,
                    json,
                },
            )
            .await
        }
        Commands::Stop => commands::stop_overlay(&orchestrator).await,
        Commands::Status => commands::overlay_status(&orchestrator).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::show_config(&cfg, &orchestrator),
            ConfigCommands::SetGamePath { path } => {
                commands::set_game_path(&orchestrator, path).await
            }
            ConfigCommands::ClearGamePath => commands::clear_game_path(&orchestrator).await,
            ConfigCommands::Detect => commands::detect_game_path(&orchestrator).await,
            ConfigCommands::Browse => commands::browse_game_path(&orchestrator).await,
        },
        Commands::Cache { command } => match command {
            CacheCommands::Info => commands::cache_info(&orchestrator),
            CacheCommands::Remove { name } => commands::remove_cached(&orchestrator, &name),
            CacheCommands::Clear => commands::clear_cache(&orchestrator).await,
        },
    }
}
