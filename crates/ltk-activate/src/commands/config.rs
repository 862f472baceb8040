use crate::errors::CliError;
use crate::helper::LocalHelper;
use crate::utils::config::{self, AppConfig};
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use ltk_activation::{BrowseOutcome, Orchestrator};
use ltk_mod_core::{detect_game_dir, is_game_dir};
use miette::Result;

/// Print a config path entry with status indicator
fn print_path_config(name: &str, path: Option<&Utf8Path>, validator: impl Fn(&Utf8Path) -> bool) {
    match path {
        Some(p) => {
            let status = if validator(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config(cfg: &AppConfig, orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let saved_game_path = orchestrator.helper().diagnostics().saved_game_path;

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);
    print_path_config("game_path", saved_game_path.as_deref(), is_game_dir);
    print_path_config("mod_tools_path", cfg.mod_tools_path.as_deref(), |p| p.is_file());
    print_path_config("data_dir", Some(cfg.resolved_data_dir().as_path()), |p| p.is_dir());
    println!(
        "  {} {}",
        "skin_repository_url:".bright_white(),
        cfg.skin_repository()
    );
    match &cfg.helper_refresh_url {
        Some(url) => println!("  {} {}", "helper_refresh_url:".bright_white(), url),
        None => println!(
            "  {} {}",
            "helper_refresh_url:".bright_white(),
            "(not set)".bright_yellow()
        ),
    }
    println!(
        "  {} {}",
        "activation.batch_size:".bright_white(),
        cfg.activation.effective_batch_size()
    );
    println!(
        "  {} {}",
        "activation.verify_cached_paths:".bright_white(),
        cfg.activation.verify_cached_paths
    );
    println!();
    Ok(())
}

fn print_saved(path: &Utf8Path) {
    println!("{}", "✓ Game path set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );
}

pub async fn set_game_path(orchestrator: &Orchestrator<LocalHelper>, path: String) -> Result<()> {
    let path = Utf8PathBuf::from(path.trim().trim_matches('"'));
    // Accept the executable itself as well as its folder.
    let dir = if path.is_file() {
        path.parent().map(Utf8Path::to_path_buf).unwrap_or(path)
    } else {
        path
    };

    orchestrator
        .set_game_path(&dir)
        .await
        .map_err(|e| CliError::invalid_game_path(e.to_string()))?;
    print_saved(&dir);
    Ok(())
}

pub async fn clear_game_path(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    if !orchestrator.clear_game_path().await {
        return Err(CliError::invalid_game_path("the saved game path could not be removed").into());
    }
    println!(
        "{}",
        "✓ Game path cleared, auto-detection will be used".bright_green().bold()
    );
    Ok(())
}

pub async fn detect_game_path(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    println!(
        "{}",
        "Searching for League of Legends installation...".bright_cyan()
    );
    println!();

    let detected = tokio::task::spawn_blocking(detect_game_dir)
        .await
        .ok()
        .flatten()
        .ok_or(CliError::GameNotFound)?;

    println!("{}", "✓ Found League of Legends!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        detected.game_dir.as_str().bright_green()
    );
    println!("  {} {}", "Source:".bright_white().bold(), detected.source);
    println!();

    orchestrator
        .set_game_path(&detected.game_dir)
        .await
        .map_err(|e| CliError::invalid_game_path(e.to_string()))?;
    println!(
        "{}",
        "✓ Configuration updated successfully!".bright_green().bold()
    );
    Ok(())
}

pub async fn browse_game_path(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    match orchestrator.browse_game_path().await {
        BrowseOutcome::Selected(dir) => {
            orchestrator
                .set_game_path(&dir)
                .await
                .map_err(|e| CliError::invalid_game_path(e.to_string()))?;
            print_saved(&dir);
            Ok(())
        }
        BrowseOutcome::Cancelled => {
            println!("{}", "Cancelled, nothing changed".bright_yellow());
            Ok(())
        }
        BrowseOutcome::Invalid(message) => Err(CliError::invalid_game_path(message).into()),
    }
}
