use crate::errors::CliError;
use crate::helper::cache::format_size;
use crate::helper::LocalHelper;
use crate::println_pad;
use colored::Colorize;
use ltk_activation::Orchestrator;
use miette::Result;

/// Stop the overlay, then delete every downloaded and imported mod.
pub async fn clear_cache(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    if orchestrator.check_overlay_status().await {
        println!("{}", "Stopping the running overlay first...".bright_cyan());
        let response = orchestrator.stop().await;
        if !response.success {
            return Err(CliError::StopFailed {
                message: response.error.unwrap_or(response.message),
            }
            .into());
        }
    }

    let failures = orchestrator.helper().clear_caches();
    orchestrator.invalidate_cache();

    if failures > 0 {
        return Err(CliError::CacheClearFailed { failures }.into());
    }
    println!("{}", "✓ Mod cache cleared".bright_green().bold());
    println!(
        "  {} {}",
        "Data:".bright_white().bold(),
        orchestrator.helper().layout().root()
    );
    Ok(())
}

pub fn cache_info(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    let info = orchestrator.helper().cache_info();

    println!();
    println!("  {} {}", "data_dir:".bright_white(), info.root);
    println!(
        "  {} {} in {} entries",
        "total:".bright_white(),
        format_size(info.total_size).bright_green(),
        info.entries.len()
    );
    println!();
    for entry in &info.entries {
        println_pad!(
            "{} {} {}",
            format!("[{}]", entry.area).dimmed(),
            entry.name,
            format_size(entry.size).bright_cyan()
        );
    }
    if !info.entries.is_empty() {
        println!();
    }
    Ok(())
}

pub fn remove_cached(orchestrator: &Orchestrator<LocalHelper>, name: &str) -> Result<()> {
    let removed = orchestrator.helper().remove_cached(name);
    orchestrator.invalidate_cache();

    if removed == 0 {
        println!("{}", format!("Nothing cached for {name}").bright_yellow());
    } else {
        println!(
            "{}",
            format!("✓ Removed {removed} cached folder(s) for {name}")
                .bright_green()
                .bold()
        );
    }
    Ok(())
}
