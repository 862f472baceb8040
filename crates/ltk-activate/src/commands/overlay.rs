use crate::errors::CliError;
use crate::helper::LocalHelper;
use colored::Colorize;
use ltk_activation::Orchestrator;
use miette::Result;

pub async fn stop_overlay(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    let response = orchestrator.stop().await;
    if !response.success {
        return Err(CliError::StopFailed {
            message: response.error.unwrap_or(response.message),
        }
        .into());
    }

    println!("{}", format!("✓ {}", response.message).bright_green().bold());
    Ok(())
}

fn print_check(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".bright_green()
    } else {
        "✗".bright_red()
    };
    println!("  {} {} {}", format!("{}:", name).bright_white(), detail, status);
}

pub async fn overlay_status(orchestrator: &Orchestrator<LocalHelper>) -> Result<()> {
    let running = orchestrator.check_overlay_status().await;
    let diagnostics = orchestrator.helper().diagnostics();

    println!();
    if running {
        println!("  {} {}", "overlay:".bright_white(), "running".bright_green().bold());
    } else {
        println!("  {} {}", "overlay:".bright_white(), "stopped".bright_yellow());
    }

    print_check(
        "mod_tools",
        diagnostics.mod_tools_found,
        diagnostics.mod_tools.as_str(),
    );
    print_check(
        "injector",
        diagnostics.injector_found,
        if diagnostics.injector_found { "present" } else { "missing" },
    );
    match &diagnostics.saved_game_path {
        Some(path) => print_check("game_path", true, path.as_str()),
        None => println!(
            "  {} {}",
            "game_path:".bright_white(),
            "(auto-detect)".bright_yellow()
        ),
    }
    println!("  {} {}", "data_dir:".bright_white(), diagnostics.data_dir);
    println!(
        "  {} {}",
        "installed_mods:".bright_white(),
        diagnostics.installed_mods
    );
    if let Some(status) = diagnostics.overlay_status {
        println!("  {} {}", "status_file:".bright_white(), status.as_str().dimmed());
    }
    println!();

    Ok(())
}
