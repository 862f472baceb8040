use crate::errors::CliError;
use crate::helper::LocalHelper;
use crate::println_pad;
use camino::Utf8PathBuf;
use colored::Colorize;
use ltk_activation::{
    ActivationProgress, ActivationRequest, ActivationResponse, ActivationStage, CustomModChoice,
    Orchestrator, SelectionItem, SkinChoice,
};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

pub struct ActivateArgs {
    pub skins: Vec<String>,
    pub customs: Vec<String>,
    pub selection: Option<PathBuf>,
    pub wait: bool,
    pub json: bool,
}

/// Parse `CHAMPION:SKIN`, `CHAMPION:SKIN:chroma=ID` or `CHAMPION:SKIN:form=ID`.
pub fn parse_skin_spec(spec: &str) -> Result<SkinChoice, CliError> {
    let invalid = || CliError::invalid_skin_spec(spec);
    let mut parts = spec.split(':');

    let champion_id: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(invalid)?;
    let skin_id: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(invalid)?;

    let skin = SkinChoice::new(
        champion_id,
        format!("Champion {champion_id}"),
        skin_id,
        format!("Skin {skin_id}"),
    );

    let skin = match parts.next() {
        None => skin,
        Some(variant) => {
            let (kind, id) = variant.split_once('=').ok_or_else(invalid)?;
            let id: u32 = id.trim().parse().map_err(|_| invalid())?;
            match kind.trim() {
                "chroma" => skin.with_chroma(id, Some(format!("Chroma {id}")), None),
                "form" => skin.with_form(id, Some(format!("Form {id}"))),
                _ => return Err(invalid()),
            }
        }
    };

    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(skin)
}

/// Parse `ID=PATH`. The display name is the file name without extension.
pub fn parse_custom_spec(spec: &str) -> Result<CustomModChoice, CliError> {
    let (id, path) = spec
        .split_once('=')
        .filter(|(id, path)| !id.trim().is_empty() && !path.trim().is_empty())
        .ok_or_else(|| CliError::invalid_custom_spec(spec))?;

    let path = Utf8PathBuf::from(path.trim());
    let display_name = path
        .file_name()
        .map(|name| name.split('.').next().unwrap_or(name).to_string())
        .unwrap_or_else(|| id.trim().to_string());

    Ok(CustomModChoice::new(id.trim(), display_name, path))
}

fn read_selection_file(path: &PathBuf) -> Result<Vec<SelectionItem>, CliError> {
    let content = fs::read_to_string(path).map_err(|e| CliError::selection_file(path.clone(), e))?;
    serde_json::from_str(&content).map_err(|e| CliError::selection_file(path.clone(), e))
}

pub fn build_request(args: &ActivateArgs) -> Result<ActivationRequest, CliError> {
    let mut items = match &args.selection {
        Some(path) => read_selection_file(path)?,
        None => Vec::new(),
    };

    for spec in &args.skins {
        items.push(SelectionItem::Skin(parse_skin_spec(spec)?));
    }
    for spec in &args.customs {
        items.push(SelectionItem::Custom(parse_custom_spec(spec)?));
    }

    Ok(ActivationRequest::from_items(items))
}

fn print_progress(progress: &ActivationProgress) {
    let stage = format!("[{:?}]", progress.stage).to_lowercase();
    let stage = match progress.stage {
        ActivationStage::Complete => stage.bright_green().bold(),
        ActivationStage::Error => stage.bright_red().bold(),
        ActivationStage::Downloading => stage.bright_blue(),
        _ => stage.bright_cyan(),
    };
    let counter = format!("({}/{})", progress.current, progress.total).dimmed();
    eprintln!("  {} {} {}", stage, progress.message, counter);
}

pub async fn activate(orchestrator: &Orchestrator<LocalHelper>, args: ActivateArgs) -> Result<()> {
    let request = build_request(&args)?;

    if !args.json {
        println!(
            "{}",
            format!("Activating {} item(s)...", request.len()).bright_cyan()
        );
    }

    let result = if args.json {
        orchestrator.activate(&request, |_| {}).await
    } else {
        orchestrator.activate(&request, print_progress).await
    };

    if args.json {
        let response = ActivationResponse::from(result.clone());
        println!("{}", serde_json::to_string_pretty(&response).into_diagnostic()?);
    }

    let summary = result.map_err(CliError::from)?;

    if !args.json {
        println!();
        println!("{}", format!("✓ {}", summary.message).bright_green().bold());
        if !summary.skipped.is_empty() {
            println_pad!("{}", "Skipped (download failed):".bright_yellow());
            for name in &summary.skipped {
                println_pad!("  {} {}", "•".bright_yellow(), name);
            }
        }
    }

    if args.wait {
        println!();
        println!("{}", "Overlay running. Press Ctrl+C to stop it.".bright_white());
        tokio::signal::ctrl_c().await.into_diagnostic()?;

        let response = orchestrator.stop().await;
        if !response.success {
            return Err(CliError::StopFailed {
                message: response.error.unwrap_or(response.message),
            }
            .into());
        }
        println!("{}", "✓ Overlay stopped".bright_green().bold());
    }

    Ok(())
}
