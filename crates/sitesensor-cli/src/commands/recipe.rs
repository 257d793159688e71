use std::path::PathBuf;

use anyhow::Result;
use sitesensor_config::Config;
use sitesensor_core::apply::{device_slot_count, plan};
use sitesensor_core::recipe::DIAGNOSTIC_BANNER;
use sitesensor_core::{ConfigSnapshot, DecodedRecipe, PanelSession, RecipeCodec, capture};
use sitesensor_storage::Storage;
use time::OffsetDateTime;

use super::{maybe_reload, read_input, require_device};
use crate::cli::RecipeCommands;

pub async fn handle(cmd: RecipeCommands, storage: &Storage, config: &Config) -> Result<()> {
    match cmd {
        RecipeCommands::Export {
            device,
            name,
            author,
            description,
            output,
        } => export(storage, config, device, name, author, description, output).await,
        RecipeCommands::Import {
            device,
            input,
            dry_run,
            reload,
            no_reload,
        } => {
            let text = read_input(input)?;
            if dry_run {
                preview_import(storage, config, device, &text).await
            } else {
                import(storage, config, device, &text, reload, no_reload).await
            }
        }
        RecipeCommands::Inspect { input, format } => inspect(&read_input(input)?, &format),
    }
}

async fn export(
    storage: &Storage,
    config: &Config,
    device: u32,
    name: Option<String>,
    author: Option<String>,
    description: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let info = require_device(storage, device).await?;
    let mut snapshot = capture(storage, device).await?;

    if let Some(name) = name {
        snapshot.name = name;
    } else if snapshot.name.trim().is_empty() {
        snapshot.name = info.name;
    }
    snapshot.author = author.unwrap_or_else(|| config.author.clone());
    snapshot.description = description;

    let text = RecipeCodec::new().export(&snapshot);
    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", text))?;
            println!("✓ Wrote recipe to {}", path.display());
        }
        None => println!("{}", text),
    }

    if text.starts_with(DIAGNOSTIC_BANNER) {
        anyhow::bail!("Recipe export failed; the block above is a diagnostic, not a recipe");
    }
    Ok(())
}

fn decode(text: &str) -> Result<DecodedRecipe> {
    let decoded = RecipeCodec::new().decode(text)?;
    for warning in &decoded.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(decoded)
}

async fn preview_import(storage: &Storage, config: &Config, device: u32, text: &str) -> Result<()> {
    require_device(storage, device).await?;
    let decoded = decode(text)?;
    let old_slot_count = device_slot_count(storage, device).await?;
    let plan = plan(
        &decoded.snapshot,
        old_slot_count,
        config.apply.options(),
        OffsetDateTime::now_utc(),
    );

    println!(
        "Recipe \"{}\" by {} would be applied to device {}",
        decoded.snapshot.name, decoded.snapshot.author, device
    );
    println!(
        "  Slots: {} -> {} (sweeping {})",
        plan.old_slot_count,
        plan.new_slot_count,
        plan.slots.len()
    );
    for write in &plan.writes {
        if write.is_clear() {
            println!("  - {}", write.name);
        } else {
            println!("  + {} = {}", write.name, write.value);
        }
    }
    println!("\nDry run: nothing was written.");
    Ok(())
}

async fn import(
    storage: &Storage,
    config: &Config,
    device: u32,
    text: &str,
    reload: bool,
    no_reload: bool,
) -> Result<()> {
    require_device(storage, device).await?;
    let decoded = decode(text)?;

    let mut session = PanelSession::open(storage, device).await?;
    let report = session
        .apply_recipe(&decoded.snapshot, config.apply.options())
        .await?;

    println!(
        "✓ Applied \"{}\" to device {}: {} written, {} cleared, {} slots swept",
        decoded.snapshot.name,
        device,
        report.fields_written,
        report.fields_cleared,
        report.slots_swept
    );
    for (name, error) in &report.failed_writes {
        eprintln!("  ✗ {}: {}", name, error);
    }

    let needs_reload = session.needs_reload();
    session.close();
    if needs_reload {
        maybe_reload(storage, config, reload, no_reload).await?;
    }

    if !report.failed_writes.is_empty() {
        anyhow::bail!("{} fields could not be written", report.failed_writes.len());
    }
    Ok(())
}

fn inspect(text: &str, format: &str) -> Result<()> {
    let decoded = decode(text)?;
    let snapshot = &decoded.snapshot;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    print_snapshot(snapshot);
    Ok(())
}

fn print_snapshot(snapshot: &ConfigSnapshot) {
    println!("Recipe: {}", snapshot.name);
    println!("  Author: {}", snapshot.author);
    println!("  Version: {}", snapshot.version);
    println!("  Codec: {}", snapshot.source_version);
    if !snapshot.description.is_empty() {
        println!("  Description: {}", snapshot.description);
    }

    println!("\nSettings ({}):", snapshot.settings.len());
    for (field, value) in snapshot.settings.iter() {
        println!("  {:<16} {}", field.name(), value);
    }

    println!("\nExpressions ({}):", snapshot.expressions.len());
    for entry in &snapshot.expressions {
        println!("  {:>2}. {}", entry.index, entry.expr);
        if let Some(description) = &entry.description {
            println!("      desc:  {}", description);
        }
        if let Some(child_type) = &entry.child_type {
            println!("      child: {}", child_type);
        }
    }
}
