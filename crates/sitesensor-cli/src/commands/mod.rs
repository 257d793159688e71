pub mod child_types;
pub mod device;
pub mod field;
pub mod recipe;
pub mod state;
pub mod status;

use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::Result;
use sitesensor_config::{Config, ReloadPolicy};
use sitesensor_core::{DeviceInfo, request_reload};
use sitesensor_storage::Storage;

/// Look up a device, failing with a readable message when it is unknown
pub async fn require_device(storage: &Storage, id: u32) -> Result<DeviceInfo> {
    storage
        .get_device(id)
        .await
        .map_err(|_| anyhow::anyhow!("No device {} (add it with `sitesensor device add`)", id))
}

/// Read a file, or all of stdin when no path is given
pub fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Resolve the reload decision from flags and config, then reload if wanted
pub async fn maybe_reload(
    storage: &Storage,
    config: &Config,
    force: bool,
    skip: bool,
) -> Result<()> {
    let policy = if force {
        ReloadPolicy::Always
    } else if skip {
        ReloadPolicy::Never
    } else {
        config.apply.reload
    };

    let reload = match policy {
        ReloadPolicy::Always => true,
        ReloadPolicy::Never => false,
        ReloadPolicy::Prompt => confirm("Reload the host now so the changes take effect?")?,
    };

    if reload {
        println!("Reloading host...");
        request_reload(storage, config.readiness.policy()).await?;
        println!("✓ Host reloaded");
    } else {
        println!("Changes take effect after the next host reload.");
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
