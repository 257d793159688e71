use std::time::Duration;

use anyhow::Result;
use sitesensor_core::StatusIndicators;
use sitesensor_core::status::{REFRESH_INTERVAL_MS, read_status};
use sitesensor_storage::Storage;

use super::require_device;

pub async fn handle(storage: &Storage, device: u32, watch: bool, format: &str) -> Result<()> {
    let info = require_device(storage, device).await?;
    let mut last = read_status(storage, device).await?;
    print_status(&info.name, &last, format)?;

    if !watch {
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(REFRESH_INTERVAL_MS));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = read_status(storage, device).await?;
                if current != last {
                    print_status(&info.name, &current, format)?;
                    last = current;
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn print_status(name: &str, status: &StatusIndicators, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string(status)?);
        return Ok(());
    }

    if status.hidden {
        println!("{}: {}", name, status.message);
        return Ok(());
    }

    let lamp = |on: bool| if on { "●" } else { "○" };
    println!(
        "{}  failed {}  armed {}  tripped {}  {}",
        name,
        lamp(status.failed),
        lamp(status.armed),
        lamp(status.tripped),
        status.message
    );
    if let Some(log) = &status.log {
        for line in log {
            println!("    {}", line);
        }
    }
    Ok(())
}
